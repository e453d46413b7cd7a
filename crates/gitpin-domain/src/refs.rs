//! Parsing of `git ls-remote` output.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Ref name → 40-hex commit SHA.
pub type RefMap = BTreeMap<String, String>;

fn ref_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9a-fA-F]+)\s+(refs/(?:tags|heads)/.*)$").expect("ref line regex")
    })
}

/// Parse `ls-remote --tags --heads` output into a ref table.
///
/// Only `refs/tags/*` and `refs/heads/*` lines are retained; banners,
/// capability advertisements, and merge-request refs are ignored. A peeled
/// entry (`refs/tags/T^{}`) overwrites the tag-object SHA for `T`, so
/// annotated tags resolve to the commit they point at.
pub fn parse_ref_lines(output: &str) -> RefMap {
    let mut refs = RefMap::new();
    for line in output.lines() {
        let Some(captures) = ref_line_re().captures(line.trim_end()) else {
            continue;
        };
        let sha = captures[1].to_ascii_lowercase();
        let name = captures[2].trim_end_matches("^{}").to_string();
        refs.insert(name, sha);
    }
    refs
}

/// Render a ref table back into `ls-remote` line format.
pub fn serialize_refs(refs: &RefMap) -> String {
    refs.iter()
        .map(|(name, sha)| format!("{sha}\t{name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Symbolic target of a remote `HEAD`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymrefHead {
    /// `refs/heads/...` when the server advertised a symref; absent on the
    /// plain `ls-remote <repo> HEAD` fallback.
    pub ref_name: Option<String>,
    pub sha: String,
}

/// Parse `ls-remote --symref <repo> HEAD` output, or the plain
/// `ls-remote <repo> HEAD` fallback shape used with older servers.
pub fn parse_symref_head(output: &str) -> Option<SymrefHead> {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty());
    let first = lines.next()?;

    if first.starts_with("ref:") {
        let ref_name = first.split_whitespace().nth(1)?.to_string();
        let sha = lines.next()?.split_whitespace().next()?.to_string();
        return Some(SymrefHead {
            ref_name: Some(ref_name),
            sha: sha.to_ascii_lowercase(),
        });
    }

    let sha = first.split_whitespace().next()?;
    if sha.is_empty() {
        return None;
    }
    Some(SymrefHead {
        ref_name: None,
        sha: sha.to_ascii_lowercase(),
    })
}
