//! Version token resolution against a remote ref table.
//!
//! Strategies run in a fixed order and the first hit wins, which encodes
//! the tie-break rules: a commit prefix beats any ref whose name happens to
//! be valid hex, an exact tag beats an exact branch, and both beat semver
//! range matches (so a branch literally named `1.1` shadows `~1.1`).

use semver::{Version, VersionReq};

use crate::refs::RefMap;

/// Outcome of resolving a version token against a ref table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to a concrete commit; `ref_name` is absent when the commit
    /// is not known to belong to any listed ref.
    Pinned {
        sha: String,
        ref_name: Option<String>,
    },
    /// Resolve the remote HEAD's symbolic target lazily.
    DefaultBranch,
    /// A plausible commit prefix that no listed ref SHA matches; the caller
    /// must settle it against the live repository (`git rev-list`) and fall
    /// back to [`resolve_named`] when the repository does not know it.
    CommitCandidate(String),
    NotFound,
}

/// A commit SHA for prefix purposes: 5–40 hex characters.
pub fn is_commit_sha(token: &str) -> bool {
    (5..=40).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve a user-supplied version token against the ref table.
pub fn resolve_version(token: &str, refs: &RefMap) -> Resolution {
    let token = token.trim();
    if token.is_empty() {
        return Resolution::DefaultBranch;
    }

    if is_commit_sha(token) {
        let wanted = token.to_ascii_lowercase();
        for (name, sha) in refs {
            if sha.starts_with(&wanted) {
                return Resolution::Pinned {
                    sha: sha.clone(),
                    ref_name: Some(name.clone()),
                };
            }
        }
        return Resolution::CommitCandidate(wanted);
    }

    resolve_named(token, refs)
}

/// The name-based strategies: full ref path, tag, branch, semver range
/// over tags then branches, and the `*` wildcard.
///
/// Also the continuation after a [`Resolution::CommitCandidate`] turns out
/// to be unknown to the live repository.
pub fn resolve_named(token: &str, refs: &RefMap) -> Resolution {
    let token = token.trim();

    if token.starts_with("refs/") {
        if let Some(sha) = refs.get(token) {
            return Resolution::Pinned {
                sha: sha.clone(),
                ref_name: Some(token.to_string()),
            };
        }
    }

    for candidate in [format!("refs/tags/{token}"), format!("refs/heads/{token}")] {
        if let Some(sha) = refs.get(&candidate) {
            return Resolution::Pinned {
                sha: sha.clone(),
                ref_name: Some(candidate),
            };
        }
    }

    if let Some(resolution) = resolve_semver(token, refs, "refs/tags/") {
        return resolution;
    }
    if let Some(resolution) = resolve_semver(token, refs, "refs/heads/") {
        return resolution;
    }

    if token == "*" {
        return Resolution::DefaultBranch;
    }

    Resolution::NotFound
}

fn resolve_semver(range: &str, refs: &RefMap, prefix: &str) -> Option<Resolution> {
    let req = VersionReq::parse(range.trim()).ok()?;
    let mut best: Option<(Version, String, String)> = None;
    for (name, sha) in refs {
        let Some(tail) = name.strip_prefix(prefix) else {
            continue;
        };
        let Some(version) = parse_loose_version(tail) else {
            continue;
        };
        if !req.matches(&version) {
            continue;
        }
        let better = match best.as_ref() {
            Some((current, _, _)) => version > *current,
            None => true,
        };
        if better {
            best = Some((version, name.clone(), sha.clone()));
        }
    }
    best.map(|(_, ref_name, sha)| Resolution::Pinned {
        sha,
        ref_name: Some(ref_name),
    })
}

/// Loose version parse over ref-name tails: tolerates a `v` prefix and
/// missing minor/patch components (`v1.1` → `1.1.0`).
fn parse_loose_version(input: &str) -> Option<Version> {
    let input = input.trim();
    let input = input
        .strip_prefix('v')
        .or_else(|| input.strip_prefix('V'))
        .unwrap_or(input);
    if let Ok(version) = Version::parse(input) {
        return Some(version);
    }

    let split_idx = input.find(['-', '+']).unwrap_or(input.len());
    let (core, rest) = input.split_at(split_idx);
    if core.is_empty() {
        return None;
    }
    let dots = core.bytes().filter(|byte| *byte == b'.').count();
    if dots >= 2 {
        return None;
    }
    let mut padded = core.to_string();
    for _ in dots..2 {
        padded.push_str(".0");
    }
    padded.push_str(rest);
    Version::parse(&padded).ok()
}
