//! Git specifier recognition.
//!
//! The grammar is an accumulation of package-ecosystem conventions:
//! scp-like SSH remotes, `user/repo` shorthands, hosted-provider aliases,
//! `git+` schemes, and plain URLs that merely look git-shaped. Rules are
//! checked in a fixed order; the scp-like rule runs before URL parsing so
//! `git+ssh://host:port/...` with a numeric port is not misread, and the
//! shorthand runs before URL parsing so `user/repo` never degrades to a
//! bare path.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::hosted::{explode_hosted_fragment, HostedProvider};

fn scp_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^git\+ssh://((?:[^@:/]+@)?([^@:/]+):([^/]*).*)$").expect("scp-like regex")
    })
}

fn shorthand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^:@%/\s.-][^:@%/\s]*/[^:@\s/%]+(?:#.*)?$").expect("shorthand regex")
    })
}

fn bare_scp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git@[^:@/\s]+[:/]\S+$").expect("bare scp regex"))
}

/// Parts of an scp-like `git+ssh://` specifier: the verbatim remote handed
/// to git and the hostname. `None` when the first path segment is numeric
/// (a port, so the specifier is a regular URL).
pub(crate) fn scp_like_parts(specifier: &str) -> Option<(String, String)> {
    let captures = scp_like_re().captures(specifier)?;
    let first_segment = captures.get(3).map_or("", |m| m.as_str());
    if !first_segment.is_empty() && first_segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((captures[1].to_string(), captures[2].to_string()))
}

pub(crate) fn is_shorthand(specifier: &str) -> bool {
    shorthand_re().is_match(specifier)
}

pub(crate) fn is_bare_scp(specifier: &str) -> bool {
    bare_scp_re().is_match(specifier)
}

/// Hosted alias prefix (`github:`, `gitlab:`, `bitbucket:`) with its tail.
pub(crate) fn hosted_alias_parts(specifier: &str) -> Option<(HostedProvider, &str)> {
    let (alias, tail) = specifier.split_once(':')?;
    let provider = HostedProvider::from_alias(alias)?;
    if tail.is_empty() {
        return None;
    }
    Some((provider, tail))
}

fn non_empty_segment_count(url: &Url) -> usize {
    url.path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).count())
        .unwrap_or(0)
}

/// Decide whether a free-form specifier designates a git-hosted package.
pub fn is_git_pattern(specifier: &str) -> bool {
    let specifier = specifier.trim();
    if specifier.is_empty() {
        return false;
    }

    if scp_like_parts(specifier).is_some() {
        return true;
    }
    if is_shorthand(specifier) {
        return true;
    }
    if is_bare_scp(specifier) {
        return true;
    }
    if let Some((_, tail)) = hosted_alias_parts(specifier) {
        if explode_hosted_fragment(tail).is_ok() {
            return true;
        }
    }

    let Ok(url) = Url::parse(specifier) else {
        return false;
    };
    let scheme = url.scheme();
    if scheme.starts_with("git+") || scheme == "git" || scheme == "ssh" {
        return true;
    }
    if matches!(scheme, "http" | "https") {
        if url.path().ends_with(".git") {
            return true;
        }
        if let Some(host) = url.host_str() {
            if HostedProvider::from_hostname(host).is_some() && non_empty_segment_count(&url) == 2 {
                return true;
            }
        }
    }
    false
}
