//! Hosted git providers and their shorthand fragments.
//!
//! A hosted fragment is the `user/repo[.git][#hash]` tail of a provider
//! alias such as `github:user/repo#v1.0.0`. The parsed record survives
//! normalization so later stages can derive HTTPS or SSH remotes for the
//! same repository.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Providers with well-known hostnames and alias schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostedProvider {
    GitHub,
    GitLab,
    Bitbucket,
}

impl HostedProvider {
    pub const ALL: [HostedProvider; 3] = [
        HostedProvider::GitHub,
        HostedProvider::GitLab,
        HostedProvider::Bitbucket,
    ];

    /// Resolve an alias scheme (`github:`, `gitlab:`, `bitbucket:`) without
    /// the trailing colon.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "github" => Some(Self::GitHub),
            "gitlab" => Some(Self::GitLab),
            "bitbucket" => Some(Self::Bitbucket),
            _ => None,
        }
    }

    /// Resolve a hostname to the provider that owns it.
    ///
    /// Each provider recognizes only its own hostnames; `bitbucket.com` is
    /// kept as a legacy alias of `bitbucket.org`.
    pub fn from_hostname(hostname: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.hostnames().contains(&hostname))
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
        }
    }

    pub fn default_hostname(self) -> &'static str {
        match self {
            Self::GitHub => "github.com",
            Self::GitLab => "gitlab.com",
            Self::Bitbucket => "bitbucket.org",
        }
    }

    pub fn hostnames(self) -> &'static [&'static str] {
        match self {
            Self::GitHub => &["github.com"],
            Self::GitLab => &["gitlab.com"],
            Self::Bitbucket => &["bitbucket.org", "bitbucket.com"],
        }
    }

    /// Canonical HTTPS remote for a fragment on this provider.
    pub fn https_repository(self, user: &str, repo: &str) -> String {
        format!("https://{}/{user}/{repo}.git", self.default_hostname())
    }

    /// SSH remote for the same fragment, used by the archive fast path.
    pub fn ssh_repository(self, user: &str, repo: &str) -> String {
        format!("ssh://git@{}/{user}/{repo}.git", self.default_hostname())
    }
}

/// Parsed `user/repo[.git][#hash]` fragment.
///
/// `repo` has a trailing `.git` stripped; `hash` is the raw text after `#`
/// (empty when no fragment was given).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedFragment {
    pub user: String,
    pub repo: String,
    pub hash: String,
}

/// Split a hosted fragment into its parts.
pub fn explode_hosted_fragment(fragment: &str) -> Result<HostedFragment> {
    let (path, hash) = match fragment.split_once('#') {
        Some((path, hash)) => (path, hash),
        None => (fragment, ""),
    };

    let mut segments = path.split('/');
    let user = segments.next().unwrap_or("");
    let repo = segments.next().unwrap_or("");
    if user.is_empty() || repo.is_empty() || segments.next().is_some() {
        bail!("malformed hosted git fragment '{fragment}' (expected 'user/repo[#hash]')");
    }

    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        bail!("malformed hosted git fragment '{fragment}' (repository name is empty)");
    }

    Ok(HostedFragment {
        user: user.to_string(),
        repo: repo.to_string(),
        hash: hash.to_string(),
    })
}
