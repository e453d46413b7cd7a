//! Transport security policy.
//!
//! An unauthenticated fetch of mutable content (branch or tag) must be
//! integrity-protected by TLS. A commit-pinned fetch is safe over any
//! transport because the SHA authenticates the content. Insecure schemes
//! are upgraded where an HTTPS mirror exists and refused otherwise; the
//! request never silently downgrades.

use anyhow::Result;
use tracing::debug;

use gitpin_domain::{is_commit_sha, GitUrl};

use crate::core::git::errors::{git_user_error, GitIssue};
use crate::core::git::process::run_git;

/// Whether a remote answers at all: `git ls-remote -t` exits 0.
pub(crate) fn remote_exists(repository: &str) -> Result<bool> {
    let output = run_git(&["ls-remote", "-t", repository], None)?;
    Ok(output.status.success())
}

fn require_online(repository: &str, online: bool) -> Result<()> {
    if online {
        return Ok(());
    }
    Err(git_user_error(GitIssue::Offline {
        repository: repository.to_string(),
    }))
}

/// Apply the security policy to a canonical URL before any fetch.
pub(crate) fn secure_git_url(url: GitUrl, user_hash: &str, online: bool) -> Result<GitUrl> {
    if is_commit_sha(user_hash.trim()) {
        return Ok(url);
    }

    match url.protocol.as_str() {
        "git:" => {
            require_online(&url.repository, online)?;
            let https = url.with_protocol("https:");
            if remote_exists(&https.repository)? {
                debug!(repository = %https.repository, "upgraded git:// remote to https");
                return Ok(https);
            }
            Err(git_user_error(GitIssue::InsecureTransport {
                repository: url.repository,
                protocol: "git:".to_string(),
            }))
        }
        "http:" => {
            require_online(&url.repository, online)?;
            let https = url.with_protocol("https:");
            if remote_exists(&https.repository)? {
                debug!(repository = %https.repository, "upgraded http:// remote to https");
                return Ok(https);
            }
            // Private mirrors without TLS are permitted when they are the
            // only remote that answers.
            if remote_exists(&url.repository)? {
                return Ok(url);
            }
            Err(git_user_error(GitIssue::UnreachableRemote {
                repository: url.repository,
            }))
        }
        "https:" => {
            require_online(&url.repository, online)?;
            if remote_exists(&url.repository)? {
                return Ok(url);
            }
            Err(git_user_error(GitIssue::UnreachableRemote {
                repository: url.repository,
            }))
        }
        _ => Ok(url),
    }
}
