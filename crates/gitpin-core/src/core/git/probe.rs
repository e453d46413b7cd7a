//! Server-side `git archive` capability probing.
//!
//! Only ssh remotes with a known hostname can support `git archive
//! --remote`. The result is cached per hostname for the life of the
//! process, both hits and misses; github.com is seeded as a known refusal.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use tracing::debug;

use gitpin_domain::GitUrl;

use crate::core::git::process::run_git;
use crate::core::git::ARCHIVE_MISSING_FILE_MARKER;

fn capability_cache() -> &'static Mutex<HashMap<String, bool>> {
    static CACHE: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        let mut seeded = HashMap::new();
        seeded.insert("github.com".to_string(), false);
        Mutex::new(seeded)
    })
}

fn cached_capability(hostname: &str) -> Result<Option<bool>> {
    let cache = capability_cache()
        .lock()
        .map_err(|_| anyhow!("archive capability cache poisoned"))?;
    Ok(cache.get(hostname).copied())
}

fn record_capability(hostname: String, capable: bool) -> Result<()> {
    let mut cache = capability_cache()
        .lock()
        .map_err(|_| anyhow!("archive capability cache poisoned"))?;
    cache.insert(hostname, capable);
    Ok(())
}

/// A filename guaranteed not to exist in any reasonable repository: the
/// current millisecond count.
fn probe_filename() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// Whether the remote supports server-side `git archive`.
///
/// The probe asks the remote to archive a nonexistent file; a server that
/// understands the request fails with "did not match any files", anything
/// else (auth failure, refused service, unknown option) means no
/// capability.
pub(crate) fn has_archive_capability(url: &GitUrl) -> Result<bool> {
    if url.protocol != "ssh:" {
        return Ok(false);
    }
    let Some(hostname) = url.hostname.clone() else {
        return Ok(false);
    };

    if let Some(cached) = cached_capability(&hostname)? {
        debug!(%hostname, capable = cached, "archive capability cache hit");
        return Ok(cached);
    }

    let remote = format!("--remote={}", url.repository);
    let filename = probe_filename();
    let output = run_git(&["archive", &remote, "HEAD", &filename], None)?;
    let capable = if output.status.success() {
        false
    } else {
        String::from_utf8_lossy(&output.stderr).contains(ARCHIVE_MISSING_FILE_MARKER)
    };
    debug!(%hostname, capable, "archive capability probed");
    record_capability(hostname, capable)?;
    Ok(capable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ssh_url(hostname: &str) -> GitUrl {
        GitUrl {
            protocol: "ssh:".to_string(),
            hostname: Some(hostname.to_string()),
            repository: format!("ssh://git@{hostname}/user/repo.git"),
            hosted: None,
        }
    }

    #[test]
    fn github_is_seeded_as_refusing() {
        assert!(!has_archive_capability(&ssh_url("github.com")).expect("probe"));
    }

    #[test]
    fn non_ssh_remotes_have_no_capability() {
        let url = GitUrl {
            protocol: "https:".to_string(),
            hostname: Some("gitlab.com".to_string()),
            repository: "https://gitlab.com/user/repo.git".to_string(),
            hosted: None,
        };
        assert!(!has_archive_capability(&url).expect("probe"));
    }

    #[test]
    fn missing_hostname_has_no_capability() {
        let url = GitUrl {
            protocol: "ssh:".to_string(),
            hostname: None,
            repository: "git@somewhere:user/repo.git".to_string(),
            hosted: None,
        };
        assert!(!has_archive_capability(&url).expect("probe"));
    }

    #[test]
    fn cached_outcomes_short_circuit_probing() {
        record_capability("cached.example".to_string(), true).expect("record");
        assert!(has_archive_capability(&ssh_url("cached.example")).expect("probe"));

        record_capability("refused.example".to_string(), false).expect("record");
        assert!(!has_archive_capability(&ssh_url("refused.example")).expect("probe"));
    }

    #[test]
    fn probe_filename_is_numeric() {
        assert!(probe_filename().bytes().all(|b| b.is_ascii_digit()));
    }
}
