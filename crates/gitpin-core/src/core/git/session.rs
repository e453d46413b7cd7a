//! Repository session: a stateful handle over one remote for the duration
//! of one resolve call.
//!
//! `init` walks the session through securing the URL, listing refs,
//! resolving the version token to a commit, probing archive capability,
//! and eagerly populating the local checkout when server-side archive is
//! not available. Checkouts are content-addressed by the canonical
//! repository string and persist across invocations as a cache.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use tar::Archive;
use tracing::debug;

use gitpin_domain::{
    parse_ref_lines, parse_symref_head, resolve_named, resolve_version, GitUrl, RefMap,
    Resolution, SymrefHead,
};

use crate::core::config::Config;
use crate::core::git::errors::{git_user_error, GitIssue};
use crate::core::git::locks::lock_repository;
use crate::core::git::probe::has_archive_capability;
use crate::core::git::process::{run_git, run_git_checked, GitStream};
use crate::core::git::secure::secure_git_url;
use crate::core::git::ARCHIVE_MISSING_FILE_MARKER;

const CHECKOUTS_DIR: &str = "checkouts";

/// Working directory for a remote, shared by every session on it.
pub(crate) fn checkout_dir(cache_root: &Path, repository: &str) -> PathBuf {
    let digest = hex::encode(Sha256::digest(repository.as_bytes()));
    cache_root.join(CHECKOUTS_DIR).join(digest)
}

pub struct GitSession<'a> {
    config: &'a Config,
    url: GitUrl,
    wanted: String,
    hash: String,
    ref_name: Option<String>,
    cwd: PathBuf,
    supports_archive: bool,
    fetched: bool,
}

impl<'a> GitSession<'a> {
    pub fn new(config: &'a Config, url: GitUrl, wanted: impl Into<String>) -> Self {
        let wanted = wanted.into();
        let cwd = checkout_dir(config.cache_root(), &url.repository);
        Self {
            config,
            url,
            wanted,
            hash: String::new(),
            ref_name: None,
            cwd,
            supports_archive: false,
            fetched: false,
        }
    }

    /// The canonical remote string handed to git.
    pub fn repository(&self) -> &str {
        &self.url.repository
    }

    /// The resolved 40-hex commit; empty before [`GitSession::init`].
    pub fn resolved_hash(&self) -> &str {
        &self.hash
    }

    /// The ref the commit was resolved through, when one is known.
    pub fn resolved_ref(&self) -> Option<&str> {
        self.ref_name.as_deref()
    }

    pub fn supports_archive(&self) -> bool {
        self.supports_archive
    }

    fn require_online(&self) -> Result<()> {
        if self.url.protocol == "file:" || self.config.online() {
            return Ok(());
        }
        Err(git_user_error(GitIssue::Offline {
            repository: self.url.repository.clone(),
        }))
    }

    /// Secure the URL, list refs, resolve the version, probe transport.
    ///
    /// Returns the resolved 40-hex commit SHA.
    pub fn init(&mut self) -> Result<String> {
        let secured = secure_git_url(self.url.clone(), &self.wanted, self.config.online())?;
        if secured.repository != self.url.repository {
            self.cwd = checkout_dir(self.config.cache_root(), &secured.repository);
        }
        self.url = secured;

        let refs = self.list_refs()?;
        let resolution = resolve_version(&self.wanted, &refs);
        self.apply_resolution(resolution, &refs)?;

        // Server-side archive needs a symbolic ref; raw commits always go
        // through the local checkout.
        self.supports_archive = match self.ref_name.as_deref() {
            Some(ref_name) if !ref_name.is_empty() => has_archive_capability(&self.url)?,
            _ => false,
        };
        if !self.supports_archive {
            self.fetch()?;
        }

        debug!(
            repository = %self.url.repository,
            hash = %self.hash,
            ref_name = self.ref_name.as_deref().unwrap_or(""),
            archive = self.supports_archive,
            "session initialized"
        );
        Ok(self.hash.clone())
    }

    fn apply_resolution(&mut self, resolution: Resolution, refs: &RefMap) -> Result<()> {
        match resolution {
            Resolution::Pinned { sha, ref_name } => {
                self.hash = sha;
                self.ref_name = ref_name;
                Ok(())
            }
            Resolution::DefaultBranch => {
                let head = self.resolve_default_branch()?;
                self.hash = head.sha;
                self.ref_name = head.ref_name;
                Ok(())
            }
            Resolution::CommitCandidate(candidate) => {
                if let Some(sha) = self.resolve_commit(&candidate)? {
                    self.hash = sha;
                    self.ref_name = None;
                    return Ok(());
                }
                // The prefix is unknown to the repository; fall back to the
                // name-based strategies (a ref may be named in hex).
                match resolve_named(&self.wanted, refs) {
                    Resolution::CommitCandidate(_) => Err(self.unresolved(refs)),
                    other => self.apply_resolution(other, refs),
                }
            }
            Resolution::NotFound => Err(self.unresolved(refs)),
        }
    }

    fn unresolved(&self, refs: &RefMap) -> anyhow::Error {
        git_user_error(GitIssue::UnresolvedVersion {
            version: self.wanted.clone(),
            repository: self.url.repository.clone(),
            known_refs: refs.keys().cloned().collect(),
        })
    }

    pub(crate) fn list_refs(&self) -> Result<RefMap> {
        self.require_online()?;
        let stdout = run_git_checked(
            "ls-remote",
            &self.url.repository,
            &["ls-remote", "--tags", "--heads", &self.url.repository],
            None,
        )?;
        Ok(parse_ref_lines(&stdout))
    }

    /// Materialize the default-branch sentinel against the live remote.
    fn resolve_default_branch(&self) -> Result<SymrefHead> {
        let output = run_git(
            &["ls-remote", "--symref", &self.url.repository, "HEAD"],
            None,
        )?;
        let text = if output.status.success() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            // Older git does not accept --symref; settle for the SHA only.
            run_git_checked(
                "ls-remote",
                &self.url.repository,
                &["ls-remote", &self.url.repository, "HEAD"],
                None,
            )?
        };
        parse_symref_head(&text).ok_or_else(|| {
            git_user_error(GitIssue::ProcessFailed {
                action: "ls-remote",
                repository: self.url.repository.clone(),
                stderr: "remote did not advertise a HEAD".to_string(),
            })
        })
    }

    /// Populate the shared checkout under the per-repository lock.
    pub fn fetch(&mut self) -> Result<()> {
        if self.fetched {
            return Ok(());
        }
        self.require_online()?;
        let _guard = lock_repository(self.config.cache_root(), &self.url.repository)?;
        if self.cwd.exists() {
            run_git_checked("pull", &self.url.repository, &["pull"], Some(&self.cwd))?;
        } else {
            if let Some(parent) = self.cwd.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create checkout parent {}", parent.display())
                })?;
            }
            let cwd = self
                .cwd
                .to_str()
                .ok_or_else(|| anyhow!("invalid checkout path {}", self.cwd.display()))?;
            run_git_checked(
                "clone",
                &self.url.repository,
                &["clone", &self.url.repository, cwd],
                None,
            )?;
        }
        self.fetched = true;
        Ok(())
    }

    /// Resolve a commit prefix the ref table does not know, against the
    /// local clone. `None` when the repository has no such commit.
    fn resolve_commit(&mut self, candidate: &str) -> Result<Option<String>> {
        self.fetch()?;
        let output = run_git(
            &[
                "rev-list",
                "-n",
                "1",
                "--no-abbrev-commit",
                "--format=oneline",
                candidate,
            ],
            Some(&self.cwd),
        )?;
        if !output.status.success() {
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(first) = stdout.lines().next() else {
            return Ok(None);
        };
        let mut fields = first.split_whitespace();
        let sha = match fields.next() {
            Some("commit") => fields.next(),
            other => other,
        };
        Ok(sha
            .filter(|sha| sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit()))
            .map(str::to_ascii_lowercase))
    }

    /// Read one file at the resolved commit.
    ///
    /// `Ok(None)` means the file does not exist at that commit; transport
    /// and process failures are errors.
    pub fn get_file(&mut self, name: &str) -> Result<Option<String>> {
        if self.supports_archive {
            let ref_name = self
                .ref_name
                .clone()
                .ok_or_else(|| anyhow!("archive-capable session has no ref"))?;
            let remote = format!("--remote={}", self.url.repository);
            let mut stream = GitStream::spawn(&["archive", &remote, &ref_name, name], None)?;
            let mut raw = Vec::new();
            io::copy(stream.stdout()?, &mut raw).context("failed to read archive stream")?;
            let status = stream.finish()?;
            if !status.success {
                if status.stderr.contains(ARCHIVE_MISSING_FILE_MARKER) {
                    return Ok(None);
                }
                return Err(git_user_error(GitIssue::ProcessFailed {
                    action: "archive",
                    repository: self.url.repository.clone(),
                    stderr: status.stderr,
                }));
            }
            return read_single_entry(&raw);
        }

        if !self.fetched {
            return Err(anyhow!(
                "session for '{}' read a file before fetching",
                self.url.repository
            ));
        }
        let spec = format!("{}:{}", self.hash, name);
        let output = run_git(&["show", &spec], Some(&self.cwd))?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    /// Write the snapshot tarball to `dest`, returning its SHA-256 digest.
    pub fn archive_to(&mut self, dest: &Path) -> Result<String> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = File::create(dest)
            .with_context(|| format!("failed to create archive file {}", dest.display()))?;
        let mut writer = HashingFileWriter::new(file);

        let status = if self.supports_archive {
            let ref_name = self
                .ref_name
                .clone()
                .ok_or_else(|| anyhow!("archive-capable session has no ref"))?;
            let remote = format!("--remote={}", self.url.repository);
            let mut stream = GitStream::spawn(&["archive", &remote, &ref_name], None)?;
            io::copy(stream.stdout()?, &mut writer).context("failed to stream archive")?;
            stream.finish()?
        } else {
            self.fetch()?;
            let mut stream = GitStream::spawn(&["archive", &self.hash], Some(&self.cwd))?;
            io::copy(stream.stdout()?, &mut writer).context("failed to stream archive")?;
            stream.finish()?
        };
        if !status.success {
            let _ = fs::remove_file(dest);
            return Err(git_user_error(GitIssue::ProcessFailed {
                action: "archive",
                repository: self.url.repository.clone(),
                stderr: status.stderr,
            }));
        }

        writer
            .file
            .sync_all()
            .with_context(|| format!("failed to flush archive {}", dest.display()))?;
        let HashingFileWriter { file, hasher, .. } = writer;
        drop(file);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Materialize the snapshot tree at `dest` as an immutable cache entry
    /// (directories `0o555`, files `0o444`).
    pub fn export_to(&mut self, dest: &Path) -> Result<()> {
        if dest.exists() {
            debug!(dest = %dest.display(), "export destination already materialized");
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let staging = dest.with_extension("partial");
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("failed to clear {}", staging.display()))?;
        }
        fs::create_dir_all(&staging)?;

        let mut stream = if self.supports_archive {
            let ref_name = self
                .ref_name
                .clone()
                .ok_or_else(|| anyhow!("archive-capable session has no ref"))?;
            let remote = format!("--remote={}", self.url.repository);
            GitStream::spawn(&["archive", &remote, &ref_name], None)?
        } else {
            self.fetch()?;
            GitStream::spawn(&["archive", &self.hash], Some(&self.cwd))?
        };
        let unpack_result = {
            let mut archive = Archive::new(stream.stdout()?);
            archive.set_preserve_permissions(false);
            archive.unpack(&staging)
        };
        let status = stream.finish()?;
        if !status.success {
            let _ = fs::remove_dir_all(&staging);
            return Err(git_user_error(GitIssue::ProcessFailed {
                action: "archive",
                repository: self.url.repository.clone(),
                stderr: status.stderr,
            }));
        }
        unpack_result.context("failed to unpack archive stream")?;

        fs::rename(&staging, dest).with_context(|| {
            format!(
                "failed to move snapshot into place ({} -> {})",
                staging.display(),
                dest.display()
            )
        })?;
        apply_snapshot_permissions(dest)?;
        Ok(())
    }
}

/// Decode the single expected entry of a one-file archive stream.
fn read_single_entry(raw: &[u8]) -> Result<Option<String>> {
    let mut archive = Archive::new(raw);
    for entry in archive.entries().context("failed to parse archive stream")? {
        let mut entry = entry.context("failed to read archive entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let mut contents = String::new();
        io::Read::read_to_string(&mut entry, &mut contents)
            .context("archive entry is not valid UTF-8")?;
        return Ok(Some(contents));
    }
    Ok(None)
}

fn apply_snapshot_permissions(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    if metadata.file_type().is_dir() {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            apply_snapshot_permissions(&entry.path())?;
        }
        set_mode(path, 0o555)?;
    } else {
        set_mode(path, 0o444)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("failed to set mode on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, _mode: u32) -> Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(true);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

struct HashingFileWriter {
    file: File,
    hasher: Sha256,
    bytes_written: u64,
}

impl HashingFileWriter {
    fn new(file: File) -> Self {
        Self {
            file,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }
}

impl Write for HashingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.file.write(buf)?;
        if written > 0 {
            self.hasher.update(&buf[..written]);
            self.bytes_written = self.bytes_written.saturating_add(written as u64);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EnvSnapshot;
    use anyhow::bail;
    use gitpin_domain::normalize_git_url;
    use std::process::Command;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn git(repo: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git").arg("-C").arg(repo).args(args).output()?;
        if !output.status.success() {
            bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn init_repo(repo: &Path) -> Result<()> {
        fs::create_dir_all(repo)?;
        git(repo, &["init"])?;
        git(repo, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        git(repo, &["config", "user.email", "test@example.com"])?;
        git(repo, &["config", "user.name", "Test"])?;
        fs::write(
            repo.join("package.json"),
            "{\"name\": \"fixture\", \"version\": \"1.0.0\"}\n",
        )?;
        fs::write(repo.join("README.md"), "fixture\n")?;
        git(repo, &["add", "."])?;
        git(repo, &["commit", "-m", "initial"])?;
        git(repo, &["tag", "v1.0.0"])?;
        Ok(())
    }

    fn test_config(cache: &Path) -> Config {
        let cache = cache.to_string_lossy().to_string();
        let snapshot = EnvSnapshot::testing(&[("GITPIN_CACHE_PATH", cache.as_str())]);
        Config::from_snapshot(&snapshot).expect("config")
    }

    fn file_specifier(repo: &Path) -> String {
        format!("git+file://{}", repo.display())
    }

    #[test]
    fn checkout_dirs_are_deterministic_per_remote() {
        let root = Path::new("/tmp/cache");
        let a = checkout_dir(root, "https://example.com/a.git");
        assert_eq!(a, checkout_dir(root, "https://example.com/a.git"));
        assert_ne!(a, checkout_dir(root, "https://example.com/b.git"));
    }

    #[test]
    fn init_resolves_tag_and_reads_manifest() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, "v1.0.0");
        let hash = session.init().expect("init");
        assert_eq!(hash.len(), 40);
        assert_eq!(session.resolved_ref(), Some("refs/tags/v1.0.0"));
        assert!(!session.supports_archive());

        let manifest = session
            .get_file("package.json")
            .expect("get_file")
            .expect("manifest present");
        assert!(manifest.contains("\"fixture\""));

        assert_eq!(session.get_file("no-such-file.json").expect("get_file"), None);
    }

    #[test]
    fn init_resolves_default_branch_when_version_is_empty() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, "");
        let hash = session.init().expect("init");
        let head = git(&repo, &["rev-parse", "HEAD"]).expect("rev-parse");
        assert_eq!(hash, head);
        assert_eq!(session.resolved_ref(), Some("refs/heads/main"));
    }

    #[test]
    fn init_resolves_commit_prefix_via_rev_list() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        // Two more commits so the middle one is not the tip of any ref and
        // can only be settled against the clone.
        fs::write(repo.join("README.md"), "fixture v2\n").expect("write");
        git(&repo, &["commit", "-am", "second"]).expect("commit");
        let middle = git(&repo, &["rev-parse", "HEAD"]).expect("rev-parse");
        fs::write(repo.join("README.md"), "fixture v3\n").expect("write");
        git(&repo, &["commit", "-am", "third"]).expect("commit");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, &middle[..10]);
        let hash = session.init().expect("init");
        assert_eq!(hash, middle);
        assert_eq!(session.resolved_ref(), None);
    }

    #[test]
    fn unknown_version_is_a_not_found_user_error() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, "no-such-version");
        let err = session.init().expect_err("should not resolve");
        let user = err
            .downcast_ref::<crate::core::tooling::outcome::ResolveUserError>()
            .expect("user error");
        assert_eq!(user.details()["code"], "GP712");
        assert!(user.details()["known_refs"]
            .as_array()
            .expect("refs")
            .iter()
            .any(|r| r == "refs/tags/v1.0.0"));
    }

    #[test]
    fn archive_digest_matches_written_bytes() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, "v1.0.0");
        session.init().expect("init");

        let dest = temp.path().join("out").join("snapshot.tar");
        let digest = session.archive_to(&dest).expect("archive");
        let bytes = fs::read(&dest).expect("archive bytes");
        assert_eq!(digest, hex::encode(Sha256::digest(&bytes)));
        assert!(!bytes.is_empty());
    }

    #[test]
    fn export_materializes_read_only_tree() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("repo");
        init_repo(&repo).expect("fixture repo");
        let config = test_config(&temp.path().join("cache"));

        let url = normalize_git_url(&file_specifier(&repo)).expect("normalize");
        let mut session = GitSession::new(&config, url, "v1.0.0");
        session.init().expect("init");

        let dest = temp.path().join("snapshot");
        session.export_to(&dest).expect("export");
        assert!(dest.join("package.json").exists());
        assert!(dest.join("README.md").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir_mode = fs::metadata(&dest).expect("meta").permissions().mode() & 0o777;
            let file_mode = fs::metadata(dest.join("package.json"))
                .expect("meta")
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(dir_mode, 0o555);
            assert_eq!(file_mode, 0o444);
        }

        // Second export over the same destination is a no-op.
        session.export_to(&dest).expect("export again");
    }
}
