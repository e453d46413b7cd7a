#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Skip guard for environments without a git binary.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Runs git in `repo`, panicking on failure.
///
/// # Panics
/// Panics if git cannot be spawned or exits nonzero.
pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub struct Fixture {
    pub temp: TempDir,
    pub repo: PathBuf,
    pub cache: PathBuf,
}

/// Builds a throwaway repository with tagged releases, an annotated tag,
/// and a work branch:
///
/// - `v1.0.0`, `v1.1.0` lightweight tags (manifest versions to match)
/// - `rel` annotated tag at the `v1.1.0` commit (peels in ls-remote)
/// - `dev` branch with one extra commit
pub fn prepare_fixture(prefix: &str) -> Fixture {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let repo = temp.path().join("repo");
    let cache = temp.path().join("cache");
    fs::create_dir_all(&repo).expect("repo dir");

    git(&repo, &["init"]);
    git(&repo, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo, &["config", "user.email", "test@example.com"]);
    git(&repo, &["config", "user.name", "Test"]);

    fs::write(
        repo.join("package.json"),
        "{\"name\": \"fixture\", \"version\": \"1.0.0\"}\n",
    )
    .expect("manifest");
    fs::write(repo.join("README.md"), "fixture\n").expect("readme");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "release 1.0.0"]);
    git(&repo, &["tag", "v1.0.0"]);

    fs::write(
        repo.join("package.json"),
        "{\"name\": \"fixture\", \"version\": \"1.1.0\"}\n",
    )
    .expect("manifest");
    git(&repo, &["commit", "-am", "release 1.1.0"]);
    git(&repo, &["tag", "v1.1.0"]);
    git(&repo, &["tag", "-a", "rel", "-m", "release tag"]);

    git(&repo, &["checkout", "-b", "dev"]);
    fs::write(repo.join("README.md"), "dev branch\n").expect("readme");
    git(&repo, &["commit", "-am", "dev work"]);
    git(&repo, &["checkout", "main"]);

    Fixture { temp, repo, cache }
}

/// The `git+file://` specifier for a fixture repository.
pub fn specifier(repo: &Path) -> String {
    format!("git+file://{}", repo.display())
}

/// A gitpin command with its cache isolated under the fixture.
pub fn gitpin(cache: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gitpin").expect("gitpin binary");
    cmd.env("GITPIN_CACHE_PATH", cache);
    cmd.env_remove("GITPIN_ONLINE");
    cmd
}

/// Parses the JSON envelope from a completed command assertion.
///
/// # Panics
/// Panics if stdout is not valid JSON.
pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}
