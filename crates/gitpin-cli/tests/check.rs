mod common;

use common::{gitpin, parse_json};
use tempfile::tempdir;

#[test]
fn shorthand_normalizes_to_hosted_https() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "check", "user/repo#v1"])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(json["status"], "Ok");
    assert_eq!(json["details"]["git"], true);
    assert_eq!(
        json["details"]["url"]["repository"],
        "https://github.com/user/repo.git"
    );
    assert_eq!(json["details"]["url"]["protocol"], "https:");
    assert_eq!(json["details"]["url"]["hosted"]["user"], "user");
    assert_eq!(json["details"]["url"]["hosted"]["hash"], "v1");
}

#[test]
fn hosted_alias_uses_provider_hostname() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "check", "gitlab:group/project.git#main"])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(
        json["details"]["url"]["repository"],
        "https://gitlab.com/group/project.git"
    );
    assert_eq!(json["details"]["url"]["hostname"], "gitlab.com");
}

#[test]
fn numeric_port_stays_a_regular_ssh_url() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "check", "git+ssh://git@gitlab.tld:10202/p/m.git"])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(json["details"]["url"]["protocol"], "ssh:");
    assert_eq!(json["details"]["url"]["hostname"], "gitlab.tld");
    assert_eq!(
        json["details"]["url"]["repository"],
        "ssh://git@gitlab.tld:10202/p/m.git"
    );
}

#[test]
fn scp_like_remote_is_kept_verbatim() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "check", "git+ssh://git@github.com:user/repo.git"])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(json["details"]["url"]["protocol"], "ssh:");
    assert_eq!(
        json["details"]["url"]["repository"],
        "git@github.com:user/repo.git"
    );
}

#[test]
fn prefixed_scp_remote_is_not_git() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "check", "package@git@bitbucket.org:team/repo.git"])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(json["details"]["git"], false);
}

#[test]
fn deep_hosted_paths_are_not_git() {
    let temp = tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args([
            "--json",
            "check",
            "https://github.com/user/repo/archive/v1.0.0.tar.gz",
        ])
        .assert()
        .success();
    let json = parse_json(&assert);
    assert_eq!(json["details"]["git"], false);
}
