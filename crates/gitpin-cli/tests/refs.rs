mod common;

use common::{git, git_available, gitpin, parse_json, prepare_fixture, specifier};

#[test]
fn refs_lists_tags_and_branches_with_peeled_shas() {
    if !git_available() {
        return;
    }
    let fx = prepare_fixture("gitpin-refs");
    let peeled = git(&fx.repo, &["rev-parse", "rel^{}"]);
    let spec = specifier(&fx.repo);

    let assert = gitpin(&fx.cache)
        .args(["--json", "refs", spec.as_str()])
        .assert()
        .success();
    let json = parse_json(&assert);
    let refs = json["details"]["refs"].as_object().expect("refs table");

    assert!(refs.contains_key("refs/heads/main"));
    assert!(refs.contains_key("refs/heads/dev"));
    assert!(refs.contains_key("refs/tags/v1.0.0"));
    assert!(refs.contains_key("refs/tags/v1.1.0"));
    // The annotated tag resolves to the commit it points at, and peeled
    // entries never leak into the table.
    assert_eq!(refs["refs/tags/rel"], serde_json::json!(peeled));
    assert!(!refs.keys().any(|name| name.ends_with("^{}")));
}

#[test]
fn refs_rejects_non_git_specifiers() {
    let temp = tempfile::tempdir().expect("tempdir");
    let assert = gitpin(temp.path())
        .args(["--json", "refs", "not-a-git-thing"])
        .assert()
        .code(1);
    let json = parse_json(&assert);
    assert_eq!(json["details"]["code"], "GP710");
}
