//! Manifest decoration and synthesis.

use percent_encoding::percent_decode_str;
use serde_json::{json, Map, Value};

/// Attach provenance fields to a package manifest.
pub(crate) fn decorate_manifest(
    mut manifest: Map<String, Value>,
    repository: &str,
    hash: &str,
    registry: &str,
) -> Value {
    manifest.insert("_uid".to_string(), json!(hash));
    manifest.insert(
        "_remote".to_string(),
        json!({
            "resolved": format!("{repository}#{hash}"),
            "type": "git",
            "reference": repository,
            "hash": hash,
            "registry": registry,
        }),
    );
    Value::Object(manifest)
}

/// Minimal manifest for repositories that carry no registry file.
pub(crate) fn synthesized_manifest(repository: &str, hash: &str, registry: &str) -> Value {
    let mut manifest = Map::new();
    manifest.insert("name".to_string(), json!(guess_name(repository)));
    manifest.insert("version".to_string(), json!("0.0.0"));
    decorate_manifest(manifest, repository, hash, registry)
}

/// Guess a package name from the remote's final path segment.
pub(crate) fn guess_name(repository: &str) -> String {
    let trimmed = repository.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    // scp-style remotes may have no slash at all (`git@host:repo.git`).
    let last = last.rsplit(':').next().unwrap_or(last);
    let last = last.strip_suffix(".git").unwrap_or(last);
    let decoded = percent_decode_str(last)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| last.to_string());
    if decoded.is_empty() {
        "unknown".to_string()
    } else {
        decoded
    }
}
