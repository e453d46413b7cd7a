//! Read-only lockfile replay input.
//!
//! The outer system owns the lockfile; this crate only understands enough
//! of its shape to replay a previously locked git resolution verbatim.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A locked resolution as recorded by a prior resolve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedResolution {
    /// Resolver kind; only `"git"` entries are replayed here.
    #[serde(rename = "type")]
    pub kind: String,
    /// `<url>#<commit>` as produced by the resolver.
    pub resolved: String,
    /// The decorated manifest captured at lock time, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Value>,
}

/// Specifier → locked resolution map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    #[serde(default)]
    pub entries: BTreeMap<String, LockedResolution>,
}

impl LockSnapshot {
    /// The replayable git entry for a specifier, if any.
    pub fn git_entry(&self, specifier: &str) -> Option<&LockedResolution> {
        self.entries
            .get(specifier)
            .filter(|entry| entry.kind == "git")
    }
}

/// Load a lock snapshot, treating an absent path as an empty snapshot.
pub fn load_lock_snapshot_optional(path: Option<&Path>) -> Result<LockSnapshot> {
    let Some(path) = path else {
        return Ok(LockSnapshot::default());
    };
    if !path.exists() {
        return Ok(LockSnapshot::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read lock snapshot {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse lock snapshot {}", path.display()))
}
