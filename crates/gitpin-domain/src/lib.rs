#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod hosted;
pub mod lockfile;
pub mod locator;
pub mod pattern;
pub mod refs;
pub mod version;

pub use hosted::{explode_hosted_fragment, HostedFragment, HostedProvider};
pub use lockfile::{load_lock_snapshot_optional, LockSnapshot, LockedResolution};
pub use locator::{normalize_git_url, redact_credentials, split_fragment, GitUrl};
pub use pattern::is_git_pattern;
pub use refs::{parse_ref_lines, parse_symref_head, RefMap, SymrefHead};
pub use version::{is_commit_sha, resolve_named, resolve_version, Resolution};
