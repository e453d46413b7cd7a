//! Git engine: subprocess runner, security policy, archive probing, the
//! repository session, and per-repository locking.

/// Marker a capable `git archive` server emits for a nonexistent path.
pub(crate) const ARCHIVE_MISSING_FILE_MARKER: &str = "did not match any files";

pub(crate) mod errors;
pub(crate) mod locks;
pub(crate) mod probe;
pub(crate) mod process;
pub(crate) mod secure;
pub(crate) mod session;
