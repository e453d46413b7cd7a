// Intended public API surface for `gitpin-core`.
//
// This module exists to keep the crate root small and make it explicit which
// types/functions are part of the stable interface used by the CLI and other
// crates.

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{Config, GlobalOptions};

pub use crate::core::git::errors::GitIssue;
pub use crate::core::git::session::GitSession;

pub use crate::core::resolver::{
    archive_specifier, check_specifier, export_specifier, list_refs, resolve_specifier,
    ArchiveRequest, CheckRequest, ExportRequest, RefsRequest, ResolveRequest,
};

pub use crate::core::tooling::outcome::{
    outcome_from_error, to_json_response, CommandGroup, CommandStatus, ExecutionOutcome,
    ResolveUserError,
};
