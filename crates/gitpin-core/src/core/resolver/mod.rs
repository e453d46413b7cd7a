//! Resolver façade: the entry points the outer system (and the CLI)
//! consume.
//!
//! A resolve run is: lockfile replay → recognize and normalize the
//! specifier → hosted SSH fast path → session init (secure, list refs,
//! resolve version, probe) → manifest probing and decoration.

pub(crate) mod manifest;

use std::path::PathBuf;

use anyhow::Result;
use serde_json::{json, Value};
use tracing::{debug, warn};

use gitpin_domain::{
    is_git_pattern, load_lock_snapshot_optional, normalize_git_url, split_fragment, GitUrl,
    HostedProvider,
};

use crate::core::config::context::CommandContext;
use crate::core::config::Config;
use crate::core::git::errors::{git_user_error, GitIssue};
use crate::core::git::probe::has_archive_capability;
use crate::core::git::secure::secure_git_url;
use crate::core::git::session::GitSession;
use crate::core::tooling::outcome::{outcome_from_result, ExecutionOutcome};

use self::manifest::{decorate_manifest, synthesized_manifest};

#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub specifier: String,
}

#[derive(Debug, Clone)]
pub struct RefsRequest {
    pub specifier: String,
}

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub specifier: String,
    pub version: Option<String>,
    pub lockfile: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub specifier: String,
    pub version: Option<String>,
    pub dest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub specifier: String,
    pub version: Option<String>,
    pub dest: PathBuf,
}

fn ensure_git_specifier(specifier: &str) -> Result<()> {
    if is_git_pattern(specifier) {
        return Ok(());
    }
    Err(git_user_error(GitIssue::UnrecognizedSpecifier {
        specifier: specifier.to_string(),
    }))
}

fn normalize_checked(specifier: &str) -> Result<GitUrl> {
    normalize_git_url(specifier).map_err(|err| {
        git_user_error(GitIssue::MalformedSpecifier {
            specifier: specifier.to_string(),
            detail: err.to_string(),
        })
    })
}

/// The version token: an explicit `--version` wins over the `#fragment`.
fn version_token(specifier: &str, explicit: Option<&str>) -> String {
    if let Some(version) = explicit {
        return version.to_string();
    }
    split_fragment(specifier).1.unwrap_or("").to_string()
}

/// Hosted remotes delegate over their SSH form; whether that form supports
/// server-side archive decides if the session takes the no-clone path.
fn apply_hosted_fast_path(config: &Config, url: GitUrl) -> Result<GitUrl> {
    let Some(hosted) = url.hosted.clone() else {
        return Ok(url);
    };
    let Some(provider) = url.hostname.as_deref().and_then(HostedProvider::from_hostname) else {
        return Ok(url);
    };
    if !config.online() {
        // Probing needs the network; stay on the canonical form and let the
        // session surface the offline issue.
        return Ok(url);
    }
    let ssh = GitUrl {
        protocol: "ssh:".to_string(),
        hostname: url.hostname.clone(),
        repository: provider.ssh_repository(&hosted.user, &hosted.repo),
        hosted: Some(hosted),
    };
    let capable = has_archive_capability(&ssh)?;
    debug!(
        repository = %ssh.repository,
        capable,
        "hosted remote delegated over ssh"
    );
    Ok(ssh)
}

fn session_for<'a>(
    config: &'a Config,
    specifier: &str,
    explicit_version: Option<&str>,
) -> Result<GitSession<'a>> {
    ensure_git_specifier(specifier)?;
    let url = normalize_checked(specifier)?;
    let url = apply_hosted_fast_path(config, url)?;
    let wanted = version_token(specifier, explicit_version);
    Ok(GitSession::new(config, url, wanted))
}

/// Classify a specifier and show its canonical form. Never touches the
/// network.
pub fn check_specifier(request: &CheckRequest) -> Result<ExecutionOutcome> {
    outcome_from_result(check_inner(request))
}

fn check_inner(request: &CheckRequest) -> Result<ExecutionOutcome> {
    let specifier = request.specifier.trim();
    if !is_git_pattern(specifier) {
        return Ok(ExecutionOutcome::success(
            format!("'{specifier}' is not a git specifier"),
            json!({ "specifier": specifier, "git": false }),
        ));
    }
    let url = normalize_checked(specifier)?;
    Ok(ExecutionOutcome::success(
        format!("'{}' resolves remotes via {}", specifier, url.repository),
        json!({ "specifier": specifier, "git": true, "url": url }),
    ))
}

/// List the remote's parsed ref table.
pub fn list_refs(ctx: &CommandContext, request: &RefsRequest) -> Result<ExecutionOutcome> {
    outcome_from_result(refs_inner(ctx, request))
}

fn refs_inner(ctx: &CommandContext, request: &RefsRequest) -> Result<ExecutionOutcome> {
    let specifier = request.specifier.trim();
    ensure_git_specifier(specifier)?;
    let url = normalize_checked(specifier)?;
    let wanted = version_token(specifier, None);
    let secured = secure_git_url(url, &wanted, ctx.config().online())?;
    let session = GitSession::new(ctx.config(), secured, wanted);
    let refs = session.list_refs()?;
    Ok(ExecutionOutcome::success(
        format!("{} refs at {}", refs.len(), session.repository()),
        json!({ "repository": session.repository(), "refs": refs }),
    ))
}

/// Resolve a specifier to a pinned commit and a decorated manifest.
pub fn resolve_specifier(ctx: &CommandContext, request: &ResolveRequest) -> Result<ExecutionOutcome> {
    outcome_from_result(resolve_inner(ctx, request))
}

fn resolve_inner(ctx: &CommandContext, request: &ResolveRequest) -> Result<ExecutionOutcome> {
    let specifier = request.specifier.trim();

    // Idempotent lockfile replay: a previously locked git resolution is
    // returned unchanged.
    let snapshot = load_lock_snapshot_optional(request.lockfile.as_deref()).map_err(|err| {
        git_user_error(GitIssue::InvalidLockfile {
            path: request
                .lockfile
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            detail: format!("{err:#}"),
        })
    })?;
    if let Some(entry) = snapshot.git_entry(specifier) {
        debug!(%specifier, resolved = %entry.resolved, "lockfile replay");
        return Ok(ExecutionOutcome::success(
            format!("replayed '{specifier}' from lockfile"),
            json!({
                "specifier": specifier,
                "resolved": entry.resolved,
                "manifest": entry.manifest,
                "replayed": true,
            }),
        ));
    }

    let mut session = session_for(ctx.config(), specifier, request.version.as_deref())?;
    let hash = session.init()?;

    let mut found: Option<(String, serde_json::Map<String, Value>)> = None;
    for (registry, filename) in ctx.config().registry_manifests() {
        let Some(text) = session.get_file(filename)? else {
            continue;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => {
                found = Some((registry.clone(), map));
                break;
            }
            _ => {
                warn!(%filename, repository = %session.repository(), "ignoring unparsable manifest");
            }
        }
    }

    let manifest = match found {
        Some((registry, map)) => decorate_manifest(map, session.repository(), &hash, &registry),
        None => {
            let preferred = ctx
                .config()
                .registry_manifests()
                .first()
                .map(|(registry, _)| registry.as_str())
                .unwrap_or("npm");
            synthesized_manifest(session.repository(), &hash, preferred)
        }
    };

    Ok(ExecutionOutcome::success(
        format!("resolved '{specifier}' to {hash}"),
        json!({
            "specifier": specifier,
            "resolved": format!("{}#{}", session.repository(), hash),
            "manifest": manifest,
            "replayed": false,
        }),
    ))
}

/// Snapshot tarball with its content digest.
pub fn archive_specifier(ctx: &CommandContext, request: &ArchiveRequest) -> Result<ExecutionOutcome> {
    outcome_from_result(archive_inner(ctx, request))
}

fn archive_inner(ctx: &CommandContext, request: &ArchiveRequest) -> Result<ExecutionOutcome> {
    let specifier = request.specifier.trim();
    let mut session = session_for(ctx.config(), specifier, request.version.as_deref())?;
    let hash = session.init()?;
    let digest = session.archive_to(&request.dest)?;
    Ok(ExecutionOutcome::success(
        format!("archived '{specifier}' at {hash}"),
        json!({
            "specifier": specifier,
            "hash": hash,
            "digest": digest,
            "dest": request.dest,
        }),
    ))
}

/// Read-only snapshot tree.
pub fn export_specifier(ctx: &CommandContext, request: &ExportRequest) -> Result<ExecutionOutcome> {
    outcome_from_result(export_inner(ctx, request))
}

fn export_inner(ctx: &CommandContext, request: &ExportRequest) -> Result<ExecutionOutcome> {
    let specifier = request.specifier.trim();
    let mut session = session_for(ctx.config(), specifier, request.version.as_deref())?;
    let hash = session.init()?;
    session.export_to(&request.dest)?;
    Ok(ExecutionOutcome::success(
        format!("exported '{specifier}' at {hash}"),
        json!({
            "specifier": specifier,
            "hash": hash,
            "dest": request.dest,
        }),
    ))
}
