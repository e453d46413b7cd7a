use color_eyre::{eyre::eyre, Result};
use gitpin_core::api::{
    self as core_api, ArchiveRequest, CheckRequest, CommandContext, CommandGroup, CommandInfo,
    ExecutionOutcome, ExportRequest, RefsRequest, ResolveRequest,
};

use crate::{ArchiveArgs, CheckArgs, CommandGroupCli, ExportArgs, RefsArgs, ResolveArgs};

/// The command info for a parsed subcommand, available before a context
/// exists so setup failures still render through the normal envelope.
pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Check(_) => CommandInfo::new(CommandGroup::Check, "check"),
        CommandGroupCli::Refs(_) => CommandInfo::new(CommandGroup::Refs, "refs"),
        CommandGroupCli::Resolve(_) => CommandInfo::new(CommandGroup::Resolve, "resolve"),
        CommandGroupCli::Archive(_) => CommandInfo::new(CommandGroup::Archive, "archive"),
        CommandGroupCli::Export(_) => CommandInfo::new(CommandGroup::Export, "export"),
    }
}

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    let info = command_info(group);
    match group {
        CommandGroupCli::Check(args) => {
            let request = check_request_from_args(args);
            core_call(info, core_api::check_specifier(&request))
        }
        CommandGroupCli::Refs(args) => {
            let request = refs_request_from_args(args);
            core_call(info, core_api::list_refs(ctx, &request))
        }
        CommandGroupCli::Resolve(args) => {
            let request = resolve_request_from_args(args);
            core_call(info, core_api::resolve_specifier(ctx, &request))
        }
        CommandGroupCli::Archive(args) => {
            let request = archive_request_from_args(args);
            core_call(info, core_api::archive_specifier(ctx, &request))
        }
        CommandGroupCli::Export(args) => {
            let request = export_request_from_args(args);
            core_call(info, core_api::export_specifier(ctx, &request))
        }
    }
}

fn core_call(
    info: CommandInfo,
    result: anyhow::Result<ExecutionOutcome>,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    match result {
        Ok(outcome) => Ok((info, outcome)),
        Err(err) => Err(eyre!("{err:?}")),
    }
}

fn check_request_from_args(args: &CheckArgs) -> CheckRequest {
    CheckRequest {
        specifier: args.specifier.clone(),
    }
}

fn refs_request_from_args(args: &RefsArgs) -> RefsRequest {
    RefsRequest {
        specifier: args.specifier.clone(),
    }
}

fn resolve_request_from_args(args: &ResolveArgs) -> ResolveRequest {
    ResolveRequest {
        specifier: args.specifier.clone(),
        version: args.version.clone(),
        lockfile: args.lockfile.clone(),
    }
}

fn archive_request_from_args(args: &ArchiveArgs) -> ArchiveRequest {
    ArchiveRequest {
        specifier: args.specifier.clone(),
        version: args.version.clone(),
        dest: args.dest.clone(),
    }
}

fn export_request_from_args(args: &ExportArgs) -> ExportRequest {
    ExportRequest {
        specifier: args.specifier.clone(),
        version: args.version.clone(),
        dest: args.dest.clone(),
    }
}
