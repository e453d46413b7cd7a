#![deny(clippy::all, warnings)]

use std::env;

use clap::Parser;
use color_eyre::Result;
use gitpin_core::api::{outcome_from_error, CommandContext, GlobalOptions};

mod cli;
mod dispatch;
mod output;
mod style;

pub(crate) use crate::cli::*;

use dispatch::{command_info, dispatch_command};
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = GitpinCli::parse();
    let trace = cli.trace || cli.debug;
    init_tracing(trace, cli.verbose);
    if cli.debug {
        env::set_var("GITPIN_DEBUG", "1");
        if env::var_os("RUST_BACKTRACE").is_none() {
            env::set_var("RUST_BACKTRACE", "1");
        }
    }
    apply_env_overrides(&cli);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace,
        debug: cli.debug,
        json: cli.json,
    };

    // Context construction can fail on realistic environments (no cache
    // directory); those failures still render through the envelope.
    let (info, outcome) = match CommandContext::new(&global) {
        Ok(ctx) => dispatch_command(&ctx, &cli.command)?,
        Err(err) => (command_info(&cli.command), outcome_from_error(err)),
    };
    let output_opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };
    let code = emit_output(&output_opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("gitpin={level},gitpin_cli={level},gitpin_core={level},gitpin_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn apply_env_overrides(cli: &GitpinCli) {
    if cli.offline {
        env::set_var("GITPIN_ONLINE", "0");
    } else if cli.online {
        env::set_var("GITPIN_ONLINE", "1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_version_and_lockfile_flags() {
        let cli = GitpinCli::try_parse_from([
            "gitpin",
            "resolve",
            "user/repo",
            "--version",
            "^1.0",
            "--lockfile",
            "gitpin.lock.json",
        ])
        .expect("parse resolve args");

        match cli.command {
            CommandGroupCli::Resolve(args) => {
                assert_eq!(args.specifier, "user/repo");
                assert_eq!(args.version.as_deref(), Some("^1.0"));
                assert!(args.lockfile.is_some());
            }
            other => panic!("expected resolve command, got {other:?}"),
        }
    }

    #[test]
    fn offline_and_online_conflict() {
        let err = GitpinCli::try_parse_from(["gitpin", "--offline", "--online", "check", "a/b"]);
        assert!(err.is_err());
    }

    #[test]
    fn archive_requires_dest() {
        let err = GitpinCli::try_parse_from(["gitpin", "archive", "user/repo"]);
        assert!(err.is_err());
    }
}
