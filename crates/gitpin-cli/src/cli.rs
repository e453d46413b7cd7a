use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const GITPIN_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const GITPIN_BEFORE_HELP: &str = concat!(
    "gitpin ",
    env!("CARGO_PKG_VERSION"),
    " – Git dependency resolver\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  check            Classify a specifier and print its canonical remote.\n",
    "  refs             List tags and branches advertised by the remote.\n",
    "  resolve          Pin a specifier to a commit and fetch its manifest.\n",
    "  archive          Write the snapshot tarball and print its digest.\n",
    "  export           Materialize a read-only snapshot tree.\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = GITPIN_BEFORE_HELP,
    help_template = GITPIN_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct GitpinCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(long, help = "Enable debug output and full backtraces", global = true)]
    pub debug: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        help = "Run offline for this invocation (sets GITPIN_ONLINE=0)",
        conflicts_with = "online",
        global = true
    )]
    pub offline: bool,
    #[arg(
        long,
        help = "Force online even if GITPIN_ONLINE=0",
        conflicts_with = "offline",
        global = true
    )]
    pub online: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Classify a specifier and print its canonical remote.",
        override_usage = "gitpin check <SPECIFIER>"
    )]
    Check(CheckArgs),
    #[command(
        about = "List tags and branches advertised by the remote.",
        override_usage = "gitpin refs <SPECIFIER>"
    )]
    Refs(RefsArgs),
    #[command(
        about = "Resolve a specifier to a pinned commit and its manifest.",
        override_usage = "gitpin resolve <SPECIFIER> [--version TOKEN]"
    )]
    Resolve(ResolveArgs),
    #[command(
        about = "Write the snapshot tarball for a specifier.",
        override_usage = "gitpin archive <SPECIFIER> --dest FILE"
    )]
    Archive(ArchiveArgs),
    #[command(
        about = "Materialize a read-only snapshot tree for a specifier.",
        override_usage = "gitpin export <SPECIFIER> --dest DIR"
    )]
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,
}

#[derive(Args, Debug)]
pub struct RefsArgs {
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,
    #[arg(
        long,
        value_name = "TOKEN",
        help = "Version token (tag, branch, commit, semver range); overrides the #fragment"
    )]
    pub version: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Lock snapshot consulted for idempotent replay"
    )]
    pub lockfile: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,
    #[arg(long, value_name = "TOKEN", help = "Version token; overrides the #fragment")]
    pub version: Option<String>,
    #[arg(long, value_name = "FILE", help = "Tarball destination path")]
    pub dest: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,
    #[arg(long, value_name = "TOKEN", help = "Version token; overrides the #fragment")]
    pub version: Option<String>,
    #[arg(long, value_name = "DIR", help = "Snapshot tree destination directory")]
    pub dest: PathBuf,
}
