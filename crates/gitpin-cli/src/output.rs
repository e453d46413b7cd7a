use color_eyre::Result;
use gitpin_core::api::{to_json_response, CommandGroup, CommandInfo, CommandStatus, ExecutionOutcome};
use serde_json::Value;

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = match outcome.status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    };

    if opts.json {
        let payload = to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    let style = Style::new(opts.no_color);
    if matches!(outcome.status, CommandStatus::Ok) {
        if !opts.quiet {
            println!("{}", outcome.message);
            render_detail_lines(&style, info, &outcome.details);
        }
        return Ok(code);
    }

    let line = format!("gitpin {}: {}", info.name, outcome.message);
    eprintln!("{}", style.error(&line));
    if let Some(hint) = outcome.details.get("hint").and_then(Value::as_str) {
        eprintln!("  hint: {hint}");
    }
    Ok(code)
}

fn render_detail_lines(style: &Style, info: CommandInfo, details: &Value) {
    match info.group {
        CommandGroup::Refs => {
            if let Some(refs) = details.get("refs").and_then(Value::as_object) {
                for (name, sha) in refs {
                    let sha = sha.as_str().unwrap_or("");
                    println!("{}  {}", style.dim(sha), name);
                }
            }
        }
        CommandGroup::Resolve => {
            if let Some(resolved) = details.get("resolved").and_then(Value::as_str) {
                println!("{}", style.dim(resolved));
            }
        }
        CommandGroup::Archive => {
            if let Some(digest) = details.get("digest").and_then(Value::as_str) {
                println!("{}", style.dim(&format!("sha256:{digest}")));
            }
        }
        CommandGroup::Check | CommandGroup::Export => {}
    }
}
