use anyhow::Result;

use crate::core::config::{Config, EnvSnapshot, GlobalOptions};
use crate::core::tooling::outcome::CommandGroup;

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

/// Per-invocation context handed to every core entry point.
pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    pub fn new(global: &'a GlobalOptions) -> Result<Self> {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env)?;
        Ok(Self { global, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn testing(global: &'a GlobalOptions, config: Config) -> Self {
        Self { global, config }
    }
}
