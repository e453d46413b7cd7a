pub(crate) mod context;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::tooling::outcome::ResolveUserError;

/// Options shared by every command invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub debug: bool,
    pub json: bool,
}

/// Immutable snapshot of the process environment, taken once per command.
#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CacheConfig {
    /// Root for checkouts and locks; content-addressed per remote.
    pub(crate) root: PathBuf,
}

#[derive(Debug, Clone)]
pub(crate) struct NetworkConfig {
    pub(crate) online: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RegistryConfig {
    /// Manifest filenames probed in order; the first is the preferred
    /// registry's.
    pub(crate) manifests: Vec<(String, String)>,
}

/// Resolver configuration derived from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) cache: CacheConfig,
    pub(crate) network: NetworkConfig,
    pub(crate) registry: RegistryConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    pub fn from_env() -> Result<Self> {
        let snapshot = EnvSnapshot::capture();
        Self::from_snapshot(&snapshot)
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self> {
        let root = match snapshot.var("GITPIN_CACHE_PATH") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => dirs_next::cache_dir()
                .map(|dir| dir.join("gitpin"))
                .ok_or_else(|| -> anyhow::Error {
                    ResolveUserError::new(
                        "no cache directory available; set GITPIN_CACHE_PATH explicitly",
                        json!({
                            "code": "GP700",
                            "reason": "no_cache_directory",
                            "hint": "Set GITPIN_CACHE_PATH to a writable directory.",
                        }),
                    )
                    .into()
                })?,
        };

        let online = match snapshot.var("GITPIN_ONLINE") {
            Some(value) => {
                let lowered = value.to_ascii_lowercase();
                !matches!(lowered.as_str(), "0" | "false" | "no" | "off" | "")
            }
            None => true,
        };

        Ok(Self {
            cache: CacheConfig { root },
            network: NetworkConfig { online },
            registry: RegistryConfig {
                manifests: vec![
                    ("npm".to_string(), "package.json".to_string()),
                    ("bower".to_string(), "bower.json".to_string()),
                ],
            },
        })
    }

    pub fn cache_root(&self) -> &PathBuf {
        &self.cache.root
    }

    pub fn online(&self) -> bool {
        self.network.online
    }

    /// `(registry name, manifest filename)` pairs in probe order.
    pub fn registry_manifests(&self) -> &[(String, String)] {
        &self.registry.manifests
    }
}
