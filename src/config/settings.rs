use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::paths;
use crate::sieve::error::Result;
use crate::sieve::registry::builtin_ids;

/// Name to implementation-identifier maps, one per registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub commands: BTreeMap<String, String>,
    pub tests: BTreeMap<String, String>,
    pub comparators: BTreeMap<String, String>,
}

impl RegistryConfig {
    /// No names at all, for hosts that register everything themselves.
    pub fn empty() -> Self {
        Self {
            commands: BTreeMap::new(),
            tests: BTreeMap::new(),
            comparators: BTreeMap::new(),
        }
    }
}

impl Default for RegistryConfig {
    /// Every shipped implementation under its own name.
    fn default() -> Self {
        let identity = |ids: Vec<&str>| -> BTreeMap<String, String> {
            ids.into_iter()
                .map(|id| (id.to_string(), id.to_string()))
                .collect()
        };
        let (commands, tests, comparators) = builtin_ids();
        Self {
            commands: identity(commands),
            tests: identity(tests),
            comparators: identity(comparators),
        }
    }
}

fn default_inbox() -> String {
    "INBOX".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Upper bound on commands and tests run per message.
    #[serde(default)]
    pub max_steps: Option<u64>,
    /// Folder `keep` delivers to.
    #[serde(default = "default_inbox")]
    pub inbox: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            max_steps: None,
            inbox: default_inbox(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// An explicit file must exist; the per-user file is used only if it
    /// does; otherwise the built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match paths::config_file() {
            Some(path) if path.is_file() => {
                tracing::debug!(context = "config", path = %path.display(), "loading configuration");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}
