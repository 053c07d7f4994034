//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/dapper/config.json`.
//! It names a launcher (an external chooser such as `dmenu`) and a table of
//! apps, each with its launch commands and the window classes that identify
//! its windows.
//!
//! # Example
//!
//! ```json
//! {
//!   "launcher": "dmenu",
//!   "apps": {
//!     "term": { "commands": ["xterm"], "classes": ["XTerm"] },
//!     "web": {
//!       "commands": ["firefox", "chromium"],
//!       "classes": ["firefox", "Chromium"]
//!     }
//!   }
//! }
//! ```
//!
//! The order of the `apps` table matters: when two apps claim the same
//! window class, the one listed first owns it.

use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// One configured application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSpec {
    pub name: String,
    /// Launch commands, in configured order.
    pub commands: Vec<String>,
    /// Window classes identifying this app's windows.
    pub classes: Vec<String>,
}

/// Body of an entry in the `apps` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AppBody {
    commands: Vec<String>,
    classes: Vec<String>,
}

/// The `apps` table, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppTable(Vec<AppSpec>);

impl<'de> Deserialize<'de> for AppTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = AppTable;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "object mapping app names to {{commands, classes}}")
            }
            fn visit_map<A>(self, mut map: A) -> Result<AppTable, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut apps: Vec<AppSpec> = Vec::new();
                while let Some(name) = map.next_key::<String>()? {
                    let body: AppBody = map.next_value()?;
                    if name.is_empty() {
                        return Err(DeError::custom("app name must not be empty"));
                    }
                    if name.contains(' ') {
                        return Err(DeError::custom(format!(
                            "app name {:?} must not contain spaces",
                            name
                        )));
                    }
                    // First occurrence of a duplicated key wins.
                    if apps.iter().any(|a| a.name == name) {
                        continue;
                    }
                    apps.push(AppSpec {
                        name,
                        commands: body.commands,
                        classes: body.classes,
                    });
                }
                Ok(AppTable(apps))
            }
        }
        deserializer.deserialize_map(V)
    }
}

/// Top-level configuration as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Command whose stdin receives the candidate commands of a
    /// multi-command app and whose first output line is launched.
    pub launcher: String,

    #[serde(default)]
    pub apps: AppTable,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build the immutable app registry.
    pub fn registry(self) -> Registry {
        Registry::new(self.launcher, self.apps.0)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

/// Read-only set of configured apps plus the launcher command.
#[derive(Debug, Clone)]
pub struct Registry {
    launcher: String,
    apps: Vec<AppSpec>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry.  Apps keep the given order; a repeated name keeps
    /// its first definition.
    pub fn new(launcher: impl Into<String>, apps: impl IntoIterator<Item = AppSpec>) -> Self {
        let mut kept = Vec::new();
        let mut by_name = HashMap::new();
        for app in apps {
            if by_name.contains_key(&app.name) {
                continue;
            }
            by_name.insert(app.name.clone(), kept.len());
            kept.push(app);
        }
        Self {
            launcher: launcher.into(),
            apps: kept,
            by_name,
        }
    }

    pub fn launcher(&self) -> &str {
        &self.launcher
    }

    pub fn get(&self, name: &str) -> Option<&AppSpec> {
        self.by_name.get(name).map(|&i| &self.apps[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Apps in registration order.
    pub fn apps(&self) -> impl Iterator<Item = &AppSpec> {
        self.apps.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
