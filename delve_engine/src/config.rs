//! Engine configuration.
//!
//! Settings are read from `delve.toml`. A missing or malformed file is not fatal: the engine logs a
//! warning and runs with the built-in defaults, a two-member party in the sample dungeon.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::data_paths::data_path;

/// One party member to build at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    pub name: String,
    pub class: String,
    pub race: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RON content file.
    pub content_path: PathBuf,
    pub save_dir: PathBuf,
    /// Where session event logs are written.
    pub log_dir: PathBuf,
    /// Fixed RNG seed for replayable runs.
    pub seed: Option<u64>,
    /// Dungeon to start in; the first dungeon in the content when unset.
    pub dungeon: Option<String>,
    pub party: Vec<PartyMember>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_path: data_path("content.ron"),
            save_dir: default_save_dir(),
            log_dir: PathBuf::from("logs"),
            seed: None,
            dungeon: None,
            party: vec![
                PartyMember {
                    name: "Brannoc".into(),
                    class: "fighter".into(),
                    race: "dwarf".into(),
                },
                PartyMember {
                    name: "Ilsa".into(),
                    class: "wizard".into(),
                    race: "human".into(),
                },
            ],
        }
    }
}

fn default_save_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::data_local_dir)
        .map_or_else(|| PathBuf::from("saved_games"), |dir| dir.join("delve").join("saved_games"))
}

impl EngineConfig {
    /// Parse a config from TOML text. Unset fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this shape.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing engine config TOML")
    }
}

/// Load the config at `path`, falling back to defaults on any error.
pub fn load_config(path: &Path) -> EngineConfig {
    match try_load_config(path) {
        Ok(config) => {
            info!("engine config loaded from '{}'", path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load engine config from '{}': {e:#}. Using defaults.",
                path.display()
            );
            EngineConfig::default()
        },
    }
}

fn try_load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading engine config from '{}'", path.display()))?;
    EngineConfig::from_toml(&text).with_context(|| format!("in '{}'", path.display()))
}
