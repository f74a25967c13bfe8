/// Engine configuration
///
/// Priority: CLI flags > TABLESCOPE_* environment > config file > defaults.
/// Nested keys use a double underscore in the environment, for example
/// `TABLESCOPE_STATS__MAX_CELLS=500000`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_EXPORT_SAMPLE_SIZE;
use crate::browse::{DisplayOptions, PreviewOptions};
use crate::core::EngineError;
use crate::stats::StatsBudget;
use crate::storage::PAGE_SIZE;

pub const ENV_PREFIX: &str = "TABLESCOPE";
const CONFIG_DIR: &str = "tablescope";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "./tablescope.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Rows serialized to estimate a full export's size
    pub sample_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_EXPORT_SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Page size in bytes for paged tables
    pub page_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { page_size: PAGE_SIZE }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stats: StatsBudget,
    pub preview: PreviewOptions,
    pub display: DisplayOptions,
    pub export: ExportConfig,
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Load from `path`, or from the first default location that exists,
    /// then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        Self::load_from(path, None)
    }

    /// Like `load`, with an explicit environment instead of the process one.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, EngineError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
            log::info!("Loaded config from: {}", path.display());
        } else if let Some(path) = default_paths().into_iter().find(|p| p.exists()) {
            builder = builder.add_source(File::from(path.as_path()));
            log::info!("Loaded config from: {}", path.display());
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Preview options carrying this config's display limits and budget.
    #[must_use]
    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            display: self.display,
            budget: self.stats,
            ..self.preview.clone()
        }
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR).join(CONFIG_FILE));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG_FILE));
    paths
}
