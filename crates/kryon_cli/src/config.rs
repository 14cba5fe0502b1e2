//! Project configuration: `kryon.toml` next to the document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Workspace configuration for a Kryon project.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KryonConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Application window settings; override whatever the document carries.
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> f32 {
    800.0
}

fn default_height() -> f32 {
    600.0
}

/// Build output settings.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub output: Option<String>,
}

impl KryonConfig {
    /// Load `kryon.toml` from a directory, falling back to defaults when
    /// the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("kryon.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
