use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::codec::default_data_dir;
use crate::models::PageLayout;

const APP_NAME: &str = "spatial-tags";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_PORT: u16 = 17020;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the record files. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Anchor database path. Defaults to `anchors.db` inside `data_dir`.
    pub anchor_db: Option<PathBuf>,
    /// Characters shown per annotation page.
    pub chars_per_page: usize,
    /// Distance in metres in front of the camera at which entities spawn.
    pub spawn_distance: f32,
    /// Port for the local command API.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            anchor_db: None,
            chars_per_page: PageLayout::default().chars_per_page(),
            spawn_distance: 2.0,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory.
    /// Returns default config if file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let mut config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("SPATIAL_TAGS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(port) = std::env::var("SPATIAL_TAGS_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.port = port;
        }
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn resolved_anchor_db(&self) -> Result<PathBuf> {
        match &self.anchor_db {
            Some(path) => Ok(path.clone()),
            None => Ok(self.resolved_data_dir()?.join("anchors.db")),
        }
    }

    pub fn page_layout(&self) -> PageLayout {
        PageLayout::new(self.chars_per_page)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
