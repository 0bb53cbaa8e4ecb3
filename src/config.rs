use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::criteria::{DEFAULT_DATE_FILTER_NUM_DAYS, DEFAULT_ROWS_PER_PAGE};
use crate::search::ServerConfig;

/// Settings injected into the study list at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudyListConfig {
    /// Shows the cloud DICOM store picker and uploader.
    pub enable_google_cloud_adapter: bool,
    pub rows_per_page: u32,
    pub date_filter_num_days: u64,
    pub server: Option<ServerConfig>,
}

impl Default for StudyListConfig {
    fn default() -> Self {
        Self {
            enable_google_cloud_adapter: false,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            date_filter_num_days: DEFAULT_DATE_FILTER_NUM_DAYS,
            server: None,
        }
    }
}

pub fn settings_file_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        return env::var_os("APPDATA")
            .map(PathBuf::from)
            .map(|base| base.join("studylist").join("settings.toml"));
    }

    #[cfg(target_os = "macos")]
    {
        return env::var_os("HOME").map(PathBuf::from).map(|home| {
            home.join("Library")
                .join("Application Support")
                .join("studylist")
                .join("settings.toml")
        });
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("studylist").join("settings.toml"));
        }
        env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("studylist").join("settings.toml"))
    }
}

pub fn parse_config(text: &str) -> Result<StudyListConfig> {
    let config: StudyListConfig = toml::from_str(text).context("Invalid study list settings")?;
    if config.rows_per_page == 0 {
        anyhow::bail!("rows_per_page must be greater than zero");
    }
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<StudyListConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read settings file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("Could not load settings from {}", path.display()))
}

/// A missing file yields the defaults silently; a broken one is logged and ignored.
pub fn load_config_or_default(path: Option<&Path>) -> StudyListConfig {
    let Some(path) = path else {
        return StudyListConfig::default();
    };
    if !path.exists() {
        log::debug!("No settings file at {}", path.display());
        return StudyListConfig::default();
    }

    match load_config(path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err:#}; using default settings");
            StudyListConfig::default()
        }
    }
}
