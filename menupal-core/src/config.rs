use std::path::PathBuf;

use crate::services::upstream::UpstreamConfig;

pub const DEFAULT_ENDPOINT: &str = "https://us-central1-menupal-446313.cloudfunctions.net/latest";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `MENUPAL_DATA_DIR`, else `%LOCALAPPDATA%/MenuPal`, else `./MenuPal`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = if let Some(dir) = non_empty("MENUPAL_DATA_DIR") {
            PathBuf::from(dir)
        } else if let Some(local) = non_empty("LOCALAPPDATA") {
            PathBuf::from(local).join("MenuPal")
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("MenuPal")
        };

        Self {
            data_dir,
            endpoint: non_empty("MENUPAL_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout_secs: non_empty("MENUPAL_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_retries: non_empty("MENUPAL_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
        }
    }

    /// Root of the record store (holds `translations/` and the index).
    pub fn records_root(&self) -> PathBuf {
        self.data_dir.clone()
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("menu_images")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }
}
