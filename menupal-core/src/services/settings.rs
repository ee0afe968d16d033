use std::{
    fs, io,
    path::PathBuf,
};

use crate::model::settings::UserSettings;
use crate::services::atomic::write_atomic;

/// User preferences as one flat JSON blob.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> UserSettings {
        let data = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return UserSettings::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read settings");
                return UserSettings::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to parse settings");
                UserSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &UserSettings) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(settings).map_err(io::Error::other)?;
        write_atomic(&self.path, &json)
    }
}
