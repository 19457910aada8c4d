use anyhow::{bail, Context, Result};
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use crate::presets::{self, LessonDurationPreset};

const SETTINGS_KEY: &str = "settings";
const LESSON_DURATIONS_KEY: &str = "lessonDurations";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// How many minutes before expiry the warning phase begins.
    pub warning_minutes: u32,
    /// `media://` URL of the video shown with the warning, if any.
    pub warning_video_path: Option<String>,
    /// `media://` URL of the video shown on the finish screen, if any.
    pub finish_video_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warning_minutes: 5,
            warning_video_path: None,
            finish_video_path: None,
        }
    }
}

/// Key-value store backing both persisted blobs (`settings`,
/// `lessonDurations`), held in one JSON file in the app data directory.
///
/// The file is read once at startup and rewritten wholesale on every save.
/// A missing file, unreadable file, or corrupt value is treated as absent
/// and replaced by defaults; corruption never aborts startup.
#[derive(Clone)]
pub struct SettingsStore {
    path: PathBuf,
    data: Arc<RwLock<serde_json::Map<String, Value>>>,
}

impl SettingsStore {
    pub fn load(path: PathBuf) -> Self {
        let data = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(
                        "store file {} is not a JSON object; starting from defaults",
                        path.display()
                    );
                    serde_json::Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => serde_json::Map::new(),
            Err(err) => {
                warn!(
                    "failed to read store file {}: {err}; starting from defaults",
                    path.display()
                );
                serde_json::Map::new()
            }
        };

        Self {
            path,
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn settings(&self) -> Settings {
        self.get(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        if settings.warning_minutes == 0 {
            bail!("warningMinutes must be a positive integer");
        }
        self.set(SETTINGS_KEY, &settings)
    }

    pub fn lesson_durations(&self) -> Vec<LessonDurationPreset> {
        self.get(LESSON_DURATIONS_KEY)
            .unwrap_or_else(presets::default_lesson_durations)
    }

    /// Validates and persists a full replacement preset list. Returns the
    /// stored list, with ids assigned to any new rows.
    pub fn update_lesson_durations(
        &self,
        durations: Vec<LessonDurationPreset>,
    ) -> Result<Vec<LessonDurationPreset>> {
        let durations = presets::normalize(durations)?;
        self.set(LESSON_DURATIONS_KEY, &durations)?;
        Ok(durations)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let guard = self.data.read().unwrap();
        let value = guard.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("stored value for {key} is corrupt: {err}; using defaults");
                None
            }
        }
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.insert(key.to_string(), serde_json::to_value(value)?);
        self.persist(&guard)
    }

    fn persist(&self, data: &serde_json::Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write store to {}", self.path.display()))
    }
}
