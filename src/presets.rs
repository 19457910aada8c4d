//! Lesson-duration presets: the buttons the user picks a countdown from.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A user-editable lesson duration shown on the start screen.
///
/// `id` is opaque and stays stable across edits so the settings UI can
/// address rows while the user reorders or renames them. `color` is purely
/// presentational and never feeds into timer logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonDurationPreset {
    pub id: String,
    pub label: String,
    pub minutes: f64,
    pub color: PresetColor,
}

/// Either one of the named palette entries or a direct color value
/// (e.g. `"#2196f3"`) passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PresetColor {
    Palette(PaletteColor),
    Custom(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
    Blue,
    Green,
    Orange,
    Red,
}

/// The preset list a fresh install starts with.
pub fn default_lesson_durations() -> Vec<LessonDurationPreset> {
    vec![
        preset("duration-1", "1 lesson (50 min)", 50.0, PaletteColor::Blue),
        preset("duration-2", "2 lessons (100 min)", 100.0, PaletteColor::Green),
        preset("duration-3", "3 lessons (150 min)", 150.0, PaletteColor::Orange),
        preset("duration-4", "4 lessons (200 min)", 200.0, PaletteColor::Red),
    ]
}

fn preset(id: &str, label: &str, minutes: f64, color: PaletteColor) -> LessonDurationPreset {
    LessonDurationPreset {
        id: id.to_string(),
        label: label.to_string(),
        minutes,
        color: PresetColor::Palette(color),
    }
}

/// Validates a preset list before it replaces the stored one.
///
/// Rows arriving from the settings UI without an id (newly added) get a
/// fresh uuid assigned; existing ids are kept verbatim. List order is
/// preserved.
pub fn normalize(mut durations: Vec<LessonDurationPreset>) -> Result<Vec<LessonDurationPreset>> {
    let mut seen = HashSet::new();
    for duration in &mut durations {
        if duration.id.trim().is_empty() {
            duration.id = Uuid::new_v4().to_string();
        }
        if !duration.minutes.is_finite() || duration.minutes <= 0.0 {
            bail!("preset \"{}\" must have a positive duration", duration.label);
        }
        if !seen.insert(duration.id.clone()) {
            bail!("duplicate preset id: {}", duration.id);
        }
    }
    Ok(durations)
}
