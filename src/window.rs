//! Window-geometry coordination: every timer phase transition and the
//! user's display-density toggle map to a resize/position request against
//! the primary monitor's work area, plus a full-screen on/off request.
//!
//! All requests are fire-and-forget. A failed request leaves the window
//! visually wrong at worst; it never disturbs the countdown, so errors are
//! logged and swallowed.

use anyhow::{anyhow, Result};
use log::warn;
use serde::Deserialize;
use tauri::{AppHandle, LogicalSize, Manager, PhysicalPosition, State};

use crate::AppState;

pub const MAIN_WINDOW: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    BottomRight,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLayout {
    /// Duration picker and settings, the launch layout.
    Home,
    /// Digital countdown only, tucked into the corner of the screen.
    CompactTimer,
    /// Countdown plus the analog clock face.
    AnalogTimer,
}

impl WindowLayout {
    /// Logical size of the layout.
    pub fn size(self) -> (u32, u32) {
        match self {
            WindowLayout::Home => (900, 670),
            WindowLayout::CompactTimer => (400, 145),
            WindowLayout::AnalogTimer => (520, 240),
        }
    }

    pub fn anchor(self) -> Anchor {
        match self {
            WindowLayout::Home => Anchor::Center,
            WindowLayout::CompactTimer | WindowLayout::AnalogTimer => Anchor::BottomRight,
        }
    }
}

/// The user's "toggle display density" gesture while the timer runs.
/// Purely a geometry request; the timer phase never changes with it.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DisplayDensity {
    Digital,
    Analog,
}

impl DisplayDensity {
    pub fn layout(self) -> WindowLayout {
        match self {
            DisplayDensity::Digital => WindowLayout::CompactTimer,
            DisplayDensity::Analog => WindowLayout::AnalogTimer,
        }
    }
}

/// Usable area of the primary display, excluding system chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkArea {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Top-left position for a window of the given physical size inside the
/// work area. A window larger than the work area may land at negative
/// coordinates; that mirrors how the desktop itself handles oversized
/// windows.
pub fn anchored_position(area: WorkArea, width: u32, height: u32, anchor: Anchor) -> (i32, i32) {
    match anchor {
        Anchor::BottomRight => (
            area.x + area.width as i32 - width as i32,
            area.y + area.height as i32 - height as i32,
        ),
        Anchor::Center => (
            area.x + (area.width as i32 - width as i32) / 2,
            area.y + (area.height as i32 - height as i32) / 2,
        ),
    }
}

#[derive(Clone)]
pub struct WindowCoordinator {
    app_handle: AppHandle,
}

impl WindowCoordinator {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }

    /// Leaves full-screen, resizes to the layout, and positions the window
    /// against the primary monitor's work area.
    pub fn apply(&self, layout: WindowLayout) {
        if let Err(err) = self.try_apply(layout) {
            warn!("window layout request failed: {err}");
        }
    }

    pub fn set_fullscreen(&self, enabled: bool) {
        let Some(window) = self.app_handle.get_webview_window(MAIN_WINDOW) else {
            warn!("full-screen request dropped: window \"{MAIN_WINDOW}\" not found");
            return;
        };
        if let Err(err) = window.set_fullscreen(enabled) {
            warn!("full-screen request failed: {err}");
        }
    }

    fn try_apply(&self, layout: WindowLayout) -> Result<()> {
        let window = self
            .app_handle
            .get_webview_window(MAIN_WINDOW)
            .ok_or_else(|| anyhow!("window \"{MAIN_WINDOW}\" not found"))?;

        // Resizing while full-screen is a no-op on some platforms, so the
        // full-screen flag is always dropped first.
        window.set_fullscreen(false)?;

        let (width, height) = layout.size();
        window.set_size(LogicalSize::new(width, height))?;

        let monitor = window
            .primary_monitor()?
            .ok_or_else(|| anyhow!("no primary monitor"))?;
        let area = monitor.work_area();
        let work_area = WorkArea {
            x: area.position.x,
            y: area.position.y,
            width: area.size.width,
            height: area.size.height,
        };

        let scale = monitor.scale_factor();
        let physical_width = (f64::from(width) * scale).round() as u32;
        let physical_height = (f64::from(height) * scale).round() as u32;
        let (x, y) = anchored_position(work_area, physical_width, physical_height, layout.anchor());
        window.set_position(PhysicalPosition::new(x, y))?;
        Ok(())
    }
}

#[tauri::command]
pub fn set_timer_layout(state: State<AppState>, density: DisplayDensity) -> Result<(), String> {
    state.window.apply(density.layout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: WorkArea = WorkArea {
        x: 0,
        y: 0,
        width: 1920,
        height: 1040,
    };

    #[test]
    fn bottom_right_hugs_the_work_area_corner() {
        assert_eq!(
            anchored_position(AREA, 400, 145, Anchor::BottomRight),
            (1520, 895)
        );
    }

    #[test]
    fn center_splits_the_leftover_space() {
        assert_eq!(
            anchored_position(AREA, 900, 670, Anchor::Center),
            (510, 185)
        );
    }

    #[test]
    fn work_area_offset_shifts_both_anchors() {
        let area = WorkArea {
            x: 50,
            y: 30,
            width: 1280,
            height: 720,
        };
        assert_eq!(
            anchored_position(area, 400, 145, Anchor::BottomRight),
            (50 + 1280 - 400, 30 + 720 - 145)
        );
        assert_eq!(
            anchored_position(area, 400, 145, Anchor::Center),
            (50 + (1280 - 400) / 2, 30 + (720 - 145) / 2)
        );
    }

    #[test]
    fn oversized_window_may_go_negative() {
        let area = WorkArea {
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        };
        assert_eq!(
            anchored_position(area, 900, 670, Anchor::Center),
            (-50, -35)
        );
    }

    #[test]
    fn layouts_carry_their_anchor() {
        assert_eq!(WindowLayout::Home.anchor(), Anchor::Center);
        assert_eq!(WindowLayout::CompactTimer.anchor(), Anchor::BottomRight);
        assert_eq!(WindowLayout::AnalogTimer.anchor(), Anchor::BottomRight);
    }

    #[test]
    fn density_toggle_maps_to_the_running_layouts() {
        assert_eq!(DisplayDensity::Digital.layout(), WindowLayout::CompactTimer);
        assert_eq!(DisplayDensity::Analog.layout(), WindowLayout::AnalogTimer);
    }
}
