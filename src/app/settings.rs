//! Settings menu model (data only).
//!
//! Each entry reads and writes one preference through its typed setter,
//! applies the change to the live view, then persists the config.

use super::state::{ActiveView, AppState};
use crate::config::Preferences;

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }
}

/// Next entry after `current` in `steps`, wrapping.  Unknown values restart
/// from the first step.
fn next_step<T: PartialEq + Copy>(steps: &[T], current: T) -> T {
    match steps.iter().position(|s| *s == current) {
        Some(i) => steps[(i + 1) % steps.len()],
        None => steps[0],
    }
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Toggle {
        label: "Smooth Scroll",
        get: |s| s.config.prefs.smooth_scroll(),
        set: |s, v| {
            s.config.prefs.set_smooth_scroll(v);
            s.apply_scroll_prefs();
            s.save_config();
        },
    },
    SettingsItem::Toggle {
        label: "Show Outline",
        get: |s| s.config.prefs.outline_visible(),
        set: |s, v| {
            s.config.prefs.set_outline_visible(v);
            s.save_config();
            // Layout and observer catch up on the next frame.
        },
    },
    SettingsItem::Cycle {
        label: "Scroll Speed",
        value: |s| format!("{:.2}", s.config.prefs.scroll_speed()),
        cycle: |s| {
            const SPEEDS: &[f64] = &[0.2, 0.35, 0.5, 0.7];
            let next = next_step(SPEEDS, s.config.prefs.scroll_speed());
            s.config.prefs.set_scroll_speed(next);
            s.apply_scroll_prefs();
            s.save_config();
        },
    },
    SettingsItem::Cycle {
        label: "Outline Width",
        value: |s| format!("{}%", s.config.prefs.outline_width_pct()),
        cycle: |s| {
            const WIDTHS: &[u16] = &[20, 28, 35, 45];
            let next = next_step(WIDTHS, s.config.prefs.outline_width_pct());
            s.config.prefs.set_outline_width_pct(next);
            s.save_config();
        },
    },
    SettingsItem::Cycle {
        label: "Header Height",
        value: |s| format!("{} rows", s.header_rows()),
        cycle: |s| {
            let (lo, hi) = Preferences::HEADER_ROWS_RANGE;
            let next = if s.header_rows() >= hi { lo } else { s.header_rows() + 1 };
            s.config.prefs.set_header_rows(next);
            s.apply_header_rows(s.config.prefs.header_rows());
            s.save_config();
        },
    },
    SettingsItem::Cycle {
        label: "Wheel Step",
        value: |s| format!("{} rows", s.config.prefs.wheel_rows()),
        cycle: |s| {
            const STEPS: &[u16] = &[1, 3, 5, 10];
            let next = next_step(STEPS, s.config.prefs.wheel_rows());
            s.config.prefs.set_wheel_rows(next);
            s.save_config();
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::tests::sample_state;

    fn item(label: &str) -> &'static SettingsItem {
        SETTINGS_ITEMS
            .iter()
            .find(|i| i.label() == label)
            .unwrap()
    }

    #[test]
    fn next_step_wraps_and_recovers() {
        assert_eq!(next_step(&[1, 3, 5], 5), 1);
        assert_eq!(next_step(&[1, 3, 5], 4), 1);
        assert_eq!(next_step(&[1, 3, 5], 1), 3);
    }

    #[test]
    fn header_height_moves_reference_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = sample_state(dir.path());
        let SettingsItem::Cycle { cycle, value, .. } = item("Header Height") else {
            panic!("not a cycle item");
        };
        assert_eq!(value(&state), "2 rows");
        cycle(&mut state);
        assert_eq!(state.header_rows(), 3);
        assert_eq!(state.observer.offset(), 3);
        assert!(dir.path().join("config.toml").exists());
        state.shutdown();
    }

    #[test]
    fn toggles_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = sample_state(dir.path());
        let SettingsItem::Toggle { get, set, .. } = item("Smooth Scroll") else {
            panic!("not a toggle");
        };
        let before = get(&state);
        set(&mut state, !before);
        let saved = crate::config::AppConfig::load(&state.store);
        assert_eq!(saved.prefs.smooth_scroll(), !before);
        state.shutdown();
    }
}
