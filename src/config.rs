//! User configuration: key bindings, viewing preferences, and persistence.
//!
//! Everything is stored as a simple `key = value` text file at
//! `$XDG_CONFIG_HOME/brief-view/config.toml` (default
//! `~/.config/brief-view/config.toml`).  The location is carried by a
//! [`ConfigStore`] owned by the app state, so tests point it at a temp dir.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ───────────────────────────────────────── actions ───────────

/// All rebindable user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    PrevSection,
    NextSection,
    JumpToSection,
    ToggleOutline,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::ScrollUp,
        Action::ScrollDown,
        Action::PageUp,
        Action::PageDown,
        Action::PrevSection,
        Action::NextSection,
        Action::JumpToSection,
        Action::ToggleOutline,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::ScrollUp => "Scroll Up",
            Action::ScrollDown => "Scroll Down",
            Action::PageUp => "Page Up",
            Action::PageDown => "Page Down",
            Action::PrevSection => "Previous Section",
            Action::NextSection => "Next Section",
            Action::JumpToSection => "Jump To Section",
            Action::ToggleOutline => "Toggle Outline",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::PrevSection => "prev_section",
            Action::NextSection => "next_section",
            Action::JumpToSection => "jump_to_section",
            Action::ToggleOutline => "toggle_outline",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT);

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT are
    /// compared.
    pub fn matches(&self, event: KeyEvent) -> bool {
        self.code == event.code && (self.modifiers & MODIFIER_MASK) == (event.modifiers & MODIFIER_MASK)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers & MODIFIER_MASK,
        }
    }

    /// User-friendly display string (e.g. `"Shift+↓"`, `"Ctrl+d"`, `"q"`).
    pub fn display(&self) -> String {
        self.format(true)
    }

    /// Config-file form (e.g. `"Shift+Down"`).
    fn to_config_string(&self) -> String {
        self.format(false)
    }

    fn format(&self, pretty: bool) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        let key = match (self.code, pretty) {
            (KeyCode::Char(' '), _) => "Space".to_string(),
            (KeyCode::Char(c), _) => c.to_string(),
            (KeyCode::Up, true) => "↑".into(),
            (KeyCode::Down, true) => "↓".into(),
            (KeyCode::Left, true) => "←".into(),
            (KeyCode::Right, true) => "→".into(),
            (KeyCode::PageUp, true) => "PgUp".into(),
            (KeyCode::PageDown, true) => "PgDn".into(),
            (KeyCode::Up, false) => "Up".into(),
            (KeyCode::Down, false) => "Down".into(),
            (KeyCode::Left, false) => "Left".into(),
            (KeyCode::Right, false) => "Right".into(),
            (KeyCode::PageUp, false) => "PageUp".into(),
            (KeyCode::PageDown, false) => "PageDown".into(),
            (KeyCode::Enter, _) => "Enter".into(),
            (KeyCode::Esc, _) => "Esc".into(),
            (KeyCode::Tab, _) => "Tab".into(),
            (KeyCode::Backspace, _) => "Backspace".into(),
            (KeyCode::Delete, _) => "Delete".into(),
            (KeyCode::Home, _) => "Home".into(),
            (KeyCode::End, _) => "End".into(),
            (KeyCode::F(n), _) => format!("F{n}"),
            (other, _) => format!("{other:?}"),
        };
        s.push_str(&key);
        s
    }

    /// Parse a key string like `"Ctrl+d"`, `"Shift+Down"`, `"q"`, `"Enter"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => KeyCode::F(k[1..].parse().ok()?),
            // Keep the original case for single characters ("N" ≠ "n").
            _ if key_part.chars().count() == 1 => KeyCode::Char(key_part.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── preferences ───────

/// Viewing preferences.  Fields are private; every change goes through a
/// setter that keeps the value in range.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    smooth_scroll: bool,
    scroll_speed: f64,
    outline_visible: bool,
    outline_width_pct: u16,
    header_rows: u16,
    wheel_rows: u16,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            smooth_scroll: true,
            scroll_speed: 0.35,
            outline_visible: true,
            outline_width_pct: 28,
            header_rows: 2,
            wheel_rows: 3,
        }
    }
}

impl Preferences {
    pub const SPEED_RANGE: (f64, f64) = (0.05, 0.95);
    pub const OUTLINE_WIDTH_RANGE: (u16, u16) = (15, 50);
    pub const HEADER_ROWS_RANGE: (u16, u16) = (1, 4);
    pub const WHEEL_ROWS_RANGE: (u16, u16) = (1, 10);

    pub fn smooth_scroll(&self) -> bool {
        self.smooth_scroll
    }

    pub fn set_smooth_scroll(&mut self, on: bool) {
        self.smooth_scroll = on;
    }

    pub fn scroll_speed(&self) -> f64 {
        self.scroll_speed
    }

    pub fn set_scroll_speed(&mut self, speed: f64) {
        let (lo, hi) = Self::SPEED_RANGE;
        self.scroll_speed = if speed.is_finite() {
            speed.clamp(lo, hi)
        } else {
            Self::default().scroll_speed
        };
    }

    pub fn outline_visible(&self) -> bool {
        self.outline_visible
    }

    pub fn set_outline_visible(&mut self, visible: bool) {
        self.outline_visible = visible;
    }

    pub fn outline_width_pct(&self) -> u16 {
        self.outline_width_pct
    }

    pub fn set_outline_width_pct(&mut self, pct: u16) {
        let (lo, hi) = Self::OUTLINE_WIDTH_RANGE;
        self.outline_width_pct = pct.clamp(lo, hi);
    }

    /// Height of the sticky document header, which is also the observer's
    /// reference-line offset.
    pub fn header_rows(&self) -> u16 {
        self.header_rows
    }

    pub fn set_header_rows(&mut self, rows: u16) {
        let (lo, hi) = Self::HEADER_ROWS_RANGE;
        self.header_rows = rows.clamp(lo, hi);
    }

    pub fn wheel_rows(&self) -> u16 {
        self.wheel_rows
    }

    pub fn set_wheel_rows(&mut self, rows: u16) {
        let (lo, hi) = Self::WHEEL_ROWS_RANGE;
        self.wheel_rows = rows.clamp(lo, hi);
    }

    /// Apply one `key = value` line.  Returns `false` for keys that are not
    /// preferences.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "smooth_scroll" => self.set_smooth_scroll(value == "true"),
            "outline_visible" => self.set_outline_visible(value == "true"),
            "scroll_speed" => {
                if let Ok(v) = value.parse() {
                    self.set_scroll_speed(v);
                }
            }
            "outline_width_pct" => {
                if let Ok(v) = value.parse() {
                    self.set_outline_width_pct(v);
                }
            }
            "header_rows" => {
                if let Ok(v) = value.parse() {
                    self.set_header_rows(v);
                }
            }
            "wheel_rows" => {
                if let Ok(v) = value.parse() {
                    self.set_wheel_rows(v);
                }
            }
            _ => return false,
        }
        true
    }
}

// ───────────────────────────────────────── store ─────────────

/// Where the config file lives.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/brief-view/config.toml`.
    pub fn default_location() -> Self {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
                PathBuf::from(home).join(".config")
            });
        Self::at(config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: key bindings and preferences.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    pub prefs: Preferences,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            prefs: Preferences::default(),
        }
    }
}

impl AppConfig {
    /// Built-in bindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let shift = KeyModifiers::SHIFT;
        let mut m = HashMap::new();

        m.insert(ScrollUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(ScrollDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(Action::PageUp, vec![KeyBind::new(KeyCode::PageUp, n), KeyBind::new(Char('b'), n)]);
        m.insert(Action::PageDown, vec![KeyBind::new(KeyCode::PageDown, n), KeyBind::new(Char(' '), n)]);
        m.insert(PrevSection, vec![KeyBind::new(Char('['), n), KeyBind::new(Up, shift)]);
        m.insert(NextSection, vec![KeyBind::new(Char(']'), n), KeyBind::new(Down, shift)]);
        m.insert(JumpToSection, vec![KeyBind::new(Enter, n)]);
        m.insert(ToggleOutline, vec![KeyBind::new(Char('o'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`, taking the key away from any other
    /// action first.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    /// Restore all bindings to the built-in defaults.
    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: sections | Tab: focus | {}: outline | {}: settings | {}: quit",
            self.short_binding(Action::PrevSection),
            self.short_binding(Action::NextSection),
            self.short_binding(Action::ToggleOutline),
            self.short_binding(Action::OpenSettings),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from `store`, falling back to defaults.
    pub fn load(store: &ConfigStore) -> Self {
        match std::fs::read_to_string(store.path()) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                tracing::debug!(path = %store.path().display(), "no config loaded: {e}");
                Self::default()
            }
        }
    }

    /// Persist current config to `store`.
    pub fn save(&self, store: &ConfigStore) -> anyhow::Result<()> {
        if let Some(parent) = store.path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(store.path(), self.serialise())?;
        Ok(())
    }

    fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if config.prefs.apply(key, value) {
                continue;
            }
            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let p = &self.prefs;
        let mut lines = vec![
            "# brief-view configuration".to_string(),
            String::new(),
            "# Preferences".to_string(),
            format!("smooth_scroll = {}", p.smooth_scroll),
            format!("scroll_speed = {}", p.scroll_speed),
            format!("outline_visible = {}", p.outline_visible),
            format!("outline_width_pct = {}", p.outline_width_pct),
            format!("header_rows = {}", p.header_rows),
            format!("wheel_rows = {}", p.wheel_rows),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn page_keys_map_to_page_actions() {
        let cfg = AppConfig::default();
        for action in Action::ALL {
            assert!(cfg.bindings.get(action).is_some_and(|b| !b.is_empty()), "{action:?} unbound");
        }
        let none = KeyModifiers::NONE;
        assert_eq!(cfg.match_key(key(KeyCode::PageUp, none)), Some(Action::PageUp));
        assert_eq!(cfg.match_key(key(KeyCode::PageDown, none)), Some(Action::PageDown));
        assert_eq!(cfg.match_key(key(KeyCode::Char(' '), none)), Some(Action::PageDown));
        assert_eq!(cfg.match_key(key(KeyCode::Char('b'), none)), Some(Action::PageUp));
    }

    #[test]
    fn setters_clamp_into_range() {
        let mut p = Preferences::default();
        p.set_header_rows(0);
        assert_eq!(p.header_rows(), 1);
        p.set_header_rows(99);
        assert_eq!(p.header_rows(), 4);
        p.set_outline_width_pct(5);
        assert_eq!(p.outline_width_pct(), 15);
        p.set_scroll_speed(f64::NAN);
        assert_eq!(p.scroll_speed(), Preferences::default().scroll_speed());
        p.set_scroll_speed(2.0);
        assert_eq!(p.scroll_speed(), 0.95);
    }

    #[test]
    fn parse_ignores_junk_and_clamps() {
        let cfg = AppConfig::parse(
            "# comment\n[section]\nheader_rows = 12\nwheel_rows = lots\nnonsense\nunknown = 1\nquit = Ctrl+x, \"Q\"\n",
        );
        assert_eq!(cfg.prefs.header_rows(), 4);
        assert_eq!(cfg.prefs.wheel_rows(), Preferences::default().wheel_rows());
        assert_eq!(
            cfg.bindings[&Action::Quit],
            vec![
                KeyBind::new(KeyCode::Char('x'), KeyModifiers::CONTROL),
                KeyBind::new(KeyCode::Char('Q'), KeyModifiers::NONE),
            ]
        );
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("nested").join("config.toml"));

        let mut cfg = AppConfig::default();
        cfg.prefs.set_smooth_scroll(false);
        cfg.prefs.set_header_rows(3);
        cfg.prefs.set_outline_width_pct(40);
        cfg.add_binding(Action::NextSection, KeyBind::new(KeyCode::Char('n'), KeyModifiers::NONE));
        cfg.save(&store).unwrap();

        let loaded = AppConfig::load(&store);
        assert_eq!(loaded.prefs, cfg.prefs);
        assert_eq!(loaded.bindings[&Action::NextSection], cfg.bindings[&Action::NextSection]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(&ConfigStore::at(dir.path().join("absent.toml")));
        assert_eq!(cfg.prefs, Preferences::default());
    }

    #[test]
    fn rebinding_steals_key_from_other_action() {
        let mut cfg = AppConfig::default();
        let j = KeyBind::new(KeyCode::Char('j'), KeyModifiers::NONE);
        cfg.add_binding(Action::NextSection, j.clone());
        assert!(!cfg.bindings[&Action::ScrollDown].contains(&j));
        assert_eq!(
            cfg.match_key(key(KeyCode::Char('j'), KeyModifiers::NONE)),
            Some(Action::NextSection)
        );
    }

    #[test]
    fn modifier_binding_beats_plain() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.match_key(key(KeyCode::Down, KeyModifiers::SHIFT)), Some(Action::NextSection));
        assert_eq!(cfg.match_key(key(KeyCode::Down, KeyModifiers::NONE)), Some(Action::ScrollDown));
    }
}
