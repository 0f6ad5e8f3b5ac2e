// Persisted light/dark preference.
use crate::storage::{LocalStorage, THEME_KEY};
use anyhow::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Unknown stored values fall back to `Light`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ThemeManager {
    storage: LocalStorage,
    current: Theme,
}

impl ThemeManager {
    /// Reads the stored preference; an unreadable store yields the default.
    pub fn new(storage: LocalStorage) -> Self {
        let current = match storage.get_item(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(&raw),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::warn!("Could not read theme preference: {:#}", e);
                Theme::default()
            }
        };
        Self { storage, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn set(&mut self, theme: Theme) -> Result<()> {
        self.storage.set_item(THEME_KEY, theme.as_str())?;
        self.current = theme;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Theme> {
        let next = self.current.toggled();
        self.set(next)?;
        Ok(next)
    }
}
