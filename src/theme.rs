use std::fmt;

use crate::page::Document;
use crate::storage::KeyValueStore;

/// Root element attribute that style rules key on.
pub const THEME_ATTRIBUTE: &str = "data-theme";
/// Storage key holding the last theme written by [`toggle_theme`].
pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// `"dark"` is the only recognized active marker: it flips to light,
    /// anything else (including no marker) flips to dark.
    pub fn toggled_from(current: Option<&str>) -> Self {
        if current == Some("dark") {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flips the root theme marker and persists the new value.
///
/// The attribute is written first. A failing storage write is returned as-is,
/// after the page has already switched.
pub fn toggle_theme(document: &Document, storage: &mut dyn KeyValueStore) -> anyhow::Result<()> {
    let current = document.root_attribute(THEME_ATTRIBUTE);
    let target = Theme::toggled_from(current.as_deref());

    document.set_root_attribute(THEME_ATTRIBUTE, target.as_str())?;
    storage.set_item(THEME_STORAGE_KEY, target.as_str())?;

    tracing::debug!(from = current.as_deref().unwrap_or(""), to = %target, "theme toggled");
    Ok(())
}

/// Page-load restoration: applies a stored `light`/`dark` preference to the
/// root element. Unknown or missing values leave the markup untouched.
pub fn restore_theme(
    document: &Document,
    storage: &dyn KeyValueStore,
) -> anyhow::Result<Option<Theme>> {
    let saved = storage.get_item(THEME_STORAGE_KEY)?;
    let Some(theme) = saved.as_deref().and_then(Theme::parse) else {
        if let Some(value) = saved {
            tracing::warn!(%value, "ignoring unrecognized stored theme");
        }
        return Ok(None);
    };

    document.set_root_attribute(THEME_ATTRIBUTE, theme.as_str())?;
    Ok(Some(theme))
}
