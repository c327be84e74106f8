//! Theme system for the TUI.
//!
//! `ThemeVariant` selects between the Dark and Light palettes, `StyleMap`
//! resolves semantic role names to concrete styles, and `ThemeStore`
//! persists the dark-mode flag across launches.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::PreferenceStore;

/// Preference key holding the persisted theme.
pub const THEME_PREF_KEY: &str = "theme";

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// Parse a persisted value (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Value written to the preference store.
    pub fn pref_value(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Cards --
    pub card_name: Style,
    pub card_concentration: Style,
    pub card_meta: Style,
    pub card_selected: Style,

    // -- Placeholders --
    pub placeholder_loading: Style,
    pub placeholder_empty: Style,
    pub placeholder_error: Style,

    // -- Drawer --
    pub drawer_item: Style,
    pub drawer_active: Style,
    pub drawer_cursor: Style,
    pub overlay_dim: Style,

    // -- Chrome --
    pub header: Style,
    pub header_account: Style,
    pub body: Style,
    pub notice: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            card_name: Style::default().add_modifier(Modifier::BOLD),
            card_concentration: Style::default().fg(Color::Cyan),
            card_meta: Style::default().fg(Color::DarkGray),
            card_selected: Style::default().bg(Color::DarkGray).fg(Color::White),

            placeholder_loading: Style::default().fg(Color::Yellow),
            placeholder_empty: Style::default().fg(Color::Gray),
            placeholder_error: Style::default().fg(Color::Red),

            drawer_item: Style::default(),
            drawer_active: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            drawer_cursor: Style::default().bg(Color::DarkGray).fg(Color::White),
            overlay_dim: Style::default().fg(Color::DarkGray).bg(Color::Black),

            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_account: Style::default().fg(Color::Gray),
            body: Style::default(),
            notice: Style::default().fg(Color::Yellow),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    fn light() -> Self {
        Self {
            card_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_concentration: Style::default().fg(Color::Blue),
            card_meta: Style::default().fg(Color::DarkGray),
            card_selected: Style::default().bg(Color::Blue).fg(Color::White),

            placeholder_loading: Style::default().fg(Color::Magenta),
            placeholder_empty: Style::default().fg(Color::DarkGray),
            placeholder_error: Style::default().fg(Color::Red),

            drawer_item: Style::default().fg(Color::Black),
            drawer_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            drawer_cursor: Style::default().bg(Color::Blue).fg(Color::White),
            overlay_dim: Style::default().fg(Color::Gray).bg(Color::White),

            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_account: Style::default().fg(Color::DarkGray),
            body: Style::default().fg(Color::Black),
            notice: Style::default().fg(Color::Magenta),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup built from a `ColorPalette`.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

/// All semantic role names, in declaration order.
const ROLE_NAMES: [&str; 18] = [
    "card_name",
    "card_concentration",
    "card_meta",
    "card_selected",
    "placeholder_loading",
    "placeholder_empty",
    "placeholder_error",
    "drawer_item",
    "drawer_active",
    "drawer_cursor",
    "overlay_dim",
    "header",
    "header_account",
    "body",
    "notice",
    "status_bar",
    "panel_border",
    "panel_border_focused",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 18] = [
            p.card_name,
            p.card_concentration,
            p.card_meta,
            p.card_selected,
            p.placeholder_loading,
            p.placeholder_empty,
            p.placeholder_error,
            p.drawer_item,
            p.drawer_active,
            p.drawer_cursor,
            p.overlay_dim,
            p.header,
            p.header_account,
            p.body,
            p.notice,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Resolve a role name to its `Style`. Unknown roles get `Style::default()`.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Theme Store
// ============================================================================

/// Persists the dark-mode flag in the preference store.
///
/// Treated as always available: read failures fall back to light and write
/// failures are logged, never surfaced.
#[derive(Clone)]
pub struct ThemeStore {
    prefs: Arc<dyn PreferenceStore>,
}

impl ThemeStore {
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    /// Last persisted flag. Absent or unrecognized values mean light.
    pub async fn load_theme(&self) -> bool {
        match self.prefs.get(THEME_PREF_KEY).await {
            Ok(Some(value)) => {
                let variant = ThemeVariant::from_str_name(&value).unwrap_or_else(|| {
                    tracing::warn!(value = %value, "Unrecognized stored theme, using light");
                    ThemeVariant::Light
                });
                variant.is_dark()
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read theme preference, using light");
                false
            }
        }
    }

    /// Persist the flag.
    pub async fn set_theme(&self, is_dark: bool) {
        let variant = ThemeVariant::from_dark(is_dark);
        match self.prefs.set(THEME_PREF_KEY, variant.pref_value()).await {
            Ok(()) => tracing::debug!(theme = variant.pref_value(), "Theme preference saved"),
            Err(e) => tracing::warn!(error = %e, "Failed to persist theme preference"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
