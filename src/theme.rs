//! Light/dark theme handling
//!
//! The theme preference is persisted under [`THEME_KEY`] in the local store.
//! A stored value of `dark` selects the dark theme; any other stored value
//! selects light. With nothing stored, the configured default applies.

use crate::error::Result;
use crate::storage::LocalStore;
use colored::{Color, Colorize};
use std::fmt;

/// Store key holding the theme preference
pub const THEME_KEY: &str = "growth-theme";

/// Colour theme of the terminal UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Dark text on a light background
    #[default]
    Light,
    /// Light text on a dark background
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Terminal colours used by the renderer for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub assistant: Color,
    pub info: Color,
    pub success: Color,
    pub error: Color,
    pub muted: Color,
}

impl Theme {
    /// Parse a theme from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use growth_chat::theme::Theme;
    ///
    /// assert_eq!(Theme::parse_str("Dark").unwrap(), Theme::Dark);
    /// assert!(Theme::parse_str("sepia").is_err());
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("Unknown theme: {}. Must be one of: light, dark", other)),
        }
    }

    /// The opposite theme
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    /// Label of the toggle control, naming the theme it switches to
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Dark => "Light Mode",
            Self::Light => "Dark Mode",
        }
    }

    /// Colours for this theme
    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                user: Color::Blue,
                assistant: Color::Black,
                info: Color::Cyan,
                success: Color::Green,
                error: Color::Red,
                muted: Color::BrightBlack,
            },
            Self::Dark => Palette {
                user: Color::BrightCyan,
                assistant: Color::BrightWhite,
                info: Color::BrightBlue,
                success: Color::BrightGreen,
                error: Color::BrightRed,
                muted: Color::White,
            },
        }
    }

    /// Colored tag for prompts and status lines
    pub fn colored_tag(self) -> String {
        match self {
            Self::Light => format!("[{}]", "LIGHT".yellow()),
            Self::Dark => format!("[{}]", "DARK".purple()),
        }
    }

    /// Load the stored preference, falling back to `default`
    pub fn load(store: &LocalStore, default: Theme) -> Theme {
        match store.get(THEME_KEY) {
            Ok(Some(value)) => {
                if value == "dark" {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
            Ok(None) => default,
            Err(e) => {
                tracing::error!("Error loading theme: {}", e);
                default
            }
        }
    }

    /// Persist this theme as the preference
    pub fn save(self, store: &LocalStore) -> Result<()> {
        store.set(THEME_KEY, &self.to_string())
    }
}
