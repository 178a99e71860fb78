//! Style values the fade writes: `opacity` and `display`.

use serde::{Deserialize, Serialize};

/// Fully opaque
pub const OPAQUE: f64 = 1.0;
/// Fully transparent
pub const TRANSPARENT: f64 = 0.0;

/// Layout state of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Display {
    /// Element takes part in layout (CSS default)
    #[default]
    Normal,
    /// Element is removed from layout (`display: none`)
    Hidden,
}

impl Display {
    /// CSS value written to the `display` property
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Hidden => "none",
        }
    }

    /// Whether the element is hidden
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }
}

impl std::fmt::Display for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

/// Clamp an opacity into [0, 1]; NaN becomes transparent.
#[must_use]
pub fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() {
        TRANSPARENT
    } else {
        value.clamp(TRANSPARENT, OPAQUE)
    }
}

/// Format an opacity for a CSS `opacity` property.
///
/// Rounds to four decimals so values like `0.09999999999999998` render as `0.1`.
#[must_use]
pub fn opacity_css(value: f64) -> String {
    let rounded = (clamp_opacity(value) * 10_000.0).round() / 10_000.0;
    format!("{rounded}")
}
