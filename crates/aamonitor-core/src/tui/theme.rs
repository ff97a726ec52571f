//! Colours, accent picker and the dark/light toggle

use ratatui::style::Color;

use crate::error::{Error, Result};

/// Accent colours the picker cycles through
pub const ACCENT_PALETTE: [&str; 6] = ["#52206d", "#1e6091", "#2a9d8f", "#e9c46a", "#e76f51", "#ee3333"];

const LIVE: Color = Color::Rgb(0x54, 0xe0, 0x52);
const DOWN: Color = Color::Rgb(0xee, 0x33, 0x33);

/// Parse `#rrggbb` (or `rrggbb`) into an RGB colour
pub fn parse_hex_color(value: &str) -> Result<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::config(format!("invalid colour `{value}`, expected #rrggbb")));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| Error::config(format!("invalid colour `{value}`: {e}")))
    };
    Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Active colour scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    accent: Color,
    accent_hex: String,
    light: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(0x52, 0x20, 0x6d),
            accent_hex: ACCENT_PALETTE[0].to_string(),
            light: false,
        }
    }
}

impl Theme {
    /// Build from a configured accent colour
    pub fn new(accent_hex: &str, light: bool) -> Result<Self> {
        Ok(Self {
            accent: parse_hex_color(accent_hex)?,
            accent_hex: accent_hex.trim().to_lowercase(),
            light,
        })
    }

    /// Accent colour
    pub fn accent(&self) -> Color {
        self.accent
    }

    /// Accent as `#rrggbb`
    pub fn accent_hex(&self) -> &str {
        &self.accent_hex
    }

    /// Whether the light variant is active
    pub fn is_light(&self) -> bool {
        self.light
    }

    /// Switch between dark and light
    pub fn toggle(&mut self) {
        self.light = !self.light;
    }

    /// Move to the next palette entry; a custom colour restarts the palette
    pub fn cycle_accent(&mut self) {
        let next = ACCENT_PALETTE
            .iter()
            .position(|hex| *hex == self.accent_hex)
            .map_or(0, |i| (i + 1) % ACCENT_PALETTE.len());
        self.accent_hex = ACCENT_PALETTE[next].to_string();
        // Palette entries are valid by construction
        if let Ok(color) = parse_hex_color(ACCENT_PALETTE[next]) {
            self.accent = color;
        }
    }

    /// Foreground text
    pub fn text(&self) -> Color {
        if self.light {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Screen background
    pub fn background(&self) -> Color {
        if self.light {
            Color::Rgb(0xef, 0xf6, 0xff)
        } else {
            Color::Rgb(0x1e, 0x29, 0x3b)
        }
    }

    /// Secondary text and borders
    pub fn muted(&self) -> Color {
        if self.light {
            Color::Gray
        } else {
            Color::DarkGray
        }
    }

    /// Live status
    pub fn live(&self) -> Color {
        LIVE
    }

    /// Down status and errors
    pub fn down(&self) -> Color {
        DOWN
    }
}
