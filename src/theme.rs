//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::PieceColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Terminal colours for the seven piece colours and the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Indexed like `PieceColor::ALL`.
    pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Block outlines and borders.
    pub div_line: Color,
    /// Text (score, help).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            pieces: [
                Color::Rgb(0x56, 0xB6, 0xC2), // cyan
                Color::Rgb(0x61, 0xAF, 0xEF), // blue
                Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
                Color::Rgb(0x98, 0xC3, 0x79), // green
                Color::Rgb(0xD1, 0x9A, 0x66), // orange
                Color::Rgb(0xE0, 0x6C, 0x75), // red
                Color::Rgb(0xC6, 0x78, 0xDD), // purple
            ],
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file. Keys are the piece colour names (`cyan`, `blue`, ...)
    /// plus `bg`, `div_line`, `main_fg` and `title`; anything missing keeps its default.
    /// No path means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        for (i, color) in PieceColor::ALL.iter().enumerate() {
            theme.pieces[i] = get(color.name(), theme.pieces[i])?;
        }
        theme.bg = get("bg", theme.bg)?;
        theme.div_line = get("div_line", theme.div_line)?;
        theme.main_fg = get("main_fg", theme.main_fg)?;
        theme.title = get("title", theme.title)?;
        Ok(theme)
    }

    #[inline]
    pub fn piece_color(&self, color: PieceColor) -> Color {
        self.pieces[color as usize]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    match s.len() {
        6 => Ok(Color::Rgb(
            channel(&s[0..2])?,
            channel(&s[2..4])?,
            channel(&s[4..6])?,
        )),
        3 => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}
