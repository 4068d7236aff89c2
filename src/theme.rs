use ratatui::style::Color;

use crate::settings::{PaletteSettings, SettingsError};

/// Colours used by the viewport. Passed in explicitly by whoever draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub border: Color,
    pub text: Color,
    pub muted: Color,
    pub error: Color,
}

impl Default for Palette {
    fn default() -> Self {
        // Oceanic Next
        Self {
            border: Color::Rgb(0x65, 0x73, 0x7e),
            text: Color::Rgb(0xc0, 0xc5, 0xce),
            muted: Color::Rgb(0x4f, 0x5b, 0x66),
            error: Color::Rgb(0xec, 0x5f, 0x67),
        }
    }
}

impl Palette {
    pub fn from_settings(settings: &PaletteSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            border: parse_hex(&settings.border)?,
            text: parse_hex(&settings.text)?,
            muted: parse_hex(&settings.muted)?,
            error: parse_hex(&settings.error)?,
        })
    }
}

fn parse_hex(value: &str) -> Result<Color, SettingsError> {
    let invalid = || SettingsError::Colour(value.to_string());

    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

    Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
