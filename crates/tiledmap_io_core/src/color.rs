//! 8-bit RGBA colors and their hex notations.

use std::fmt;

/// An 8-bit per channel RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 0xFF);
    pub const WHITE: Color = Color::rgba(0xFF, 0xFF, 0xFF, 0xFF);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_rgba_hex(text: &str) -> Option<Self> {
        match parse_hex_channels(text)? {
            Channels::Three([r, g, b]) => Some(Self::rgb(r, g, b)),
            Channels::Four([r, g, b, a]) => Some(Self::rgba(r, g, b, a)),
        }
    }

    /// Parses `#RRGGBB` or `#AARRGGBB`, the notation used by Tiled.
    pub fn from_argb_hex(text: &str) -> Option<Self> {
        match parse_hex_channels(text)? {
            Channels::Three([r, g, b]) => Some(Self::rgb(r, g, b)),
            Channels::Four([a, r, g, b]) => Some(Self::rgba(r, g, b, a)),
        }
    }

    /// Formats as `#RRGGBBAA`.
    pub fn to_rgba_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Formats as `#AARRGGBB`.
    pub fn to_argb_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// Channels as `channel / 255.0`, in RGBA order.
    pub fn to_normalized(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f32::from(c) / 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rgba_hex())
    }
}

enum Channels {
    Three([u8; 3]),
    Four([u8; 4]),
}

fn parse_hex_channels(text: &str) -> Option<Channels> {
    let digits = text.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i * 2..i * 2 + 2)?, 16).ok();
    match digits.len() {
        6 => Some(Channels::Three([channel(0)?, channel(1)?, channel(2)?])),
        8 => Some(Channels::Four([
            channel(0)?,
            channel(1)?,
            channel(2)?,
            channel(3)?,
        ])),
        _ => None,
    }
}
