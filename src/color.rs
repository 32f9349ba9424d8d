//! Resolved cell colors and the nearest-color quantizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A resolved display color.
///
/// Quantization only ever yields `Red`, `Yellow`, `Blue` or `Green`.
/// `None` and `LightYellow` are set directly by callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    None,
    Red,
    Green,
    Blue,
    Yellow,
    LightYellow,
}

impl Color {
    /// Solid-fill hex used when writing the color back, without `#`.
    pub fn fill_hex(&self) -> Option<&'static str> {
        match self {
            Color::None => None,
            Color::Red => Some("FF0000"),
            Color::Green => Some("00FF00"),
            Color::Blue => Some("0000FF"),
            Color::Yellow => Some("FFFF00"),
            Color::LightYellow => Some("FFFACD"),
        }
    }

    /// Lowercase display name.
    pub fn name(&self) -> &'static str {
        match self {
            Color::None => "none",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::LightYellow => "light_yellow",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Color::None
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Color::None),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "yellow" => Ok(Color::Yellow),
            "light_yellow" | "lightyellow" => Ok(Color::LightYellow),
            other => Err(format!("unknown color: {other}")),
        }
    }
}

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn distance_sq(&self, other: &Rgb) -> u32 {
        let d = |a: u8, b: u8| {
            let diff = i32::from(a) - i32::from(b);
            (diff * diff) as u32
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }
}

/// How an `ARGB` hex string from `styles.xml` becomes an [`Rgb`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexDecoding {
    /// Two hex digits per channel.
    #[default]
    FullByte,
    /// Only the high digit of each channel, giving values in `0..=15`.
    HighNibble,
}

/// Decode `AARRGGBB` (or `RRGGBB`) into an [`Rgb`].
///
/// Returns `None` for strings of any other length or with non-hex digits.
pub fn decode_argb(hex: &str, decoding: HexDecoding) -> Option<Rgb> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let offset = match hex.len() {
        8 => 2,
        6 => 0,
        _ => return None,
    };

    let channel = |i: usize| -> Option<u8> {
        let start = offset + i * 2;
        match decoding {
            HexDecoding::FullByte => u8::from_str_radix(&hex[start..start + 2], 16).ok(),
            HexDecoding::HighNibble => u8::from_str_radix(&hex[start..start + 1], 16).ok(),
        }
    };

    Some(Rgb::new(channel(0)?, channel(1)?, channel(2)?))
}

/// A fixed, ordered set of target colors.
///
/// Order matters: when two entries are equally close, the earlier one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<(Color, Rgb)>,
}

impl Palette {
    /// Red, Yellow, Blue, Green, in that tie-break order.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (Color::Red, Rgb::new(255, 0, 0)),
                (Color::Yellow, Rgb::new(255, 255, 0)),
                (Color::Blue, Rgb::new(0, 0, 255)),
                (Color::Green, Rgb::new(0, 255, 0)),
            ],
        }
    }

    /// Every color the writer emits, so written fills read back unchanged.
    pub fn fills() -> Self {
        let mut palette = Self::standard();
        palette
            .entries
            .push((Color::LightYellow, Rgb::new(0xFF, 0xFA, 0xCD)));
        palette
    }

    /// Build a palette from explicit entries.
    pub fn from_entries(entries: Vec<(Color, Rgb)>) -> Self {
        Self { entries }
    }

    /// The palette color closest to `rgb` by Euclidean distance.
    pub fn nearest(&self, rgb: Rgb) -> Color {
        let mut best = Color::None;
        let mut best_distance = u32::MAX;
        for (color, target) in &self.entries {
            let distance = rgb.distance_sq(target);
            if distance < best_distance {
                best_distance = distance;
                best = *color;
            }
        }
        best
    }

    /// Decode and quantize in one step.
    pub fn resolve_hex(&self, hex: &str, decoding: HexDecoding) -> Option<Color> {
        decode_argb(hex, decoding).map(|rgb| self.nearest(rgb))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}
