//! Opaque RGB colors and their KML encoding.

use std::fmt;

/// An opaque RGB color.
///
/// KML writes colors as `aabbggrr`; [`Color::to_kml`] produces that form
/// with full opacity.
///
/// # Examples
///
/// ```
/// use transit_kmz::kml::Color;
///
/// assert_eq!(Color::RED.to_kml(), "ff0000ff");
/// assert_eq!(Color::rgb(255, 165, 0).to_kml(), "ff00a5ff");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `RRGGBB` hex string. Exactly six hex digits, nothing else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// The KML `aabbggrr` form, fully opaque.
    pub fn to_kml(&self) -> String {
        format!("ff{:02x}{:02x}{:02x}", self.b, self.g, self.r)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:02X}{:02X}{:02X})", self.r, self.g, self.b)
    }
}
