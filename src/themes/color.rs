use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeResult, Error};

/// RGBA color with 8-bit components.
///
/// Theme sources disagree on casing and on the leading `#` so colors are always compared
/// in this parsed form, never as strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

fn parse_hex_component(hex: &str, original: &str) -> BridgeResult<u8> {
    let invalid = || Error::InvalidHexColor {
        value: original.to_string(),
        reason: format!("invalid hex component '{}'", hex),
    };
    // from_str_radix would accept a sign
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u8::from_str_radix(hex, 16).map_err(|_| invalid())
}

impl Color {
    pub(crate) const WHITE: Color = Color::rgb(255, 255, 255);
    pub(crate) const BLACK: Color = Color::rgb(0, 0, 0);

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    /// Outputs the hex value for that colour, uppercase with a leading `#`.
    #[inline]
    pub fn as_hex(&self) -> String {
        if self.a < 255 {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        } else {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        }
    }

    /// Creates a Color from a string (in theory a hex but it can also be black/white).
    ///
    /// Errors if the string is not a valid hex colour.
    pub fn from_hex(hex: &str) -> BridgeResult<Self> {
        let original = hex;
        let hex = hex.trim().trim_start_matches('#');

        if hex.eq_ignore_ascii_case("white") {
            return Ok(Color::WHITE);
        } else if hex.eq_ignore_ascii_case("black") {
            return Ok(Color::BLACK);
        }
        if !hex.is_ascii() {
            return Err(Error::InvalidHexColor {
                value: original.to_string(),
                reason: "non-ascii characters".to_string(),
            });
        }

        match hex.len() {
            // #RGB and #RGBA: each digit is doubled, 0xF -> 0xFF
            3 | 4 => {
                let mut parts = [255u8; 4];
                for (i, part) in parts.iter_mut().enumerate().take(hex.len()) {
                    *part = parse_hex_component(&hex[i..i + 1], original)? * 17;
                }
                let [r, g, b, a] = parts;
                Ok(Color { r, g, b, a })
            }
            6 | 8 => {
                let mut parts = [255u8; 4];
                for (i, part) in parts.iter_mut().enumerate().take(hex.len() / 2) {
                    *part = parse_hex_component(&hex[i * 2..i * 2 + 2], original)?;
                }
                let [r, g, b, a] = parts;
                Ok(Color { r, g, b, a })
            }
            _ => Err(Error::InvalidHexColor {
                value: original.to_string(),
                reason: format!("invalid length {}", hex.len()),
            }),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}
