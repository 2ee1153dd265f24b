//! Packed per-token attributes, as produced by grammar engines in their binary output mode.
//!
//! ```text
//!  3322 2222 2222 1111 1111 1100 0000 0000
//!  1098 7654 3210 9876 5432 1098 7654 3210
//! -----------------------------------------
//!  bbbb bbbb ffff ffff fFFF FBTT LLLL LLLL
//! -----------------------------------------
//!  L = language id (8 bits)
//!  T = standard token type (2 bits)
//!  B = balanced bracket (1 bit)
//!  F = font style (4 bits)
//!  f = foreground palette index (9 bits)
//!  b = background palette index (8 bits)
//! ```

use crate::themes::{Color, FontStyle, Palette, ThemeSnapshot};

const LANGUAGE_ID_MASK: u32 = 0b0000_0000_0000_0000_0000_0000_1111_1111;
const TOKEN_TYPE_MASK: u32 = 0b0000_0000_0000_0000_0000_0011_0000_0000;
const BALANCED_BRACKETS_MASK: u32 = 0b0000_0000_0000_0000_0000_0100_0000_0000;
const FONT_STYLE_MASK: u32 = 0b0000_0000_0000_0000_0111_1000_0000_0000;
const FOREGROUND_MASK: u32 = 0b0000_0000_1111_1111_1000_0000_0000_0000;
const BACKGROUND_MASK: u32 = 0b1111_1111_0000_0000_0000_0000_0000_0000;

const LANGUAGE_ID_OFFSET: u32 = 0;
const TOKEN_TYPE_OFFSET: u32 = 8;
const BALANCED_BRACKETS_OFFSET: u32 = 10;
const FONT_STYLE_OFFSET: u32 = 11;
const FOREGROUND_OFFSET: u32 = 15;
const BACKGROUND_OFFSET: u32 = 24;

/// Largest palette index the foreground field can hold
pub const MAX_FOREGROUND_ID: u32 = FOREGROUND_MASK >> FOREGROUND_OFFSET;
/// Largest palette index the background field can hold
pub const MAX_BACKGROUND_ID: u32 = BACKGROUND_MASK >> BACKGROUND_OFFSET;

/// The 2 bits standard token type field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardTokenType {
    #[default]
    Other = 0,
    Comment = 1,
    String = 2,
    RegEx = 3,
}

impl StandardTokenType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            1 => StandardTokenType::Comment,
            2 => StandardTokenType::String,
            3 => StandardTokenType::RegEx,
            _ => StandardTokenType::Other,
        }
    }
}

/// Accessors and builder for a packed `u32` of token metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EncodedTokenAttributes(pub u32);

impl EncodedTokenAttributes {
    pub fn language_id(self) -> u8 {
        ((self.0 & LANGUAGE_ID_MASK) >> LANGUAGE_ID_OFFSET) as u8
    }

    pub fn token_type(self) -> StandardTokenType {
        StandardTokenType::from_bits((self.0 & TOKEN_TYPE_MASK) >> TOKEN_TYPE_OFFSET)
    }

    pub fn contains_balanced_brackets(self) -> bool {
        self.0 & BALANCED_BRACKETS_MASK != 0
    }

    pub fn font_style(self) -> FontStyle {
        FontStyle::from_bits_truncate(((self.0 & FONT_STYLE_MASK) >> FONT_STYLE_OFFSET) as u8)
    }

    pub fn foreground(self) -> u32 {
        (self.0 & FOREGROUND_MASK) >> FOREGROUND_OFFSET
    }

    pub fn background(self) -> u32 {
        (self.0 & BACKGROUND_MASK) >> BACKGROUND_OFFSET
    }

    /// Packs all the fields. Palette ids that don't fit in their field are stored as 0,
    /// meaning "default color".
    pub fn encode(
        language_id: u8,
        token_type: StandardTokenType,
        balanced_brackets: bool,
        font_style: FontStyle,
        foreground: u32,
        background: u32,
    ) -> Self {
        let foreground = if foreground > MAX_FOREGROUND_ID {
            0
        } else {
            foreground
        };
        let background = if background > MAX_BACKGROUND_ID {
            0
        } else {
            background
        };
        Self(
            ((language_id as u32) << LANGUAGE_ID_OFFSET)
                | ((token_type as u32) << TOKEN_TYPE_OFFSET)
                | ((balanced_brackets as u32) << BALANCED_BRACKETS_OFFSET)
                | ((font_style.bits() as u32) << FONT_STYLE_OFFSET)
                | (foreground << FOREGROUND_OFFSET)
                | (background << BACKGROUND_OFFSET),
        )
    }

    /// Replaces only the foreground index, every other field is kept.
    pub fn with_foreground(self, foreground: u32) -> Self {
        let foreground = if foreground > MAX_FOREGROUND_ID {
            0
        } else {
            foreground
        };
        Self((self.0 & !FOREGROUND_MASK) | (foreground << FOREGROUND_OFFSET))
    }
}

impl From<u32> for EncodedTokenAttributes {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// The foreground color of a token.
///
/// `None` when the token uses the default foreground (index 0) or when the index doesn't
/// exist in the palette.
pub fn decode_foreground(attributes: u32, palette: &Palette) -> Option<Color> {
    palette.get(EncodedTokenAttributes(attributes).foreground())
}

/// The display class of a packed token: its foreground color mapped back to the first
/// theme rule using that color. `""` if there is no such rule.
pub fn decode_class(attributes: u32, theme: &ThemeSnapshot) -> &str {
    decode_foreground(attributes, theme.palette())
        .and_then(|color| theme.color_scope_map().get(&color))
        .unwrap_or("")
}
