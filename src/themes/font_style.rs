use serde::{Deserialize, Serialize};

/// Font style flags, using the same bit values as the font style field of packed token
/// attributes.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug,
)]
pub struct FontStyle {
    bits: u8,
}

impl FontStyle {
    /// Italic font style
    pub const ITALIC: Self = Self { bits: 1 };
    /// Bold font style
    pub const BOLD: Self = Self { bits: 2 };
    /// Underline font style
    pub const UNDERLINE: Self = Self { bits: 4 };
    /// Strikethrough font style
    pub const STRIKETHROUGH: Self = Self { bits: 8 };

    /// Returns an empty set of flags
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Keeps only the 4 bits that fit in packed attributes.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self { bits: bits & 0b1111 }
    }

    /// The raw flags
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Returns `true` if no flags are currently stored
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if all of the flags in `other` are contained within `self`
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns the font style from a theme font style string such as `"bold italic"`.
    pub fn from_str(font_style_str: &str) -> Self {
        let mut font_style = Self::empty();
        for part in font_style_str.split_whitespace() {
            match part {
                "italic" => font_style.insert(FontStyle::ITALIC),
                "bold" => font_style.insert(FontStyle::BOLD),
                "underline" => font_style.insert(FontStyle::UNDERLINE),
                "strikethrough" => font_style.insert(FontStyle::STRIKETHROUGH),
                _ => {}
            }
        }
        font_style
    }

    /// Inserts the specified flags in-place
    pub fn insert(&mut self, other: Self) {
        self.bits |= other.bits;
    }
}
