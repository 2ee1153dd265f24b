//! The built-in base palettes a host-native theme can inherit from.

use serde::{Deserialize, Serialize};

use crate::themes::color::Color;
use crate::themes::raw::ThemeRule;

/// Which built-in palette a theme is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BaseTheme {
    #[serde(rename = "vs")]
    Light,
    #[default]
    #[serde(rename = "vs-dark")]
    Dark,
    #[serde(rename = "hc-black")]
    HcDark,
    #[serde(rename = "hc-light")]
    HcLight,
}

// (token, foreground, font style)
type BaseRule = (&'static str, Option<&'static str>, Option<&'static str>);

const LIGHT_RULES: &[BaseRule] = &[
    ("invalid", Some("cd3131"), None),
    ("emphasis", None, Some("italic")),
    ("strong", None, Some("bold")),
    ("variable", Some("001188"), None),
    ("variable.predefined", Some("4864AA"), None),
    ("constant", Some("dd0000"), None),
    ("comment", Some("008000"), None),
    ("number", Some("098658"), None),
    ("number.hex", Some("3030c0"), None),
    ("regexp", Some("800000"), None),
    ("annotation", Some("808080"), None),
    ("type", Some("008080"), None),
    ("delimiter", Some("000000"), None),
    ("tag", Some("800000"), None),
    ("metatag", Some("e00000"), None),
    ("key", Some("863B00"), None),
    ("attribute.name", Some("FF0000"), None),
    ("attribute.value", Some("0451A5"), None),
    ("string", Some("A31515"), None),
    ("keyword", Some("0000FF"), None),
    ("keyword.flow", Some("AF00DB"), None),
    ("operator.sql", Some("778899"), None),
];

const DARK_RULES: &[BaseRule] = &[
    ("invalid", Some("f44747"), None),
    ("emphasis", None, Some("italic")),
    ("strong", None, Some("bold")),
    ("variable", Some("74B0DF"), None),
    ("variable.predefined", Some("4864AA"), None),
    ("variable.parameter", Some("9CDCFE"), None),
    ("constant", Some("569CD6"), None),
    ("comment", Some("608B4E"), None),
    ("number", Some("B5CEA8"), None),
    ("number.hex", Some("5BB498"), None),
    ("regexp", Some("B46695"), None),
    ("annotation", Some("cc6666"), None),
    ("type", Some("3DC9B0"), None),
    ("delimiter", Some("DCDCDC"), None),
    ("tag", Some("569CD6"), None),
    ("metatag", Some("DD6A6F"), None),
    ("key", Some("9CDCFE"), None),
    ("attribute.name", Some("9CDCFE"), None),
    ("attribute.value", Some("CE9178"), None),
    ("string", Some("CE9178"), None),
    ("keyword", Some("569CD6"), None),
    ("keyword.flow", Some("C586C0"), None),
    ("operator.sql", Some("778899"), None),
];

const HC_DARK_RULES: &[BaseRule] = &[
    ("invalid", Some("f44747"), None),
    ("emphasis", None, Some("italic")),
    ("strong", None, Some("bold")),
    ("variable", Some("1AEBFF"), None),
    ("variable.parameter", Some("9CDCFE"), None),
    ("constant", Some("569CD6"), None),
    ("comment", Some("008000"), None),
    ("number", Some("FFFFFF"), None),
    ("regexp", Some("C0C0C0"), None),
    ("annotation", Some("569CD6"), None),
    ("type", Some("3DC9B0"), None),
    ("delimiter", Some("FFFF00"), None),
    ("tag", Some("569CD6"), None),
    ("metatag", Some("1AEBFF"), None),
    ("key", Some("9CDCFE"), None),
    ("attribute.name", Some("569CD6"), None),
    ("attribute.value", Some("3FF23F"), None),
    ("string", Some("CE9178"), None),
    ("keyword", Some("569CD6"), None),
    ("keyword.flow", Some("C586C0"), None),
];

const HC_LIGHT_RULES: &[BaseRule] = &[
    ("invalid", Some("B5200D"), None),
    ("emphasis", None, Some("italic")),
    ("strong", None, Some("bold")),
    ("variable", Some("264F70"), None),
    ("variable.predefined", Some("4864AA"), None),
    ("constant", Some("dd0000"), None),
    ("comment", Some("008000"), None),
    ("number", Some("098658"), None),
    ("number.hex", Some("3030c0"), None),
    ("regexp", Some("800000"), None),
    ("annotation", Some("808080"), None),
    ("type", Some("008080"), None),
    ("delimiter", Some("000000"), None),
    ("tag", Some("800000"), None),
    ("key", Some("863B00"), None),
    ("attribute.name", Some("264F78"), None),
    ("attribute.value", Some("0451A5"), None),
    ("string", Some("A31515"), None),
    ("keyword", Some("0000FF"), None),
    ("keyword.flow", Some("AF00DB"), None),
];

impl BaseTheme {
    /// Maps the `type` of a VSCode theme to a base, defaulting to dark for anything unknown.
    pub fn from_kind(kind: &str) -> BaseTheme {
        match kind.to_ascii_lowercase().as_str() {
            "light" | "vs" => BaseTheme::Light,
            "hc" | "hc-black" | "hcdark" | "hc-dark" | "highcontrast" => BaseTheme::HcDark,
            "hclight" | "hc-light" | "highcontrastlight" => BaseTheme::HcLight,
            _ => BaseTheme::Dark,
        }
    }

    /// (fg, bg) used when the theme doesn't set editor colors
    pub fn default_colors(&self) -> (Color, Color) {
        match self {
            BaseTheme::Light => (Color::rgb(0x00, 0x00, 0x00), Color::rgb(0xFF, 0xFF, 0xFE)),
            BaseTheme::Dark => (Color::rgb(0xD4, 0xD4, 0xD4), Color::rgb(0x1E, 0x1E, 0x1E)),
            BaseTheme::HcDark => (Color::rgb(0xFF, 0xFF, 0xFF), Color::rgb(0x00, 0x00, 0x00)),
            BaseTheme::HcLight => (Color::rgb(0x29, 0x29, 0x29), Color::rgb(0xFF, 0xFF, 0xFF)),
        }
    }

    /// The rules of that palette, starting with the default `""` rule.
    pub fn rules(&self) -> Vec<ThemeRule> {
        let table = match self {
            BaseTheme::Light => LIGHT_RULES,
            BaseTheme::Dark => DARK_RULES,
            BaseTheme::HcDark => HC_DARK_RULES,
            BaseTheme::HcLight => HC_LIGHT_RULES,
        };
        let (fg, bg) = self.default_colors();

        let mut rules = Vec::with_capacity(table.len() + 1);
        rules.push(ThemeRule::new("").foreground(fg.as_hex()).background(bg.as_hex()));
        for (token, foreground, font_style) in table {
            rules.push(ThemeRule {
                class_pattern: (*token).to_string(),
                foreground: foreground.map(str::to_string),
                background: None,
                font_style: font_style.map(str::to_string),
            });
        }
        rules
    }
}
