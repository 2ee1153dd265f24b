use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BridgeResult;
use crate::themes::base::BaseTheme;

/// A single normalized theme rule: one class pattern and its optional style.
///
/// Serializes in the shape host editors expect for their own theme definitions
/// (`token`, `foreground`, `background`, `fontStyle`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThemeRule {
    /// The scope-like name the editor colorizer matches against, eg `keyword.control`.
    /// The empty string is the default rule.
    #[serde(rename = "token", default)]
    pub class_pattern: String,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub foreground: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub background: Option<String>,
    #[serde(
        rename = "fontStyle",
        default,
        deserialize_with = "deserialize_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_style: Option<String>,
}

impl ThemeRule {
    pub fn new(class_pattern: impl Into<String>) -> Self {
        Self {
            class_pattern: class_pattern.into(),
            ..Default::default()
        }
    }

    pub fn foreground(mut self, color: impl Into<String>) -> Self {
        self.foreground = Some(color.into());
        self
    }

    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn font_style(mut self, font_style: impl Into<String>) -> Self {
        self.font_style = Some(font_style.into());
        self
    }
}

/// Token color settings from VSCode theme JSON
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TokenColorSettings {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    foreground: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    background: Option<String>,
    #[serde(
        rename = "fontStyle",
        default,
        deserialize_with = "deserialize_lenient_string"
    )]
    pub font_style: Option<String>,
}

impl TokenColorSettings {
    pub fn foreground(&self) -> Option<&str> {
        self.foreground.as_deref().filter(|s| *s != "inherit")
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref().filter(|s| *s != "inherit")
    }
}

/// Keeps string values, anything else is treated as missing
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Custom deserializer for scope field that can be string or array.
///
/// Items that are not strings are dropped and a scope of any other type selects nothing.
fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let scopes = match Option::<Value>::deserialize(deserializer)? {
        None => None,
        Some(Value::String(s)) => Some(vec![s]),
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Some(_) => Some(Vec::new()),
    };
    Ok(scopes)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenColorRule {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    /// `None` when the rule has no scope: it then holds the default settings
    #[serde(default, deserialize_with = "deserialize_scopes")]
    pub scope: Option<Vec<String>>,
    #[serde(default)]
    pub settings: TokenColorSettings,
}

impl TokenColorRule {
    /// Every individual scope selector of that rule.
    ///
    /// Both `["a", "b"]` and `"a, b"` give `a` and `b`.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope
            .iter()
            .flatten()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A VSCode color theme, as found in `.json` theme files
#[derive(Debug, Clone, Deserialize)]
pub struct TextMateTheme {
    #[serde(default)]
    pub name: Option<String>,
    /// `light`, `dark`, `hc`, `hcLight`...
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, serde_json::Value>,
    /// Token color rules for syntax highlighting
    #[serde(rename = "tokenColors")]
    pub token_colors: Vec<TokenColorRule>,
}

/// A theme already in the host editor's own format.
#[derive(Debug, Clone, Deserialize)]
pub struct StandaloneThemeData {
    pub base: BaseTheme,
    /// Whether the rules of `base` apply below the theme's own rules
    pub inherit: bool,
    pub rules: Vec<ThemeRule>,
    #[serde(default)]
    pub colors: BTreeMap<String, serde_json::Value>,
}

/// Any theme description the converter understands.
///
/// The shape is detected when deserializing: a host-native theme has `base` and `rules`,
/// a VSCode theme has `tokenColors`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThemeInput {
    Standalone(StandaloneThemeData),
    TextMate(TextMateTheme),
}

impl ThemeInput {
    pub fn from_json_str(json: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> BridgeResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> BridgeResult<Self> {
        let file = File::open(path)?;
        let theme = serde_json::from_reader(BufReader::new(file))?;
        Ok(theme)
    }

    /// The theme name if the format has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            ThemeInput::TextMate(t) => t.name.as_deref(),
            ThemeInput::Standalone(_) => None,
        }
    }
}

impl From<TextMateTheme> for ThemeInput {
    fn from(theme: TextMateTheme) -> Self {
        ThemeInput::TextMate(theme)
    }
}

impl From<StandaloneThemeData> for ThemeInput {
    fn from(theme: StandaloneThemeData) -> Self {
        ThemeInput::Standalone(theme)
    }
}
