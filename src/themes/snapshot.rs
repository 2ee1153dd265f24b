use std::collections::HashMap;

use crate::encoded::{EncodedTokenAttributes, StandardTokenType};
use crate::scope::{KnownClasses, prefixes};
use crate::themes::color::Color;
use crate::themes::converter::{ConvertedTheme, convert_theme};
use crate::themes::font_style::FontStyle;
use crate::themes::palette::{ColorScopeMap, Palette, build_color_scope_map};
use crate::themes::raw::{ThemeInput, ThemeRule};

/// Everything derived from one version of the theme.
///
/// A snapshot is never modified after being built: a theme change builds a new one, so the
/// palette and the color map can never come from two different themes.
#[derive(Debug, Clone, Default)]
pub struct ThemeSnapshot {
    version: u64,
    theme: ConvertedTheme,
    palette: Palette,
    color_scope_map: ColorScopeMap,
    known_classes: KnownClasses,
    // class pattern -> index of the first rule with that pattern
    rule_by_class: HashMap<String, usize>,
}

impl ThemeSnapshot {
    pub fn new(input: &ThemeInput, version: u64) -> Self {
        Self::from_converted(convert_theme(input), version)
    }

    pub fn from_converted(theme: ConvertedTheme, version: u64) -> Self {
        let palette = Palette::from_rules(&theme.rules);
        let color_scope_map = build_color_scope_map(&theme.rules);

        let mut known_classes = KnownClasses::with_capacity(theme.rules.len());
        let mut rule_by_class = HashMap::with_capacity(theme.rules.len());
        for (i, rule) in theme.rules.iter().enumerate() {
            known_classes.insert(rule.class_pattern.clone());
            rule_by_class.entry(rule.class_pattern.clone()).or_insert(i);
        }

        Self {
            version,
            theme,
            palette,
            color_scope_map,
            known_classes,
            rule_by_class,
        }
    }

    /// Starts at 0 and goes up by one for every theme published on a channel
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn theme(&self) -> &ConvertedTheme {
        &self.theme
    }

    pub fn rules(&self) -> &[ThemeRule] {
        &self.theme.rules
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn color_scope_map(&self) -> &ColorScopeMap {
        &self.color_scope_map
    }

    pub fn known_classes(&self) -> &KnownClasses {
        &self.known_classes
    }

    fn rule_for(&self, class_pattern: &str) -> Option<&ThemeRule> {
        self.rule_by_class
            .get(class_pattern)
            .map(|i| &self.theme.rules[*i])
    }

    /// Rules matching the scopes, most specific first: innermost scope first and for each
    /// scope its longest prefix first. The default `""` rule comes last if the theme has one.
    fn matching_rules<'a, S: AsRef<str>>(
        &'a self,
        scopes: &'a [S],
    ) -> impl Iterator<Item = &'a ThemeRule> + 'a {
        scopes
            .iter()
            .rev()
            .flat_map(|scope| {
                let scope = scope.as_ref();
                std::iter::once(scope).chain(prefixes(scope))
            })
            .chain(std::iter::once(""))
            .filter_map(move |prefix| self.rule_for(prefix))
    }

    fn palette_id(&self, value: Option<&str>) -> Option<u32> {
        let color = Color::from_hex(value?).ok()?;
        self.palette.id_of(&color)
    }

    /// Packs the style the theme gives to a scope stack, the way grammar engines do in
    /// their binary mode.
    ///
    /// Foreground, background and font style are each taken from the most specific rule
    /// that sets them.
    pub fn encode_scopes<S: AsRef<str>>(&self, scopes: &[S], language_id: u8) -> u32 {
        let mut foreground = None;
        let mut background = None;
        let mut font_style = None;
        for rule in self.matching_rules(scopes) {
            if foreground.is_none() {
                foreground = self.palette_id(rule.foreground.as_deref());
            }
            if background.is_none() {
                background = self.palette_id(rule.background.as_deref());
            }
            if font_style.is_none() {
                font_style = rule.font_style.as_deref().map(FontStyle::from_str);
            }
            if foreground.is_some() && background.is_some() && font_style.is_some() {
                break;
            }
        }

        EncodedTokenAttributes::encode(
            language_id,
            standard_token_type(scopes),
            false,
            font_style.unwrap_or_default(),
            foreground.unwrap_or(0),
            background.unwrap_or(0),
        )
        .0
    }
}

/// Comment/string/regex classification of the innermost scope that is one of those.
fn standard_token_type<S: AsRef<str>>(scopes: &[S]) -> StandardTokenType {
    for scope in scopes.iter().rev() {
        let scope = scope.as_ref();
        if scope.starts_with("meta.embedded") {
            return StandardTokenType::Other;
        }
        for part in scope.split('.') {
            match part {
                "comment" => return StandardTokenType::Comment,
                "string" => return StandardTokenType::String,
                "regex" => return StandardTokenType::RegEx,
                _ => {}
            }
        }
    }
    StandardTokenType::Other
}
