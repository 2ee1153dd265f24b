use std::collections::BTreeMap;

use serde::Serialize;

use crate::themes::base::BaseTheme;
use crate::themes::color::Color;
use crate::themes::raw::{StandaloneThemeData, TextMateTheme, ThemeInput, ThemeRule};

/// A theme normalized into a flat list of single-pattern rules.
///
/// Rule order is lookup priority: when two rules share a pattern or a color, the first one
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedTheme {
    pub base: BaseTheme,
    pub inherit: bool,
    pub rules: Vec<ThemeRule>,
    /// Editor colors (`editor.background` etc), passed through as-is
    pub colors: BTreeMap<String, String>,
    #[serde(skip)]
    pub default_foreground: Color,
    #[serde(skip)]
    pub default_background: Color,
}

impl Default for ConvertedTheme {
    fn default() -> Self {
        let base = BaseTheme::default();
        let (default_foreground, default_background) = base.default_colors();
        Self {
            base,
            inherit: false,
            rules: Vec::new(),
            colors: BTreeMap::new(),
            default_foreground,
            default_background,
        }
    }
}

// Some themes have it as editor.foreground/background some don't have the editor. prefix
fn editor_color(colors: &BTreeMap<String, String>, name: &str) -> Option<Color> {
    colors
        .get(&format!("editor.{name}"))
        .or_else(|| colors.get(name))
        .and_then(|value| Color::from_hex(value).ok())
}

fn string_colors(colors: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    colors
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
        .collect()
}

fn convert_textmate(theme: &TextMateTheme) -> ConvertedTheme {
    let base = theme
        .type_
        .as_deref()
        .map(BaseTheme::from_kind)
        .unwrap_or_default();

    let mut rules = Vec::with_capacity(theme.token_colors.len());
    for token_color in &theme.token_colors {
        let settings = &token_color.settings;
        let make_rule = |class_pattern: &str| ThemeRule {
            class_pattern: class_pattern.to_string(),
            foreground: settings.foreground().map(str::to_string),
            background: settings.background().map(str::to_string),
            font_style: settings.font_style.clone(),
        };

        let Some(listed) = &token_color.scope else {
            // A rule without scope holds the global editor settings
            rules.push(make_rule(""));
            continue;
        };
        let mut scopes = token_color.scopes().peekable();
        if scopes.peek().is_none() {
            // `""` selects everything. A scope that was only malformed items selects nothing.
            if !listed.is_empty() {
                rules.push(make_rule(""));
            }
            continue;
        }
        for scope in scopes {
            rules.push(make_rule(scope));
        }
    }

    finish(base, false, rules, string_colors(&theme.colors))
}

fn convert_standalone(theme: &StandaloneThemeData) -> ConvertedTheme {
    let mut rules = theme.rules.clone();
    if theme.inherit {
        rules.extend(theme.base.rules());
    }
    finish(theme.base, theme.inherit, rules, string_colors(&theme.colors))
}

fn finish(
    base: BaseTheme,
    inherit: bool,
    rules: Vec<ThemeRule>,
    colors: BTreeMap<String, String>,
) -> ConvertedTheme {
    let (fg, bg) = base.default_colors();
    ConvertedTheme {
        default_foreground: editor_color(&colors, "foreground").unwrap_or(fg),
        default_background: editor_color(&colors, "background").unwrap_or(bg),
        base,
        inherit,
        rules,
        colors,
    }
}

/// Normalizes any supported theme shape into a [`ConvertedTheme`].
///
/// This never fails: entries that don't make sense (bad colors, unknown kinds) are kept
/// as they are or replaced by defaults.
pub fn convert_theme(theme: &ThemeInput) -> ConvertedTheme {
    match theme {
        ThemeInput::TextMate(t) => convert_textmate(t),
        ThemeInput::Standalone(t) => convert_standalone(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_rules(rules: &[ThemeRule]) -> String {
        rules
            .iter()
            .map(|r| {
                format!(
                    "{:?} fg={} bg={} style={}",
                    r.class_pattern,
                    r.foreground.as_deref().unwrap_or("-"),
                    r.background.as_deref().unwrap_or("-"),
                    r.font_style.as_deref().unwrap_or("-"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn expands_list_scopes_into_one_rule_each() {
        let input = ThemeInput::from_json_str(
            r##"{
                "tokenColors": [
                    {"settings": {"foreground": "#D4D4D4", "background": "#1E1E1E"}},
                    {"scope": ["storage.type", "keyword"], "settings": {"foreground": "#569CD6"}},
                    {"scope": "string", "settings": {"foreground": "#CE9178"}},
                    {"scope": "comment", "settings": {"foreground": "#6A9955", "fontStyle": "italic"}}
                ]
            }"##,
        )
        .unwrap();

        let converted = convert_theme(&input);
        assert_eq!(converted.base, BaseTheme::Dark);
        assert!(!converted.inherit);
        insta::assert_snapshot!(format_rules(&converted.rules), @r#"
        "" fg=#D4D4D4 bg=#1E1E1E style=-
        "storage.type" fg=#569CD6 bg=- style=-
        "keyword" fg=#569CD6 bg=- style=-
        "string" fg=#CE9178 bg=- style=-
        "comment" fg=#6A9955 bg=- style=italic
        "#);
    }

    #[test]
    fn inherited_base_rules_come_after_theme_rules() {
        let input = ThemeInput::from_json_str(
            r#"{
                "base": "vs",
                "inherit": true,
                "rules": [{"token": "string", "foreground": "FF0000"}]
            }"#,
        )
        .unwrap();

        let converted = convert_theme(&input);
        assert_eq!(converted.base, BaseTheme::Light);
        assert_eq!(converted.rules[0], ThemeRule::new("string").foreground("FF0000"));
        let base_string = converted
            .rules
            .iter()
            .skip(1)
            .find(|r| r.class_pattern == "string")
            .unwrap();
        assert_eq!(base_string.foreground.as_deref(), Some("A31515"));
        assert_eq!(converted.rules.len(), 1 + BaseTheme::Light.rules().len());
    }

    #[test]
    fn no_inherit_keeps_only_theme_rules() {
        let input = ThemeInput::from_json_str(
            r#"{"base": "hc-black", "inherit": false, "rules": [{"token": "comment"}]}"#,
        )
        .unwrap();
        let converted = convert_theme(&input);
        assert_eq!(converted.rules, vec![ThemeRule::new("comment")]);
        assert_eq!(converted.default_background, Color::rgb(0, 0, 0));
    }

    #[test]
    fn editor_colors_override_base_defaults() {
        let input = ThemeInput::from_json_str(
            r##"{
                "type": "light",
                "colors": {"editor.background": "#fafafa", "foreground": "#111111", "editor.lineHighlightBorder": "nonsense"},
                "tokenColors": []
            }"##,
        )
        .unwrap();
        let converted = convert_theme(&input);
        assert_eq!(converted.base, BaseTheme::Light);
        assert_eq!(converted.default_background, Color::rgb(0xfa, 0xfa, 0xfa));
        assert_eq!(converted.default_foreground, Color::rgb(0x11, 0x11, 0x11));
        assert_eq!(converted.colors["editor.lineHighlightBorder"], "nonsense");
    }

    #[test]
    fn malformed_entries_do_not_reject_the_theme() {
        let input = ThemeInput::from_json_str(
            r##"{"tokenColors": [
                {"scope": "comment", "settings": {"foreground": 5}},
                {"scope": 123, "settings": {"foreground": "#FF0000"}},
                {"scope": ["string", {"not": "a scope"}], "settings": {"foreground": "#CE9178"}}
            ]}"##,
        )
        .unwrap();
        let converted = convert_theme(&input);
        assert_eq!(
            converted.rules,
            vec![
                ThemeRule::new("comment"),
                ThemeRule::new("string").foreground("#CE9178"),
            ]
        );
    }

    #[test]
    fn malformed_colors_are_passed_through() {
        let input = ThemeInput::from_json_str(
            r#"{"tokenColors": [{"scope": "string", "settings": {"foreground": "not-a-color"}}]}"#,
        )
        .unwrap();
        let converted = convert_theme(&input);
        assert_eq!(
            converted.rules,
            vec![ThemeRule::new("string").foreground("not-a-color")]
        );
    }
}
