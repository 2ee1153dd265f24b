use std::collections::HashMap;

use crate::themes::color::Color;
use crate::themes::raw::ThemeRule;

fn parse_rule_color(value: Option<&str>) -> Option<Color> {
    let value = value?;
    match Color::from_hex(value) {
        Ok(c) => Some(c),
        Err(e) => {
            log::debug!("Ignoring theme color {value:?}: {e}");
            None
        }
    }
}

/// Ordered list of colors referenced by index from packed token attributes.
///
/// Slot 0 never holds a color: an index of 0 means the token has no explicit color.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    // colors[0] is the sentinel and always None
    colors: Vec<Option<Color>>,
    ids: HashMap<Color, u32>,
}

impl Palette {
    /// Assigns ids in order of first appearance, foreground before background for each
    /// rule.
    pub fn from_rules(rules: &[ThemeRule]) -> Self {
        let mut palette = Palette {
            colors: vec![None],
            ids: HashMap::new(),
        };
        for rule in rules {
            for value in [rule.foreground.as_deref(), rule.background.as_deref()] {
                if let Some(color) = parse_rule_color(value) {
                    palette.get_or_insert(color);
                }
            }
        }
        palette
    }

    fn get_or_insert(&mut self, color: Color) -> u32 {
        if let Some(id) = self.ids.get(&color) {
            return *id;
        }
        let id = self.colors.len() as u32;
        self.colors.push(Some(color));
        self.ids.insert(color, id);
        id
    }

    /// The color at that index, `None` for the sentinel slot and out of range indices.
    pub fn get(&self, index: u32) -> Option<Color> {
        self.colors.get(index as usize).copied().flatten()
    }

    /// The index of that color, if the theme uses it
    pub fn id_of(&self, color: &Color) -> Option<u32> {
        self.ids.get(color).copied()
    }

    /// Number of slots, including the sentinel
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.len() <= 1
    }

    /// The colors in index order, without the sentinel
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().flatten().copied()
    }
}

/// Reverse lookup from a foreground color to the class pattern of the first rule using it.
///
/// Many scopes can share a color so this cannot always recover the original scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorScopeMap {
    inner: HashMap<Color, String>,
}

impl ColorScopeMap {
    pub fn get(&self, color: &Color) -> Option<&str> {
        self.inner.get(color).map(String::as_str)
    }

    /// Lookup with a color string in any casing, with or without `#`.
    pub fn get_str(&self, color: &str) -> Option<&str> {
        Color::from_hex(color).ok().and_then(|c| self.get(&c))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Builds the color -> scope map from rules in priority order: the first rule with a given
/// foreground claims it, later ones are shadowed.
pub fn build_color_scope_map(rules: &[ThemeRule]) -> ColorScopeMap {
    let mut inner = HashMap::new();
    for rule in rules {
        if let Some(color) = parse_rule_color(rule.foreground.as_deref()) {
            inner
                .entry(color)
                .or_insert_with(|| rule.class_pattern.clone());
        }
    }
    ColorScopeMap { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rule_wins_for_a_color() {
        let rules = vec![
            ThemeRule::new("string").foreground("#CE9178"),
            ThemeRule::new("attribute.value").foreground("#ce9178"),
            ThemeRule::new("keyword").foreground("#569CD6"),
        ];
        let map = build_color_scope_map(&rules);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("#CE9178"), Some("string"));
        assert_eq!(map.get_str("ce9178"), Some("string"));
        assert_eq!(map.get_str("#569cd6"), Some("keyword"));
        assert_eq!(map.get_str("#FFFFFF"), None);
    }

    #[test]
    fn rules_without_valid_foreground_are_skipped() {
        let rules = vec![
            ThemeRule::new("emphasis").font_style("italic"),
            ThemeRule::new("broken").foreground("nope"),
            ThemeRule::new("comment").background("#000000"),
        ];
        assert!(build_color_scope_map(&rules).is_empty());
    }

    #[test]
    fn palette_reserves_slot_zero() {
        let rules = vec![
            ThemeRule::new("").foreground("#D4D4D4").background("#1E1E1E"),
            ThemeRule::new("string").foreground("#CE9178"),
            ThemeRule::new("string.quoted").foreground("#ce9178"),
            ThemeRule::new("broken").foreground("zzz"),
        ];
        let palette = Palette::from_rules(&rules);
        assert_eq!(palette.len(), 4);
        assert_eq!(palette.get(0), None);
        assert_eq!(palette.get(1), Some(Color::rgb(0xD4, 0xD4, 0xD4)));
        assert_eq!(palette.get(2), Some(Color::rgb(0x1E, 0x1E, 0x1E)));
        assert_eq!(palette.get(3), Some(Color::rgb(0xCE, 0x91, 0x78)));
        assert_eq!(palette.get(4), None);
        assert_eq!(palette.id_of(&Color::rgb(0xCE, 0x91, 0x78)), Some(3));
        assert_eq!(palette.colors().count(), 3);
    }
}
