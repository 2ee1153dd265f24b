mod base;
mod channel;
mod color;
mod converter;
mod font_style;
mod palette;
mod raw;
mod snapshot;

pub use base::BaseTheme;
pub use channel::{
    ListenerId, LocalThemeService, ThemeChannel, ThemeListener, ThemeService, ThemeSubscription,
};
pub use color::Color;
pub use converter::{ConvertedTheme, convert_theme};
pub use font_style::FontStyle;
pub use palette::{ColorScopeMap, Palette, build_color_scope_map};
pub use raw::{
    StandaloneThemeData, TextMateTheme, ThemeInput, ThemeRule, TokenColorRule, TokenColorSettings,
};
pub use snapshot::ThemeSnapshot;
