//! Colors editor tokens with TextMate grammars.
//!
//! Grammars emit scope stacks (`source.ts meta.function.ts storage.type.function.ts`) while
//! the editor colors tokens by a single class name taken from its theme. This crate sits in
//! between: it builds and caches one [`TokensProvider`] per grammar, classifies every token
//! against the current theme and follows theme changes of the host.

mod encoded;
mod error;
mod options;
mod regex;
mod registry;
mod scope;
mod themes;
mod tokenizer;

#[cfg(test)]
mod test_utils;

pub use encoded::{
    EncodedTokenAttributes, MAX_BACKGROUND_ID, MAX_FOREGROUND_ID, StandardTokenType,
    decode_class, decode_foreground,
};
pub use error::Error;
pub use options::{ClassificationMode, ProviderOptions};
pub use regex::{OnigLib, OnigScanner, RegexLib, RegexRuntime, Scanner, ScannerMatch};
pub use registry::{
    GrammarCompiler, GrammarDefinition, GrammarFiles, GrammarSource, TokensProviderCache,
};
pub use scope::{KnownClasses, language_suffix, prefixes, resolve_class};
pub use themes::{
    BaseTheme, Color, ColorScopeMap, ConvertedTheme, FontStyle, ListenerId, LocalThemeService,
    Palette, StandaloneThemeData, TextMateTheme, ThemeChannel, ThemeInput, ThemeListener,
    ThemeRule, ThemeService, ThemeSnapshot, ThemeSubscription, TokenColorRule,
    TokenColorSettings, build_color_scope_map, convert_theme,
};
pub use tokenizer::{
    ClassifiedToken, EncodedLineTokens, Grammar, LineTokens, PackedToken, RawToken,
    StateStack, TokenizeResult, TokensProvider,
};
