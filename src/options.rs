use serde::{Deserialize, Serialize};

/// How a [`TokensProvider`](crate::TokensProvider) turns grammar tokens into class names
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Resolve the scope stack of each token against the classes the theme knows about
    #[default]
    Scopes,
    /// Ask the grammar for packed attributes and map their foreground color back to the
    /// class that owns it in the theme
    Encoded,
}

/// The options given to every tokens provider built by a cache
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderOptions {
    pub(crate) mode: ClassificationMode,
    /// Language id written in packed attributes in encoded mode
    pub(crate) language_id: u8,
    /// In scope mode without a theme, use the innermost scope as class instead of `""`
    pub(crate) fallback_to_innermost_scope: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self::new(ClassificationMode::default())
    }
}

impl ProviderOptions {
    pub fn new(mode: ClassificationMode) -> Self {
        Self {
            mode,
            language_id: 0,
            fallback_to_innermost_scope: true,
        }
    }

    /// The language id grammars write in the attributes of encoded tokens
    pub fn with_language_id(mut self, language_id: u8) -> Self {
        self.language_id = language_id;
        self
    }

    /// Whether tokens get their innermost scope as class when no theme is attached.
    /// When disabled, they all get `""`.
    pub fn fallback_to_innermost_scope(mut self, value: bool) -> Self {
        self.fallback_to_innermost_scope = value;
        self
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    pub fn language_id(&self) -> u8 {
        self.language_id
    }
}
