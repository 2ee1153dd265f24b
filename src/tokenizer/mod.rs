//! What the editor sees of a grammar: a provider that tokenizes one line at a time and
//! gives each token the class name the editor colors it by.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::encoded::decode_class;
use crate::error::BridgeResult;
use crate::options::{ClassificationMode, ProviderOptions};
use crate::scope::resolve_class;
use crate::themes::{ThemeChannel, ThemeSnapshot};

mod stack;

pub use stack::StateStack;

/// A token as produced by a grammar engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    /// Byte offset in the line where the token starts. It ends where the next one starts.
    pub start_index: usize,
    /// Hierarchical scope names, ordered from outermost to innermost
    /// (e.g., source.ts -> meta.function.ts -> storage.type.function.ts).
    pub scopes: Vec<String>,
}

/// A token with its style packed in attributes, see [`EncodedTokenAttributes`](crate::EncodedTokenAttributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedToken {
    pub start_index: usize,
    pub attributes: u32,
}

/// The tokens of one line and the state to give to the next line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    pub tokens: Vec<RawToken>,
    pub end_state: StateStack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLineTokens {
    pub tokens: Vec<PackedToken>,
    pub end_state: StateStack,
}

/// A compiled grammar, as handed out by a [`GrammarCompiler`](crate::GrammarCompiler).
///
/// Tokens of a non-empty line must partition it: the first one starts at 0 and start
/// indices strictly increase. An empty line has no tokens.
pub trait Grammar: Send + Sync {
    fn scope_name(&self) -> &str;

    /// Tokenizes `line` (without its line terminator) starting from `state`.
    fn tokenize_line(&self, line: &str, state: &StateStack) -> BridgeResult<LineTokens>;

    /// Same as [`Grammar::tokenize_line`] but with every token styled by `theme`.
    ///
    /// Engines with their own theme matching should override it. The default matches the
    /// scopes with [`ThemeSnapshot::encode_scopes`].
    fn tokenize_line_encoded(
        &self,
        line: &str,
        state: &StateStack,
        theme: &ThemeSnapshot,
        language_id: u8,
    ) -> BridgeResult<EncodedLineTokens> {
        let LineTokens { tokens, end_state } = self.tokenize_line(line, state)?;
        let tokens = tokens
            .into_iter()
            .map(|token| PackedToken {
                start_index: token.start_index,
                attributes: theme.encode_scopes(&token.scopes, language_id),
            })
            .collect();
        Ok(EncodedLineTokens { tokens, end_state })
    }
}

/// A token as the editor sees it: where it starts and the class it is colored by.
/// `""` is the default class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedToken {
    pub start_index: usize,
    pub class: String,
}

impl ClassifiedToken {
    pub fn new(start_index: usize, class: impl Into<String>) -> Self {
        Self {
            start_index,
            class: class.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeResult {
    pub tokens: Vec<ClassifiedToken>,
    pub end_state: StateStack,
}

static NO_THEME: LazyLock<Arc<ThemeSnapshot>> = LazyLock::new(Default::default);

/// Tokenizes lines of one language for the editor.
///
/// Every token the grammar returns is classified on its own: boundaries are never
/// moved and tokens are never merged or split.
pub struct TokensProvider {
    grammar: Arc<dyn Grammar>,
    theme: Option<Arc<ThemeChannel>>,
    options: ProviderOptions,
}

impl TokensProvider {
    pub fn new(
        grammar: Arc<dyn Grammar>,
        theme: Option<Arc<ThemeChannel>>,
        options: ProviderOptions,
    ) -> Self {
        Self {
            grammar,
            theme,
            options,
        }
    }

    pub fn scope_name(&self) -> &str {
        self.grammar.scope_name()
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// The state to tokenize the first line of a buffer with
    pub fn initial_state(&self) -> StateStack {
        StateStack::INITIAL
    }

    fn snapshot(&self) -> Arc<ThemeSnapshot> {
        match &self.theme {
            Some(channel) => channel.snapshot(),
            None => Arc::clone(&NO_THEME),
        }
    }

    fn classify_scopes(&self, snapshot: Option<&ThemeSnapshot>, scopes: &[String]) -> String {
        match snapshot {
            Some(snapshot) => resolve_class(snapshot.known_classes(), scopes).to_string(),
            None if self.options.fallback_to_innermost_scope => {
                scopes.last().cloned().unwrap_or_default()
            }
            None => String::new(),
        }
    }

    /// Tokenizes a line and classifies its tokens, returning any grammar error.
    pub fn try_tokenize(&self, line: &str, state: &StateStack) -> BridgeResult<TokenizeResult> {
        match self.options.mode {
            ClassificationMode::Scopes => {
                let LineTokens { tokens, end_state } = self.grammar.tokenize_line(line, state)?;
                // One snapshot for the whole line
                let snapshot = self.theme.as_ref().map(|channel| channel.snapshot());
                let tokens = tokens
                    .into_iter()
                    .map(|token| ClassifiedToken {
                        start_index: token.start_index,
                        class: self.classify_scopes(snapshot.as_deref(), &token.scopes),
                    })
                    .collect();
                Ok(TokenizeResult { tokens, end_state })
            }
            ClassificationMode::Encoded => {
                let snapshot = self.snapshot();
                let EncodedLineTokens { tokens, end_state } = self.grammar.tokenize_line_encoded(
                    line,
                    state,
                    &snapshot,
                    self.options.language_id,
                )?;
                let tokens = tokens
                    .into_iter()
                    .map(|token| ClassifiedToken {
                        start_index: token.start_index,
                        class: decode_class(token.attributes, &snapshot).to_string(),
                    })
                    .collect();
                Ok(TokenizeResult { tokens, end_state })
            }
        }
    }

    /// Tokenizes a line for the editor.
    ///
    /// If the grammar fails on that line, the whole line becomes a single token with the
    /// default class and `state` is passed through unchanged so the next lines still get
    /// tokenized.
    pub fn tokenize(&self, line: &str, state: &StateStack) -> TokenizeResult {
        match self.try_tokenize(line, state) {
            Ok(result) => result,
            Err(e) => {
                log::warn!(
                    "Failed to tokenize a line with {}, using the default class: {e}",
                    self.scope_name()
                );
                let tokens = if line.is_empty() {
                    Vec::new()
                } else {
                    vec![ClassifiedToken::new(0, "")]
                };
                TokenizeResult {
                    tokens,
                    end_state: state.clone(),
                }
            }
        }
    }

    /// The packed tokens of a line, styled by the current theme, without classifying them.
    pub fn tokenize_encoded(
        &self,
        line: &str,
        state: &StateStack,
    ) -> BridgeResult<EncodedLineTokens> {
        let snapshot = self.snapshot();
        self.grammar
            .tokenize_line_encoded(line, state, &snapshot, self.options.language_id)
    }

    /// Tokenizes every line of `text` in order, starting from the initial state.
    pub fn tokenize_lines(&self, text: &str) -> Vec<TokenizeResult> {
        let mut state = self.initial_state();
        let mut results = Vec::new();
        for line in text.lines() {
            let result = self.tokenize(line, &state);
            state = result.end_state.clone();
            results.push(result);
        }
        results
    }
}

impl fmt::Debug for TokensProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokensProvider")
            .field("scope_name", &self.scope_name())
            .field("options", &self.options)
            .field("themed", &self.theme.is_some())
            .finish()
    }
}
