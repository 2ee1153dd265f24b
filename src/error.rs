use std::fmt;
use std::io;
use std::sync::Arc;

pub(crate) type BridgeResult<T> = Result<T, Error>;

/// Errors that can occur while loading grammars/themes or tokenizing lines.
///
/// The error is `Clone` since a single failed provider construction is reported to every
/// caller that was waiting on it.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred when reading a grammar or theme file
    Io(Arc<io::Error>),

    /// JSON parsing failed when loading a grammar or a theme.
    Json(Arc<serde_json::Error>),

    /// An invalid hex color was encountered.
    #[allow(missing_docs)]
    InvalidHexColor { value: String, reason: String },

    /// No grammar is registered for that scope name.
    GrammarNotFound(String),

    /// The grammar engine rejected a grammar definition.
    #[allow(missing_docs)]
    GrammarCompile { scope_name: String, reason: String },

    /// The regex engine could not be initialized.
    RegexInit(String),

    /// A regex could not be compiled by the regex engine.
    Regex(String),

    /// The task building a tokens provider went away before producing a result.
    /// Only happens if the grammar engine panicked or the runtime is shutting down.
    ConstructionAborted(String),

    /// The continuation state given to `tokenize` was not produced by this grammar.
    InvalidState(String),

    /// The grammar engine failed on a specific line.
    Tokenize(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
            Error::InvalidHexColor { value, reason } => {
                write!(f, "invalid hex color '{}': {}", value, reason)
            }
            Error::GrammarNotFound(name) => write!(f, "no grammar found for scope '{}'", name),
            Error::GrammarCompile { scope_name, reason } => {
                write!(f, "failed to compile grammar '{}': {}", scope_name, reason)
            }
            Error::RegexInit(message) => {
                write!(f, "regex engine initialization error: {}", message)
            }
            Error::Regex(message) => write!(f, "regex compilation error: {}", message),
            Error::ConstructionAborted(name) => {
                write!(f, "construction of the tokens provider for '{}' was aborted", name)
            }
            Error::InvalidState(message) => write!(f, "invalid continuation state: {}", message),
            Error::Tokenize(message) => write!(f, "tokenization error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err.as_ref()),
            Error::Json(err) => Some(err.as_ref()),
            Error::InvalidHexColor { .. }
            | Error::GrammarNotFound(_)
            | Error::GrammarCompile { .. }
            | Error::RegexInit(_)
            | Error::Regex(_)
            | Error::ConstructionAborted(_)
            | Error::InvalidState(_)
            | Error::Tokenize(_) => None,
        }
    }
}

impl Error {
    /// Whether this error happened while loading a grammar or building its provider,
    /// as opposed to while tokenizing a line.
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Error::InvalidState(_) | Error::Tokenize(_))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_tokenize_errors_are_distinct() {
        assert!(Error::GrammarNotFound("source.nope".into()).is_load_error());
        assert!(Error::RegexInit("wasm missing".into()).is_load_error());
        assert!(!Error::InvalidState("foreign state".into()).is_load_error());
        assert!(!Error::Tokenize("boom".into()).is_load_error());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing.json").into();
        let cloned = err.clone();
        assert!(std::error::Error::source(&cloned).is_some());
        assert_eq!(cloned.to_string(), "I/O error: missing.json");
    }
}
