//! The regex engine grammar engines run their patterns on.
//!
//! The engine is a process-wide resource: it is initialized once through a shared
//! [`RegexRuntime`] and handed to every grammar compiled afterwards.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use onig::{RegSet, RegexOptions, SearchOptions};
use tokio::sync::OnceCell;

use crate::error::{BridgeResult, Error};

/// The first match found by a [`Scanner`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ScannerMatch {
    /// Index of the pattern that matched, in the order given to `create_scanner`
    pub index: usize,
    /// Byte ranges of each capture group, group 0 being the whole match
    pub captures: Vec<Option<Range<usize>>>,
}

impl ScannerMatch {
    /// Byte range of the whole match
    pub fn range(&self) -> Range<usize> {
        self.captures.first().cloned().flatten().unwrap_or(0..0)
    }
}

/// A compiled list of patterns, searched all at once.
pub trait Scanner {
    /// Finds the match starting the earliest at or after `start`. If several patterns
    /// match at the same position, the first pattern wins.
    fn find_next_match(&self, text: &str, start: usize) -> Option<ScannerMatch>;
}

/// Creates scanners for grammar engines.
pub trait RegexLib: Send + Sync {
    fn create_scanner(&self, patterns: &[&str]) -> BridgeResult<Box<dyn Scanner>>;
}

/// [`RegexLib`] backed by Oniguruma, the engine TextMate grammars are written for.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnigLib;

impl RegexLib for OnigLib {
    fn create_scanner(&self, patterns: &[&str]) -> BridgeResult<Box<dyn Scanner>> {
        Ok(Box::new(OnigScanner::new(patterns)?))
    }
}

/// An eagerly compiled pattern set for efficient batch regex matching using onig RegSet
pub struct OnigScanner {
    len: usize,
    regset: Option<RegSet>,
}

impl OnigScanner {
    pub fn new(patterns: &[&str]) -> BridgeResult<Self> {
        if patterns.is_empty() {
            return Ok(Self {
                len: 0,
                regset: None,
            });
        }

        let regset = RegSet::with_options(patterns, RegexOptions::REGEX_OPTION_CAPTURE_GROUP)
            .map_err(|e| {
                Error::Regex(format!(
                    "Failed to compile pattern set with {} patterns: {:?}",
                    patterns.len(),
                    e
                ))
            })?;

        Ok(Self {
            len: patterns.len(),
            regset: Some(regset),
        })
    }
}

impl Scanner for OnigScanner {
    fn find_next_match(&self, text: &str, start: usize) -> Option<ScannerMatch> {
        let regset = self.regset.as_ref()?;
        if start > text.len() {
            return None;
        }

        // We need to specify pos/text.len() because some regex might do lookbehind
        let (index, captures) = regset.captures_with_options(
            text,
            start,
            text.len(),
            onig::RegSetLead::Position,
            SearchOptions::SEARCH_OPTION_NONE,
        )?;
        captures.pos(0)?;

        Some(ScannerMatch {
            index,
            captures: (0..captures.len())
                .map(|i| captures.pos(i).map(|(s, e)| s..e))
                .collect(),
        })
    }
}

impl fmt::Debug for OnigScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnigScanner({} patterns)", self.len)
    }
}

type RegexInit = Box<dyn Fn() -> BridgeResult<Arc<dyn RegexLib>> + Send + Sync>;

/// Initializes the regex engine once and shares it.
///
/// Share one runtime (in an `Arc`) between every provider cache of the process so the
/// engine is only set up once. A failed initialization is not remembered: the next call
/// to [`RegexRuntime::ready`] tries again.
pub struct RegexRuntime {
    lib: OnceCell<Arc<dyn RegexLib>>,
    init: RegexInit,
    init_calls: AtomicUsize,
}

impl RegexRuntime {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> BridgeResult<Arc<dyn RegexLib>> + Send + Sync + 'static,
    {
        Self {
            lib: OnceCell::new(),
            init: Box::new(init),
            init_calls: AtomicUsize::new(0),
        }
    }

    /// A runtime using [`OnigLib`]
    pub fn onig() -> Self {
        Self::new(|| Ok(Arc::new(OnigLib)))
    }

    /// Waits until the engine is initialized, initializing it if nobody did yet.
    pub async fn ready(&self) -> BridgeResult<Arc<dyn RegexLib>> {
        let lib = self
            .lib
            .get_or_try_init(|| async {
                self.init_calls.fetch_add(1, Ordering::Relaxed);
                log::debug!("Initializing regex engine");
                (self.init)()
            })
            .await?;
        Ok(Arc::clone(lib))
    }

    pub fn is_ready(&self) -> bool {
        self.lib.initialized()
    }

    /// How many times initialization ran, successful or not
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::Relaxed)
    }
}

impl Default for RegexRuntime {
    fn default() -> Self {
        Self::onig()
    }
}

impl fmt::Debug for RegexRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexRuntime")
            .field("ready", &self.is_ready())
            .finish()
    }
}
