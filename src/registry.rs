use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{BridgeResult, Error};
use crate::options::ProviderOptions;
use crate::regex::{RegexLib, RegexRuntime};
use crate::themes::ThemeChannel;
use crate::tokenizer::{Grammar, TokensProvider};

/// A grammar definition as loaded from its source, before compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarDefinition {
    scope_name: String,
    raw: serde_json::Value,
}

impl GrammarDefinition {
    pub fn new(scope_name: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            scope_name: scope_name.into(),
            raw,
        }
    }

    pub fn from_json_str(scope_name: impl Into<String>, json: &str) -> BridgeResult<Self> {
        Ok(Self::new(scope_name, serde_json::from_str(json)?))
    }

    /// The scope name it was requested under
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn into_raw(self) -> serde_json::Value {
        self.raw
    }
}

/// Where grammar definitions come from.
pub trait GrammarSource: Send + Sync + 'static {
    /// Loads the definition of `scope_name`, failing with [`Error::GrammarNotFound`] if the
    /// source doesn't know about it.
    fn load_grammar(
        &self,
        scope_name: &str,
    ) -> impl Future<Output = BridgeResult<GrammarDefinition>> + Send;
}

/// A [`GrammarSource`] reading grammar JSON files.
#[derive(Debug, Clone, Default)]
pub struct GrammarFiles {
    paths: HashMap<String, PathBuf>,
}

impl GrammarFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the file holding the grammar of `scope_name`
    pub fn with_grammar(mut self, scope_name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.add_grammar(scope_name, path);
        self
    }

    pub fn add_grammar(&mut self, scope_name: impl Into<String>, path: impl AsRef<Path>) {
        self.paths
            .insert(scope_name.into(), path.as_ref().to_path_buf());
    }

    pub fn contains(&self, scope_name: &str) -> bool {
        self.paths.contains_key(scope_name)
    }
}

impl GrammarSource for GrammarFiles {
    async fn load_grammar(&self, scope_name: &str) -> BridgeResult<GrammarDefinition> {
        let path = self
            .paths
            .get(scope_name)
            .ok_or_else(|| Error::GrammarNotFound(scope_name.to_string()))?;
        let content = tokio::fs::read_to_string(path).await?;
        GrammarDefinition::from_json_str(scope_name, &content)
    }
}

/// Turns grammar definitions into something that can tokenize.
pub trait GrammarCompiler: Send + Sync + 'static {
    fn compile(
        &self,
        definition: GrammarDefinition,
        regex: Arc<dyn RegexLib>,
    ) -> BridgeResult<Arc<dyn Grammar>>;
}

type ProviderSlot = Option<BridgeResult<Arc<TokensProvider>>>;

/// A provider being built or already built. Compared by identity so a finished
/// construction only ever removes its own entry.
#[derive(Debug)]
struct PendingProvider {
    rx: watch::Receiver<ProviderSlot>,
}

struct CacheInner<S, C> {
    source: S,
    compiler: C,
    regex: Arc<RegexRuntime>,
    theme: Option<Arc<ThemeChannel>>,
    options: ProviderOptions,
    providers: papaya::HashMap<String, Arc<PendingProvider>>,
}

impl<S: GrammarSource, C: GrammarCompiler> CacheInner<S, C> {
    async fn build_provider(&self, scope_name: &str) -> BridgeResult<Arc<TokensProvider>> {
        let definition = self.source.load_grammar(scope_name).await?;
        let regex = self.regex.ready().await?;
        let grammar = self.compiler.compile(definition, regex)?;
        Ok(Arc::new(TokensProvider::new(
            grammar,
            self.theme.clone(),
            self.options.clone(),
        )))
    }

    /// Removes the entry of `scope_name` if it is still `pending`
    fn forget(&self, scope_name: &str, pending: &Arc<PendingProvider>) {
        let providers = self.providers.pin();
        if providers
            .get(scope_name)
            .is_some_and(|current| Arc::ptr_eq(current, pending))
        {
            providers.remove(scope_name);
        }
    }
}

/// Builds tokens providers lazily and keeps one per grammar scope name.
///
/// Every provider construction runs on its own tokio task: callers that stop waiting
/// don't cancel it and concurrent requests for the same scope name share it. A failed
/// construction is reported to everyone waiting on it and then forgotten, so the next
/// request tries again.
pub struct TokensProviderCache<S, C> {
    inner: Arc<CacheInner<S, C>>,
}

impl<S: GrammarSource, C: GrammarCompiler> TokensProviderCache<S, C> {
    pub fn new(source: S, compiler: C, regex: Arc<RegexRuntime>) -> Self {
        Self::with_options(source, compiler, regex, None, ProviderOptions::default())
    }

    pub fn with_options(
        source: S,
        compiler: C,
        regex: Arc<RegexRuntime>,
        theme: Option<Arc<ThemeChannel>>,
        options: ProviderOptions,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                compiler,
                regex,
                theme,
                options,
                providers: papaya::HashMap::new(),
            }),
        }
    }

    /// Returns the provider of `scope_name`, building it on first use.
    pub async fn get_tokens_provider(&self, scope_name: &str) -> BridgeResult<Arc<TokensProvider>> {
        let pending = self.pending_provider(scope_name);
        let mut rx = pending.rx.clone();
        let slot = match rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => {
                self.inner.forget(scope_name, &pending);
                None
            }
        };
        slot.unwrap_or_else(|| Err(Error::ConstructionAborted(scope_name.to_string())))
    }

    /// The existing entry for `scope_name`, or a new one with its construction started
    fn pending_provider(&self, scope_name: &str) -> Arc<PendingProvider> {
        let providers = self.inner.providers.pin();
        if let Some(pending) = providers.get(scope_name) {
            log::debug!("Tokens provider for {scope_name} found in cache or being built");
            return Arc::clone(pending);
        }

        let (tx, rx) = watch::channel(None);
        let candidate = Arc::new(PendingProvider { rx });
        let pending = providers.get_or_insert_with(scope_name.to_string(), || {
            Arc::clone(&candidate)
        });
        if Arc::ptr_eq(pending, &candidate) {
            self.spawn_construction(scope_name.to_string(), tx, Arc::clone(&candidate));
        }
        Arc::clone(pending)
    }

    fn spawn_construction(
        &self,
        scope_name: String,
        tx: watch::Sender<ProviderSlot>,
        pending: Arc<PendingProvider>,
    ) {
        log::debug!("Building tokens provider for {scope_name}");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.build_provider(&scope_name).await;
            match &result {
                Ok(_) => log::debug!("Tokens provider for {scope_name} is ready"),
                Err(e) => {
                    log::warn!("Failed to build the tokens provider for {scope_name}: {e}");
                    // Forget it before anyone sees the error so their next request retries
                    inner.forget(&scope_name, &pending);
                }
            }
            // Nobody waiting anymore is fine, the result stays in the cache entry
            let _ = tx.send(Some(result));
        });
    }

    /// Whether a provider for `scope_name` is built or being built
    pub fn contains(&self, scope_name: &str) -> bool {
        self.inner.providers.pin().contains_key(scope_name)
    }

    /// How many providers are built or being built
    pub fn len(&self) -> usize {
        self.inner.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn regex_runtime(&self) -> &Arc<RegexRuntime> {
        &self.inner.regex
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn compiler(&self) -> &C {
        &self.inner.compiler
    }
}

impl<S, C> Clone for TokensProviderCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, C> fmt::Debug for TokensProviderCache<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokensProviderCache")
            .field("providers", &self.inner.providers.len())
            .field("options", &self.inner.options)
            .field("regex", &self.inner.regex)
            .finish()
    }
}
