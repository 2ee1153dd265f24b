use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::error::BridgeResult;
use crate::themes::raw::ThemeInput;
use crate::themes::snapshot::ThemeSnapshot;

/// Callback invoked with the new theme every time the host theme changes
pub type ThemeListener = Arc<dyn Fn(&ThemeInput) + Send + Sync>;

/// Handle returned when registering a [`ThemeListener`], used to remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What the bridge needs from the host's theme service.
pub trait ThemeService: Send + Sync {
    /// The theme currently active in the host.
    fn color_theme(&self) -> Arc<ThemeInput>;

    /// Registers a listener called after each theme change.
    fn on_theme_change(&self, listener: ThemeListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// An in-process [`ThemeService`]: holds the current theme and notifies listeners
/// synchronously when it is replaced.
pub struct LocalThemeService {
    current: ArcSwap<ThemeInput>,
    listeners: papaya::HashMap<ListenerId, ThemeListener>,
    next_listener_id: AtomicU64,
}

impl LocalThemeService {
    pub fn new(theme: ThemeInput) -> Self {
        Self {
            current: ArcSwap::from_pointee(theme),
            listeners: papaya::HashMap::new(),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Replaces the current theme and notifies every listener.
    pub fn set_theme(&self, theme: ThemeInput) {
        let theme = Arc::new(theme);
        self.current.store(Arc::clone(&theme));

        // Don't hold the map guard while running listeners
        let listeners: Vec<ThemeListener> = self
            .listeners
            .pin()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        log::debug!(
            "Theme {:?} set, notifying {} listener(s)",
            theme.name(),
            listeners.len()
        );
        for listener in listeners {
            listener(&theme);
        }
    }

    /// Loads a theme file and makes it the current theme.
    ///
    /// On error, the current theme and the listeners are left untouched.
    pub fn set_theme_from_path(&self, path: impl AsRef<Path>) -> BridgeResult<()> {
        let theme = ThemeInput::load_from_file(path)?;
        self.set_theme(theme);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ThemeService for LocalThemeService {
    fn color_theme(&self) -> Arc<ThemeInput> {
        self.current.load_full()
    }

    fn on_theme_change(&self, listener: ThemeListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.pin().insert(id, listener);
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.pin().remove(&id);
    }
}

impl fmt::Debug for LocalThemeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalThemeService")
            .field("theme", &self.current.load().name())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Keeps a [`ThemeChannel`] subscribed to a theme service. Unsubscribes on drop.
#[must_use = "the channel stops following the theme service when the subscription is dropped"]
pub struct ThemeSubscription {
    service: Arc<dyn ThemeService>,
    id: ListenerId,
}

impl Drop for ThemeSubscription {
    fn drop(&mut self) {
        self.service.remove_listener(self.id);
    }
}

impl fmt::Debug for ThemeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSubscription").field("id", &self.id).finish()
    }
}

/// The current [`ThemeSnapshot`], swapped as a whole on every theme change.
///
/// Readers get an `Arc` to a complete snapshot and keep using it for as long as they hold
/// it: a tokenize call that started before an update finishes with the old snapshot.
/// Publishing never waits for readers.
#[derive(Debug)]
pub struct ThemeChannel {
    current: ArcSwap<ThemeSnapshot>,
    next_version: AtomicU64,
}

impl Default for ThemeChannel {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(ThemeSnapshot::default()),
            next_version: AtomicU64::new(1),
        }
    }
}

impl ThemeChannel {
    /// A channel with a fixed starting theme, version 0.
    pub fn new(theme: &ThemeInput) -> Self {
        Self {
            current: ArcSwap::from_pointee(ThemeSnapshot::new(theme, 0)),
            next_version: AtomicU64::new(1),
        }
    }

    /// Creates a channel following `service`, starting from its current theme.
    pub fn from_service<S: ThemeService + 'static>(
        service: Arc<S>,
    ) -> (Arc<ThemeChannel>, ThemeSubscription) {
        let channel = Arc::new(ThemeChannel::default());
        let subscription = channel.subscribe(service);
        (channel, subscription)
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<ThemeSnapshot> {
        self.current.load_full()
    }

    /// Converts the theme and makes it the current snapshot.
    ///
    /// If another publish with a newer version won the race, that one is kept.
    pub fn publish(&self, theme: &ThemeInput) -> Arc<ThemeSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        self.publish_version(theme, version)
    }

    /// Publishes the theme `service` has right now.
    ///
    /// The version is taken before reading the theme: a later version always reads a theme
    /// at least as recent.
    fn publish_current<S: ThemeService + ?Sized>(&self, service: &S) -> Arc<ThemeSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let theme = service.color_theme();
        self.publish_version(&theme, version)
    }

    fn publish_version(&self, theme: &ThemeInput, version: u64) -> Arc<ThemeSnapshot> {
        let snapshot = Arc::new(ThemeSnapshot::new(theme, version));
        self.current.rcu(|old| {
            if old.version() > snapshot.version() {
                Arc::clone(old)
            } else {
                Arc::clone(&snapshot)
            }
        });
        log::debug!(
            "Published theme snapshot v{version} ({} rules, {} palette colors)",
            snapshot.rules().len(),
            snapshot.palette().colors().count()
        );
        snapshot
    }

    /// Follows the theme changes of `service`, publishing its current theme right away.
    ///
    /// On every notification the channel reads the theme back from the service instead of
    /// using the notified one, so notifications delivered out of order can't leave it on
    /// an older theme.
    pub fn subscribe<S: ThemeService + 'static>(
        self: &Arc<Self>,
        service: Arc<S>,
    ) -> ThemeSubscription {
        // Neither side keeps the other alive through the listener
        let channel = Arc::downgrade(self);
        let weak_service = Arc::downgrade(&service);
        // Listen first: a change made before the first publish is not missed
        let id = service.on_theme_change(Arc::new(move |_: &ThemeInput| {
            if let (Some(channel), Some(service)) = (channel.upgrade(), weak_service.upgrade()) {
                channel.publish_current(service.as_ref());
            }
        }));
        self.publish_current(service.as_ref());
        ThemeSubscription { service, id }
    }
}
