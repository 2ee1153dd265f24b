use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeResult, Error};

/// The continuation state threaded from one line to the next within a buffer.
///
/// The content belongs to the grammar engine that produced it: the bridge only carries it
/// around. [`StateStack::INITIAL`] starts every buffer. Two states are equal when they are
/// the very same state, which lets hosts stop re-tokenizing once a line ends in the state
/// it had before an edit.
#[derive(Clone, Default)]
pub struct StateStack {
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl StateStack {
    /// The state before the first line of any buffer
    pub const INITIAL: StateStack = StateStack { inner: None };

    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self {
            inner: Some(Arc::new(state)),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.inner.is_none()
    }

    /// The engine state, if this is not `INITIAL` and holds a `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.downcast_ref::<T>()
    }

    /// For grammar engines: `Ok(None)` for `INITIAL`, `Ok(Some(state))` for one of their
    /// states and an error for a state coming from something else.
    pub fn engine_state<T: Any>(&self) -> BridgeResult<Option<&T>> {
        match self.inner.as_deref() {
            None => Ok(None),
            Some(state) => state.downcast_ref::<T>().map(Some).ok_or_else(|| {
                Error::InvalidState(format!("expected a state of type {}", type_name::<T>()))
            }),
        }
    }
}

impl PartialEq for StateStack {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl Eq for StateStack {}

impl fmt::Debug for StateStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => write!(f, "StateStack(INITIAL)"),
            Some(state) => write!(f, "StateStack({:p})", Arc::as_ptr(state)),
        }
    }
}
