//! Subscriber lists with individually revocable subscriptions.
//!
//! An [`Emitter`] holds the listeners for one event. Each call to
//! [`Emitter::subscribe`] returns a [`Subscription`]; disposing (or dropping)
//! it removes exactly that listener. Listeners are invoked outside the
//! internal lock so they may subscribe, unsubscribe or fire re-entrantly.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

pub struct Emitter<T> {
    inner: Arc<Mutex<Listeners<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = match self.inner.lock() {
            Ok(mut listeners) => {
                let id = listeners.next_id;
                listeners.next_id = id.wrapping_add(1);
                listeners.entries.push((id, Arc::new(listener)));
                id
            }
            Err(_) => return Subscription::empty(),
        };
        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade()
                && let Ok(mut listeners) = inner.lock()
            {
                listeners.entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Invoke every listener registered at the time of the call.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = match self.inner.lock() {
            Ok(listeners) => listeners.entries.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .map(|listeners| listeners.entries.len())
            .unwrap_or(0)
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.inner.lock().map(|l| l.entries.len()).unwrap_or(0);
        f.debug_struct("Emitter").field("listeners", &count).finish()
    }
}

/// Handle to a registered listener. The listener stays registered until the
/// subscription is disposed or dropped.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(dispose: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to revoke.
    pub fn empty() -> Self {
        Self { dispose: None }
    }

    pub fn dispose(mut self) {
        self.run_dispose();
    }

    fn run_dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}
