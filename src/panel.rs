use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::event::Subscription;
use crate::view::ViewId;
use crate::window::{ContainerHandle, FloatingWindow};

/// Process-unique floating panel id. Allocated by the placement manager from
/// a monotonically increasing counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One view hosted in its own top-level window.
///
/// The panel owns its window: closing the panel destroys the window and
/// removes the panel from its manager, whether or not the window has
/// delivered its unload notification yet. Once closed a panel never reopens.
pub struct FloatingPanel {
    id: PanelId,
    view_id: ViewId,
    title: String,
    window: Arc<dyn FloatingWindow>,
    container: ContainerHandle,
    closed: AtomicBool,
    docking: AtomicBool,
    unload: Mutex<Option<Subscription>>,
    on_close: Mutex<Option<CloseHook>>,
}

pub(crate) type CloseHook = Box<dyn FnOnce() + Send>;

impl FloatingPanel {
    pub(crate) fn new(
        id: PanelId,
        view_id: ViewId,
        title: String,
        window: Arc<dyn FloatingWindow>,
    ) -> Self {
        let container = window.container();
        Self {
            id,
            view_id,
            title,
            window,
            container,
            closed: AtomicBool::new(false),
            docking: AtomicBool::new(false),
            unload: Mutex::new(None),
            on_close: Mutex::new(None),
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn container(&self) -> ContainerHandle {
        self.container
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Raise the window. Does nothing once the panel is closed.
    pub fn bring_to_front(&self) {
        if self.is_closed() {
            tracing::debug!(panel_id = %self.id, "bring_to_front on closed panel ignored");
            return;
        }
        self.window.focus();
    }

    /// Destroy the window and hand the panel back to its manager. Repeated
    /// calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(panel_id = %self.id, view_id = %self.view_id, "destroying floating window");
        self.window.destroy();
        // the window may deliver its unload notification later, or never
        if let Some(hook) = self.take_close_hook() {
            hook();
        }
    }

    pub(crate) fn window(&self) -> &Arc<dyn FloatingWindow> {
        &self.window
    }

    pub(crate) fn set_unload_subscription(&self, subscription: Subscription) {
        if let Ok(mut slot) = self.unload.lock() {
            *slot = Some(subscription);
        }
    }

    pub(crate) fn set_close_hook(&self, hook: CloseHook) {
        if let Ok(mut slot) = self.on_close.lock() {
            *slot = Some(hook);
        }
    }

    fn take_close_hook(&self) -> Option<CloseHook> {
        self.on_close.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Claim the panel for a dock. Only the first caller gets `true`.
    pub(crate) fn begin_dock(&self) -> bool {
        !self.is_closed() && !self.docking.swap(true, Ordering::SeqCst)
    }

    /// Mark closed and release the unload listener and close hook. Called
    /// from the manager's cleanup after the panel has left both indexes.
    pub(crate) fn finish_close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let subscription = self.unload.lock().ok().and_then(|mut slot| slot.take());
        if let Some(subscription) = subscription {
            subscription.dispose();
        }
        drop(self.take_close_hook());
    }
}

impl fmt::Debug for FloatingPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingPanel")
            .field("id", &self.id)
            .field("view_id", &self.view_id)
            .field("title", &self.title)
            .field("container", &self.container)
            .field("closed", &self.is_closed())
            .finish()
    }
}
