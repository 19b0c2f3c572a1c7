use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::WindowError;
use crate::event::{Emitter, Subscription};
use crate::window::{ContainerHandle, FloatingWindow, UnloadListener, WindowOptions, WindowProvider};

/// A window that only exists in memory.
pub struct VirtualWindow {
    container: ContainerHandle,
    options: WindowOptions,
    destroyed: AtomicBool,
    deferred_unload: AtomicBool,
    pending_unload: AtomicBool,
    destroy_calls: AtomicUsize,
    focus_calls: AtomicUsize,
    unload: Emitter<()>,
}

impl VirtualWindow {
    pub fn new(container: ContainerHandle, options: WindowOptions) -> Self {
        Self {
            container,
            options,
            destroyed: AtomicBool::new(false),
            deferred_unload: AtomicBool::new(false),
            pending_unload: AtomicBool::new(false),
            destroy_calls: AtomicUsize::new(0),
            focus_calls: AtomicUsize::new(0),
            unload: Emitter::new(),
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn destroy_count(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    pub fn focus_count(&self) -> usize {
        self.focus_calls.load(Ordering::SeqCst)
    }

    pub fn unload_listener_count(&self) -> usize {
        self.unload.listener_count()
    }

    /// When set, `destroy` marks the window destroyed but holds the unload
    /// notification back until [`deliver_pending_unload`](Self::deliver_pending_unload).
    pub fn set_deferred_unload(&self, deferred: bool) {
        self.deferred_unload.store(deferred, Ordering::SeqCst);
    }

    pub fn has_pending_unload(&self) -> bool {
        self.pending_unload.load(Ordering::SeqCst)
    }

    /// Fire an unload notification held back by a deferred `destroy`.
    pub fn deliver_pending_unload(&self) {
        if self.pending_unload.swap(false, Ordering::SeqCst) {
            tracing::debug!(container = self.container.raw(), "delivering deferred unload");
            self.unload.fire(&());
        }
    }

    /// Close the window the way a user clicking the close button would,
    /// bypassing whoever owns it.
    pub fn simulate_user_close(&self) {
        tracing::debug!(container = self.container.raw(), "user closed virtual window");
        self.unload_once();
    }

    fn unload_once(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.unload.fire(&());
    }
}

impl FloatingWindow for VirtualWindow {
    fn on_unload(&self, listener: UnloadListener) -> Subscription {
        self.unload.subscribe(move |_| listener())
    }

    fn is_destroyed(&self) -> bool {
        VirtualWindow::is_destroyed(self)
    }

    fn focus(&self) {
        if self.is_destroyed() {
            return;
        }
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        if !self.deferred_unload.load(Ordering::SeqCst) {
            self.unload_once();
        } else if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.pending_unload.store(true, Ordering::SeqCst);
        }
    }

    fn container(&self) -> ContainerHandle {
        self.container
    }
}

impl fmt::Debug for VirtualWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualWindow")
            .field("container", &self.container)
            .field("options", &self.options)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Opens [`VirtualWindow`]s and remembers every one it handed out.
pub struct VirtualWindowProvider {
    next_container: AtomicU64,
    windows: Mutex<Vec<Arc<VirtualWindow>>>,
    failures: Mutex<VecDeque<WindowError>>,
    open_yields: AtomicUsize,
    deferred_unload: AtomicBool,
    close_next_on_open: AtomicBool,
}

impl VirtualWindowProvider {
    pub fn new() -> Self {
        Self {
            next_container: AtomicU64::new(1),
            windows: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            open_yields: AtomicUsize::new(0),
            deferred_unload: AtomicBool::new(false),
            close_next_on_open: AtomicBool::new(false),
        }
    }

    /// Make the next `open` call fail with `err`. Queued failures are
    /// consumed in order.
    pub fn fail_next_open(&self, err: WindowError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(err);
        }
    }

    /// Number of times `open` yields to the scheduler before completing,
    /// standing in for the latency of a real window system.
    pub fn set_open_yields(&self, yields: usize) {
        self.open_yields.store(yields, Ordering::SeqCst);
    }

    /// Windows opened from now on hold their unload notification back after
    /// `destroy` until [`deliver_pending_unloads`](Self::deliver_pending_unloads).
    pub fn set_deferred_unload(&self, deferred: bool) {
        self.deferred_unload.store(deferred, Ordering::SeqCst);
    }

    pub fn deliver_pending_unloads(&self) {
        for window in self.windows() {
            window.deliver_pending_unload();
        }
    }

    /// The next window is closed by the user before `open` hands it back.
    pub fn close_next_on_open(&self) {
        self.close_next_on_open.store(true, Ordering::SeqCst);
    }

    /// Every window opened so far, in creation order.
    pub fn windows(&self) -> Vec<Arc<VirtualWindow>> {
        self.windows
            .lock()
            .map(|windows| windows.clone())
            .unwrap_or_default()
    }

    pub fn open_count(&self) -> usize {
        self.windows.lock().map(|windows| windows.len()).unwrap_or(0)
    }

    pub fn live_windows(&self) -> Vec<Arc<VirtualWindow>> {
        self.windows()
            .into_iter()
            .filter(|window| !window.is_destroyed())
            .collect()
    }

    pub fn window_for(&self, container: ContainerHandle) -> Option<Arc<VirtualWindow>> {
        self.windows()
            .into_iter()
            .find(|window| window.container == container)
    }
}

impl Default for VirtualWindowProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowProvider for VirtualWindowProvider {
    async fn open(&self, options: WindowOptions) -> Result<Arc<dyn FloatingWindow>, WindowError> {
        for _ in 0..self.open_yields.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let failure = self
            .failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.pop_front());
        if let Some(err) = failure {
            return Err(err);
        }
        let container = ContainerHandle::new(self.next_container.fetch_add(1, Ordering::SeqCst));
        tracing::debug!(
            container = container.raw(),
            size = %options.size,
            title = options.title.as_deref().unwrap_or(""),
            "opened virtual window"
        );
        let window = Arc::new(VirtualWindow::new(container, options));
        window.set_deferred_unload(self.deferred_unload.load(Ordering::SeqCst));
        if let Ok(mut windows) = self.windows.lock() {
            windows.push(window.clone());
        }
        if self.close_next_on_open.swap(false, Ordering::SeqCst) {
            window.simulate_user_close();
        }
        Ok(window as Arc<dyn FloatingWindow>)
    }
}
