use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::Mutex as AsyncMutex;

use super::{WindowOptions, WindowProvider};
use crate::config::PlacementConfig;
use crate::error::{PlacementError, WindowError};
use crate::event::{Emitter, Subscription};
use crate::panel::{FloatingPanel, PanelId};
use crate::view::{MoveReason, ViewContainerLocation, ViewId, ViewRegistry};

/// Panels indexed by id (authoritative) and by view id (derived). Both maps
/// are only ever changed together. Lookups skip a panel that is already
/// closed but not yet removed.
#[derive(Default)]
struct PanelStore {
    by_id: BTreeMap<PanelId, Arc<FloatingPanel>>,
    by_view: HashMap<ViewId, PanelId>,
}

impl PanelStore {
    fn insert(&mut self, panel: Arc<FloatingPanel>) {
        self.by_view.insert(panel.view_id().clone(), panel.id());
        self.by_id.insert(panel.id(), panel);
    }

    fn remove(&mut self, id: PanelId) -> Option<Arc<FloatingPanel>> {
        let panel = self.by_id.remove(&id)?;
        if self.by_view.get(panel.view_id()) == Some(&id) {
            self.by_view.remove(panel.view_id());
        }
        Some(panel)
    }

    fn get(&self, id: PanelId) -> Option<Arc<FloatingPanel>> {
        self.by_id.get(&id).filter(|panel| !panel.is_closed()).cloned()
    }

    fn get_by_view(&self, view_id: &ViewId) -> Option<Arc<FloatingPanel>> {
        self.by_view.get(view_id).and_then(|id| self.get(*id))
    }

    fn snapshot(&self) -> Vec<Arc<FloatingPanel>> {
        self.by_id
            .values()
            .filter(|panel| !panel.is_closed())
            .cloned()
            .collect()
    }
}

struct ManagerInner {
    registry: Arc<dyn ViewRegistry>,
    windows: Arc<dyn WindowProvider>,
    config: PlacementConfig,
    next_panel_id: AtomicU64,
    store: Mutex<PanelStore>,
    // one gate per view with a float request in progress
    in_flight: Mutex<HashMap<ViewId, Arc<AsyncMutex<()>>>>,
    did_open: Emitter<Arc<FloatingPanel>>,
    did_close: Emitter<Arc<FloatingPanel>>,
}

impl ManagerInner {
    fn store(&self) -> MutexGuard<'_, PanelStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lease_gate(&self, view_id: &ViewId) -> GateLease<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let gate = in_flight
            .entry(view_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        GateLease {
            inner: self,
            view_id: view_id.clone(),
            gate,
        }
    }

    /// Shared teardown for explicit closes and external window closes.
    /// Whichever trigger arrives first does the work; later ones find the
    /// panel gone and return.
    fn handle_panel_unloaded(&self, id: PanelId) {
        let Some(panel) = self.store().remove(id) else {
            return;
        };
        panel.finish_close();
        tracing::debug!(panel_id = %id, view_id = %panel.view_id(), "floating panel closed");
        self.did_close.fire(&panel);
    }
}

/// Callback that routes a panel's teardown back to the manager, if the
/// manager is still alive.
fn unloaded_callback(
    inner: &Arc<ManagerInner>,
    id: PanelId,
) -> impl Fn() + Send + Sync + 'static {
    let weak: Weak<ManagerInner> = Arc::downgrade(inner);
    move || {
        if let Some(inner) = weak.upgrade() {
            inner.handle_panel_unloaded(id);
        }
    }
}

/// Holds a per-view gate for the duration of one float request and drops the
/// map entry once nobody else is waiting on it.
struct GateLease<'a> {
    inner: &'a ManagerInner,
    view_id: ViewId,
    gate: Arc<AsyncMutex<()>>,
}

impl Drop for GateLease<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // map entry + this lease
        if Arc::strong_count(&self.gate) == 2 {
            in_flight.remove(&self.view_id);
        }
    }
}

/// Sole authority over which views are floating.
///
/// Window creation is delegated to the [`WindowProvider`] and container
/// relocation to the [`ViewRegistry`]. At most one floating panel exists per
/// view id; concurrent float requests for the same view resolve to the same
/// panel. Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct PlacementManager {
    inner: Arc<ManagerInner>,
}

impl PlacementManager {
    pub fn new(
        registry: Arc<dyn ViewRegistry>,
        windows: Arc<dyn WindowProvider>,
        config: PlacementConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                registry,
                windows,
                config,
                next_panel_id: AtomicU64::new(1),
                store: Mutex::new(PanelStore::default()),
                in_flight: Mutex::new(HashMap::new()),
                did_open: Emitter::new(),
                did_close: Emitter::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<dyn ViewRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.inner.config
    }

    /// Float `view_id` into its own window, or raise the window it already
    /// has.
    ///
    /// The open event fires only when a new panel is created. A window
    /// provider failure is returned unchanged and leaves no trace in the
    /// manager, as does a window that is closed before the panel is
    /// registered.
    pub async fn open_floating_panel(
        &self,
        view_id: &ViewId,
        title: Option<&str>,
        options: Option<WindowOptions>,
    ) -> Result<Arc<FloatingPanel>, PlacementError> {
        if let Some(existing) = self.raise_existing(view_id) {
            return Ok(existing);
        }
        let lease = self.inner.lease_gate(view_id);
        let _guard = lease.gate.lock().await;
        // another request may have finished while we waited on the gate
        if let Some(existing) = self.raise_existing(view_id) {
            return Ok(existing);
        }

        let options = self.inner.config.resolve_window_options(title, options);
        let size = options.size;
        let window = match self.inner.windows.open(options).await {
            Ok(window) => window,
            Err(err) => {
                tracing::warn!(view_id = %view_id, error = %err, "failed to open floating window");
                return Err(PlacementError::WindowCreation(err));
            }
        };

        let id = PanelId::new(self.inner.next_panel_id.fetch_add(1, Ordering::Relaxed));
        let title = title.map_or_else(|| view_id.to_string(), str::to_string);
        let panel = Arc::new(FloatingPanel::new(id, view_id.clone(), title, window));

        let subscription = panel
            .window()
            .on_unload(Box::new(unloaded_callback(&self.inner, id)));
        panel.set_unload_subscription(subscription);
        panel.set_close_hook(Box::new(unloaded_callback(&self.inner, id)));

        {
            // an unload racing this check waits on the store and then
            // removes the panel we insert
            let mut store = self.inner.store();
            if panel.window().is_destroyed() {
                drop(store);
                panel.finish_close();
                tracing::warn!(panel_id = %id, view_id = %view_id, "floating window closed before it was ready");
                return Err(PlacementError::WindowCreation(WindowError::ClosedBeforeReady));
            }
            store.insert(panel.clone());
        }

        tracing::debug!(panel_id = %id, view_id = %view_id, size = %size, "opened floating panel");
        self.inner.did_open.fire(&panel);
        Ok(panel)
    }

    fn raise_existing(&self, view_id: &ViewId) -> Option<Arc<FloatingPanel>> {
        let existing = self.floating_panel_by_view(view_id)?;
        tracing::debug!(panel_id = %existing.id(), view_id = %view_id, "view already floating; raising");
        existing.bring_to_front();
        Some(existing)
    }

    /// Close the panel's window. Unknown ids are ignored.
    pub fn close_floating_panel(&self, id: PanelId) {
        let Some(panel) = self.floating_panel(id) else {
            tracing::debug!(panel_id = %id, "close requested for unknown panel");
            return;
        };
        // the panel's close hook removes it from the store
        panel.close();
    }

    pub fn floating_panel(&self, id: PanelId) -> Option<Arc<FloatingPanel>> {
        self.inner.store().get(id)
    }

    pub fn floating_panel_by_view(&self, view_id: &ViewId) -> Option<Arc<FloatingPanel>> {
        self.inner.store().get_by_view(view_id)
    }

    /// Snapshot of every open panel, ordered by id.
    pub fn all_floating_panels(&self) -> Vec<Arc<FloatingPanel>> {
        self.inner.store().snapshot()
    }

    pub fn is_view_floating(&self, view_id: &ViewId) -> bool {
        self.inner.store().get_by_view(view_id).is_some()
    }

    /// Move the panel's view into `location` and close the panel.
    ///
    /// Relocation is only requested when the registry reports the view as
    /// movable. The panel is closed whatever the outcome; a relocation
    /// error is returned after the close. A dock of a panel that is already
    /// being docked returns at once.
    pub async fn dock_floating_panel(
        &self,
        id: PanelId,
        location: ViewContainerLocation,
    ) -> Result<(), PlacementError> {
        let Some(panel) = self.floating_panel(id) else {
            tracing::debug!(panel_id = %id, "dock requested for unknown panel");
            return Ok(());
        };
        if !panel.begin_dock() {
            tracing::debug!(panel_id = %id, "panel is already being docked");
            return Ok(());
        }
        let registry = &self.inner.registry;
        let moved = match registry.view_descriptor(panel.view_id()) {
            Some(descriptor) if descriptor.can_move_view => registry
                .move_view(&descriptor, location, MoveReason::Dock)
                .await
                .map_err(PlacementError::Relocation),
            Some(_) => {
                tracing::debug!(view_id = %panel.view_id(), "view is not movable; skipping relocation");
                Ok(())
            }
            None => {
                tracing::debug!(view_id = %panel.view_id(), "view not registered; skipping relocation");
                Ok(())
            }
        };
        if let Err(err) = &moved {
            tracing::warn!(panel_id = %id, location = %location, error = %err, "relocation failed");
        }
        self.close_floating_panel(id);
        tracing::debug!(panel_id = %id, location = %location, "docked floating panel");
        moved
    }

    pub fn on_did_open_floating_panel<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<FloatingPanel>) + Send + Sync + 'static,
    {
        self.inner.did_open.subscribe(listener)
    }

    pub fn on_did_close_floating_panel<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<FloatingPanel>) + Send + Sync + 'static,
    {
        self.inner.did_close.subscribe(listener)
    }

    /// Close every remaining panel. Call once at application teardown.
    pub fn shutdown(&self) {
        let panels = self.all_floating_panels();
        tracing::debug!(count = panels.len(), "closing remaining floating panels");
        for panel in panels {
            self.close_floating_panel(panel.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{InMemoryViewRegistry, VirtualWindowProvider};
    use crate::view::ViewDescriptor;
    use crate::window::{ContainerHandle, WindowSize};
    use std::sync::atomic::AtomicUsize;

    fn setup() -> (
        PlacementManager,
        Arc<InMemoryViewRegistry>,
        Arc<VirtualWindowProvider>,
    ) {
        let registry = Arc::new(InMemoryViewRegistry::new());
        registry.register(
            ViewDescriptor::new("explorer", "Explorer"),
            ViewContainerLocation::Sidebar,
        );
        let windows = Arc::new(VirtualWindowProvider::new());
        let manager =
            PlacementManager::new(registry.clone(), windows.clone(), PlacementConfig::default());
        (manager, registry, windows)
    }

    fn counter(
        manager: &PlacementManager,
    ) -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Vec<Subscription>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let o = opened.clone();
        let c = closed.clone();
        let subs = vec![
            manager.on_did_open_floating_panel(move |_| {
                o.fetch_add(1, Ordering::SeqCst);
            }),
            manager.on_did_close_floating_panel(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        ];
        (opened, closed, subs)
    }

    #[test]
    fn store_keeps_both_indexes_in_step() {
        let window = Arc::new(crate::sim::VirtualWindow::new(
            ContainerHandle::new(1),
            WindowOptions::new(WindowSize::new(1, 1)),
        ));
        let panel = Arc::new(FloatingPanel::new(
            PanelId::new(3),
            ViewId::from("a"),
            "A".into(),
            window,
        ));
        let mut store = PanelStore::default();
        store.insert(panel);
        assert!(store.get_by_view(&ViewId::from("a")).is_some());
        assert!(store.remove(PanelId::new(3)).is_some());
        assert!(store.by_view.is_empty());
        assert!(store.remove(PanelId::new(3)).is_none());
    }

    #[test]
    fn store_hides_closed_panels_until_removed() {
        let window = Arc::new(crate::sim::VirtualWindow::new(
            ContainerHandle::new(1),
            WindowOptions::new(WindowSize::new(1, 1)),
        ));
        window.set_deferred_unload(true);
        let panel = Arc::new(FloatingPanel::new(
            PanelId::new(4),
            ViewId::from("a"),
            "A".into(),
            window,
        ));
        let mut store = PanelStore::default();
        store.insert(panel.clone());
        panel.close();
        assert!(store.get(PanelId::new(4)).is_none());
        assert!(store.get_by_view(&ViewId::from("a")).is_none());
        assert!(store.snapshot().is_empty());
        assert!(store.remove(PanelId::new(4)).is_some());
    }

    #[tokio::test]
    async fn gate_entry_is_dropped_after_request() {
        let (manager, _registry, _windows) = setup();
        let view = ViewId::from("explorer");
        manager.open_floating_panel(&view, None, None).await.unwrap();
        assert!(manager.inner.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unload_listener_is_released_on_close() {
        let (manager, _registry, windows) = setup();
        let panel = manager
            .open_floating_panel(&ViewId::from("explorer"), None, None)
            .await
            .unwrap();
        let window = windows.windows().pop().unwrap();
        assert_eq!(window.unload_listener_count(), 1);
        manager.close_floating_panel(panel.id());
        assert_eq!(window.unload_listener_count(), 0);
    }

    #[tokio::test]
    async fn close_listener_may_query_manager() {
        let (manager, _registry, _windows) = setup();
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let seen2 = seen.clone();
        let handle = manager.clone();
        let _sub = manager.on_did_close_floating_panel(move |_| {
            seen2.store(handle.all_floating_panels().len(), Ordering::SeqCst);
        });
        let panel = manager
            .open_floating_panel(&ViewId::from("explorer"), None, None)
            .await
            .unwrap();
        manager.close_floating_panel(panel.id());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_closes_everything() {
        let (manager, registry, _windows) = setup();
        registry.register(
            ViewDescriptor::new("search", "Search"),
            ViewContainerLocation::Sidebar,
        );
        let (_opened, closed, _subs) = counter(&manager);
        for view in ["explorer", "search"] {
            manager
                .open_floating_panel(&ViewId::from(view), None, None)
                .await
                .unwrap();
        }
        manager.shutdown();
        assert!(manager.all_floating_panels().is_empty());
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn title_defaults_to_view_id() {
        let (manager, _registry, windows) = setup();
        let panel = manager
            .open_floating_panel(&ViewId::from("explorer"), None, None)
            .await
            .unwrap();
        assert_eq!(panel.title(), "explorer");
        let window = windows.windows().pop().unwrap();
        assert_eq!(window.options().size, PlacementConfig::default().min_window_size);
    }
}
