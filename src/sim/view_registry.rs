use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::view::{MoveReason, ViewContainerLocation, ViewDescriptor, ViewId, ViewRegistry};

/// One `move_view` call as the registry saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub view_id: ViewId,
    pub location: ViewContainerLocation,
    pub reason: MoveReason,
}

#[derive(Debug)]
struct RegisteredView {
    descriptor: ViewDescriptor,
    location: ViewContainerLocation,
}

#[derive(Debug, Default)]
struct RegistryState {
    views: BTreeMap<ViewId, RegisteredView>,
    focused: Option<ViewId>,
    moves: Vec<RecordedMove>,
    fail_moves: bool,
    move_yields: usize,
}

/// View registry backed by a map. Records every relocation it performs.
#[derive(Debug, Default)]
pub struct InMemoryViewRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(&self, descriptor: ViewDescriptor, location: ViewContainerLocation) {
        tracing::debug!(view_id = %descriptor.id, location = %location, "registered view");
        self.state().views.insert(
            descriptor.id.clone(),
            RegisteredView {
                descriptor,
                location,
            },
        );
    }

    pub fn set_focused(&self, view_id: Option<ViewId>) {
        self.state().focused = view_id;
    }

    /// Make every subsequent `move_view` fail until switched off again.
    pub fn set_fail_moves(&self, fail: bool) {
        self.state().fail_moves = fail;
    }

    /// Number of times `move_view` yields to the scheduler before it
    /// relocates anything.
    pub fn set_move_yields(&self, yields: usize) {
        self.state().move_yields = yields;
    }

    pub fn location_of(&self, view_id: &ViewId) -> Option<ViewContainerLocation> {
        self.state().views.get(view_id).map(|view| view.location)
    }

    pub fn moves(&self) -> Vec<RecordedMove> {
        self.state().moves.clone()
    }

    pub fn descriptors(&self) -> Vec<(ViewDescriptor, ViewContainerLocation)> {
        self.state()
            .views
            .values()
            .map(|view| (view.descriptor.clone(), view.location))
            .collect()
    }
}

#[async_trait]
impl ViewRegistry for InMemoryViewRegistry {
    fn view_descriptor(&self, view_id: &ViewId) -> Option<ViewDescriptor> {
        self.state()
            .views
            .get(view_id)
            .map(|view| view.descriptor.clone())
    }

    async fn move_view(
        &self,
        descriptor: &ViewDescriptor,
        location: ViewContainerLocation,
        reason: MoveReason,
    ) -> Result<(), RegistryError> {
        let yields = self.state().move_yields;
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        let mut state = self.state();
        if state.fail_moves {
            return Err(RegistryError::Other(format!(
                "move of `{}` rejected",
                descriptor.id
            )));
        }
        let Some(view) = state.views.get_mut(&descriptor.id) else {
            return Err(RegistryError::UnknownView(descriptor.id.clone()));
        };
        if !view.descriptor.can_move_view {
            return Err(RegistryError::Refused {
                view: descriptor.id.clone(),
                location,
            });
        }
        view.location = location;
        state.moves.push(RecordedMove {
            view_id: descriptor.id.clone(),
            location,
            reason,
        });
        tracing::debug!(view_id = %descriptor.id, location = %location, reason = %reason, "moved view");
        Ok(())
    }

    fn focused_view(&self) -> Option<ViewId> {
        self.state().focused.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn move_updates_location_and_records() {
        let registry = InMemoryViewRegistry::new();
        let explorer = ViewDescriptor::new("explorer", "Explorer");
        registry.register(explorer.clone(), ViewContainerLocation::Sidebar);
        registry
            .move_view(&explorer, ViewContainerLocation::Panel, MoveReason::Drag)
            .await
            .unwrap();
        assert_eq!(
            registry.location_of(&explorer.id),
            Some(ViewContainerLocation::Panel)
        );
        assert_eq!(
            registry.moves(),
            vec![RecordedMove {
                view_id: explorer.id.clone(),
                location: ViewContainerLocation::Panel,
                reason: MoveReason::Drag,
            }]
        );
    }

    #[tokio::test]
    async fn fixed_and_unknown_views_are_rejected() {
        let registry = InMemoryViewRegistry::new();
        let outline = ViewDescriptor::new("outline", "Outline").with_can_move_view(false);
        registry.register(outline.clone(), ViewContainerLocation::Sidebar);
        assert!(matches!(
            registry
                .move_view(&outline, ViewContainerLocation::Panel, MoveReason::Dock)
                .await,
            Err(RegistryError::Refused { .. })
        ));
        let ghost = ViewDescriptor::new("ghost", "Ghost");
        assert_eq!(
            registry
                .move_view(&ghost, ViewContainerLocation::Panel, MoveReason::Dock)
                .await,
            Err(RegistryError::UnknownView(ghost.id.clone()))
        );
        assert!(registry.moves().is_empty());
    }
}
