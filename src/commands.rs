use std::fmt;

use crate::error::PlacementError;
use crate::view::{MoveReason, ViewContainerLocation, ViewId};
use crate::window::{PlacementManager, WindowOptions};

/// User-invokable placement actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementCommand {
    Float,
    DockToSidebar,
    DockToPanel,
    DockToAuxiliaryBar,
}

impl PlacementCommand {
    pub const ALL: [PlacementCommand; 4] = [
        PlacementCommand::Float,
        PlacementCommand::DockToSidebar,
        PlacementCommand::DockToPanel,
        PlacementCommand::DockToAuxiliaryBar,
    ];

    /// Stable identifier used when registering the command with a host.
    pub fn id(self) -> &'static str {
        match self {
            PlacementCommand::Float => "view.float",
            PlacementCommand::DockToSidebar => "view.dockToSidebar",
            PlacementCommand::DockToPanel => "view.dockToPanel",
            PlacementCommand::DockToAuxiliaryBar => "view.dockToAuxiliaryBar",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    pub fn dock_location(self) -> Option<ViewContainerLocation> {
        match self {
            PlacementCommand::Float => None,
            PlacementCommand::DockToSidebar => Some(ViewContainerLocation::Sidebar),
            PlacementCommand::DockToPanel => Some(ViewContainerLocation::Panel),
            PlacementCommand::DockToAuxiliaryBar => Some(ViewContainerLocation::AuxiliaryBar),
        }
    }

    pub fn dock_to(location: ViewContainerLocation) -> Self {
        match location {
            ViewContainerLocation::Sidebar => PlacementCommand::DockToSidebar,
            ViewContainerLocation::Panel => PlacementCommand::DockToPanel,
            ViewContainerLocation::AuxiliaryBar => PlacementCommand::DockToAuxiliaryBar,
        }
    }

    /// Run against `target`, or the focused view when `target` is `None`.
    ///
    /// Unresolvable targets and unknown views are silent no-ops; only
    /// collaborator failures come back as errors.
    pub async fn run(
        self,
        manager: &PlacementManager,
        target: Option<ViewId>,
    ) -> Result<(), PlacementError> {
        let Some(view_id) = target.or_else(|| manager.registry().focused_view()) else {
            tracing::debug!(command = self.id(), "no target view; ignoring");
            return Ok(());
        };
        match self.dock_location() {
            None => float_view(manager, &view_id).await,
            Some(location) => dock_view(manager, &view_id, location).await,
        }
    }
}

impl fmt::Display for PlacementCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlacementCommand::Float => "Float View",
            PlacementCommand::DockToSidebar => "Dock View to Sidebar",
            PlacementCommand::DockToPanel => "Dock View to Panel",
            PlacementCommand::DockToAuxiliaryBar => "Dock View to Secondary Side Bar",
        };
        write!(f, "{}", s)
    }
}

async fn float_view(manager: &PlacementManager, view_id: &ViewId) -> Result<(), PlacementError> {
    if let Some(panel) = manager.floating_panel_by_view(view_id) {
        panel.bring_to_front();
        return Ok(());
    }
    let Some(descriptor) = manager.registry().view_descriptor(view_id) else {
        tracing::debug!(view_id = %view_id, "float requested for unknown view");
        return Ok(());
    };
    let options = WindowOptions::new(manager.config().default_float_size);
    manager
        .open_floating_panel(view_id, Some(descriptor.name.as_str()), Some(options))
        .await?;
    Ok(())
}

async fn dock_view(
    manager: &PlacementManager,
    view_id: &ViewId,
    location: ViewContainerLocation,
) -> Result<(), PlacementError> {
    if let Some(panel) = manager.floating_panel_by_view(view_id) {
        return manager.dock_floating_panel(panel.id(), location).await;
    }
    match manager.registry().view_descriptor(view_id) {
        Some(descriptor) if descriptor.can_move_view => manager
            .registry()
            .move_view(&descriptor, location, MoveReason::Dock)
            .await
            .map_err(PlacementError::Relocation),
        _ => {
            tracing::debug!(view_id = %view_id, location = %location, "view cannot be docked; ignoring");
            Ok(())
        }
    }
}

/// Context menus the commands are contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuLocation {
    ViewTitle,
    ViewContainerTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub menu: MenuLocation,
    pub command: PlacementCommand,
    pub group: &'static str,
    pub order: usize,
}

/// Context-menu contributions: every command on both view titles and view
/// container titles, float first.
pub fn menu_entries() -> Vec<MenuEntry> {
    let mut entries = Vec::new();
    for menu in [MenuLocation::ViewTitle, MenuLocation::ViewContainerTitle] {
        for (order, command) in PlacementCommand::ALL.into_iter().enumerate() {
            let group = match command {
                PlacementCommand::Float => "placement_float",
                _ => "placement_dock",
            };
            entries.push(MenuEntry {
                menu,
                command,
                group,
                order,
            });
        }
    }
    entries
}
