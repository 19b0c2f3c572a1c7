//! View identity and the registry contract the placement manager consults.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::RegistryError;

/// Opaque view identifier. Validation is the registry's business; here it is
/// only a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ViewId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub id: ViewId,
    pub name: String,
    /// Whether the registry allows this view to leave its current container.
    pub can_move_view: bool,
}

impl ViewDescriptor {
    pub fn new(id: impl Into<ViewId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            can_move_view: true,
        }
    }

    pub fn with_can_move_view(mut self, can_move_view: bool) -> Self {
        self.can_move_view = can_move_view;
        self
    }
}

/// Container regions a view can be docked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewContainerLocation {
    Sidebar,
    Panel,
    AuxiliaryBar,
}

impl ViewContainerLocation {
    pub const ALL: [ViewContainerLocation; 3] = [
        ViewContainerLocation::Sidebar,
        ViewContainerLocation::Panel,
        ViewContainerLocation::AuxiliaryBar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewContainerLocation::Sidebar => "sidebar",
            ViewContainerLocation::Panel => "panel",
            ViewContainerLocation::AuxiliaryBar => "auxiliarybar",
        }
    }
}

impl fmt::Display for ViewContainerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown container location `{0}` (expected sidebar, panel or auxiliarybar)")]
pub struct ParseLocationError(pub String);

impl FromStr for ViewContainerLocation {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sidebar" => Ok(ViewContainerLocation::Sidebar),
            "panel" => Ok(ViewContainerLocation::Panel),
            "auxiliarybar" | "auxiliary-bar" | "auxbar" => Ok(ViewContainerLocation::AuxiliaryBar),
            _ => Err(ParseLocationError(s.to_string())),
        }
    }
}

/// Why a relocation was requested. Passed through to the registry so it can
/// pick different feedback for explicit docks and drag-and-drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveReason {
    Dock,
    Drag,
}

impl fmt::Display for MoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveReason::Dock => f.write_str("dock"),
            MoveReason::Drag => f.write_str("drag"),
        }
    }
}

/// Owner of view metadata and container placement.
#[async_trait]
pub trait ViewRegistry: Send + Sync {
    fn view_descriptor(&self, view_id: &ViewId) -> Option<ViewDescriptor>;

    async fn move_view(
        &self,
        descriptor: &ViewDescriptor,
        location: ViewContainerLocation,
        reason: MoveReason,
    ) -> Result<(), RegistryError>;

    /// The view that currently has keyboard focus, if any.
    fn focused_view(&self) -> Option<ViewId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_parses_case_insensitively() {
        assert_eq!(
            "Sidebar".parse::<ViewContainerLocation>(),
            Ok(ViewContainerLocation::Sidebar)
        );
        assert_eq!(
            "auxiliary-bar".parse::<ViewContainerLocation>(),
            Ok(ViewContainerLocation::AuxiliaryBar)
        );
        assert!("editor".parse::<ViewContainerLocation>().is_err());
        for location in ViewContainerLocation::ALL {
            assert_eq!(location.as_str().parse(), Ok(location));
        }
    }

    #[test]
    fn descriptor_defaults_to_movable() {
        let d = ViewDescriptor::new("explorer", "Explorer");
        assert!(d.can_move_view);
        assert!(!d.with_can_move_view(false).can_move_view);
    }
}
