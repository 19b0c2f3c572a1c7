//! Error types shared by the placement manager and its collaborators.

use thiserror::Error;

use crate::view::{ViewContainerLocation, ViewId};

/// Failure reported by a [`WindowProvider`](crate::window::WindowProvider)
/// when it cannot open a top-level window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window provider rejected the request: {0}")]
    Rejected(String),
    #[error("window provider is unavailable")]
    Unavailable,
    #[error("window was closed before it could host a view")]
    ClosedBeforeReady,
}

/// Failure reported by a [`ViewRegistry`](crate::view::ViewRegistry) when a
/// relocation request cannot be honoured.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("view `{0}` is not registered")]
    UnknownView(ViewId),
    #[error("view `{view}` cannot be moved to {location}")]
    Refused {
        view: ViewId,
        location: ViewContainerLocation,
    },
    #[error("view registry error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("failed to open floating window: {0}")]
    WindowCreation(#[source] WindowError),
    #[error("failed to relocate view: {0}")]
    Relocation(#[source] RegistryError),
}
