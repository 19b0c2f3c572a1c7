//! Float views into their own top-level windows and dock them back.
//!
//! [`PlacementManager`] owns the floating state; the window system and the
//! view registry plug in through [`WindowProvider`] and [`ViewRegistry`].
//! [`PlacementCommand`] implements the user-facing float and dock actions on
//! top of it.

pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod panel;
pub mod script;
pub mod sim;
pub mod tracing_sub;
pub mod view;
pub mod window;

pub use commands::{MenuEntry, MenuLocation, PlacementCommand, menu_entries};
pub use config::PlacementConfig;
pub use error::{PlacementError, RegistryError, WindowError};
pub use event::{Emitter, Subscription};
pub use panel::{FloatingPanel, PanelId};
pub use view::{MoveReason, ViewContainerLocation, ViewDescriptor, ViewId, ViewRegistry};
pub use window::{
    ContainerHandle, FloatingWindow, PlacementManager, WindowOptions, WindowProvider, WindowSize,
};
