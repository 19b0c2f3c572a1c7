//! In-process collaborators.
//!
//! [`VirtualWindowProvider`] and [`InMemoryViewRegistry`] implement the
//! window and registry contracts without a real windowing system. The
//! `view-dock` binary runs its scripts against them and the tests use them to
//! observe what the placement manager asked for.

mod view_registry;
mod window_provider;

pub use view_registry::{InMemoryViewRegistry, RecordedMove};
pub use window_provider::{VirtualWindow, VirtualWindowProvider};
