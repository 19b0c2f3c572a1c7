mod placement_manager;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WindowError;
use crate::event::Subscription;

pub use placement_manager::PlacementManager;

/// Window size in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Grow each dimension to at least the matching dimension of `min`.
    pub fn at_least(self, min: WindowSize) -> Self {
        Self {
            width: self.width.max(min.width),
            height: self.height.max(min.height),
        }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: Option<String>,
    pub size: WindowSize,
}

impl WindowOptions {
    pub fn new(size: WindowSize) -> Self {
        Self { title: None, size }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Rendering region a window hands out at creation. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle(u64);

impl ContainerHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub type UnloadListener = Box<dyn Fn() + Send + Sync>;

/// A live top-level window.
///
/// Implementations must fire unload listeners exactly once per window, when
/// the window is destroyed or closed by the user. The notification may arrive
/// during `destroy` or at any point after it.
pub trait FloatingWindow: Send + Sync + fmt::Debug {
    fn on_unload(&self, listener: UnloadListener) -> Subscription;

    /// True once the window has been destroyed or closed by the user, even
    /// if its unload notification has not been delivered yet.
    fn is_destroyed(&self) -> bool;

    /// Ask the platform to raise and focus the window.
    fn focus(&self);

    fn destroy(&self);

    fn container(&self) -> ContainerHandle;
}

#[async_trait]
pub trait WindowProvider: Send + Sync {
    async fn open(&self, options: WindowOptions) -> Result<Arc<dyn FloatingWindow>, WindowError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_clamps_each_axis_independently() {
        let min = WindowSize::new(320, 240);
        assert_eq!(WindowSize::new(100, 600).at_least(min), WindowSize::new(320, 600));
        assert_eq!(WindowSize::new(800, 600).at_least(min), WindowSize::new(800, 600));
        assert_eq!(WindowSize::new(0, 0).at_least(min), min);
    }
}
