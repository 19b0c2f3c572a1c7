//! Shared crate-wide constants.

/// Width (logical units) of the window opened by the float command.
pub const DEFAULT_FLOAT_WIDTH: u32 = 500;

/// Height (logical units) of the window opened by the float command.
pub const DEFAULT_FLOAT_HEIGHT: u32 = 400;

/// Smallest width a floating window is opened with.
///
/// Used as the window size when a caller supplies no options at all, and as
/// the lower clamp for explicit sizes so a floating view always keeps enough
/// room for its title bar and some content.
pub const MIN_FLOATING_WIDTH: u32 = 320;

/// Smallest height a floating window is opened with. See
/// [`MIN_FLOATING_WIDTH`].
pub const MIN_FLOATING_HEIGHT: u32 = 240;
