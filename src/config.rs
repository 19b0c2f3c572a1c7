use crate::constants::{
    DEFAULT_FLOAT_HEIGHT, DEFAULT_FLOAT_WIDTH, MIN_FLOATING_HEIGHT, MIN_FLOATING_WIDTH,
};
use crate::window::{WindowOptions, WindowSize};

/// Sizing policy for floating windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Size requested by the float command.
    pub default_float_size: WindowSize,
    /// Size used when no options are given; also the lower bound for
    /// explicit sizes.
    pub min_window_size: WindowSize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_float_size: WindowSize::new(DEFAULT_FLOAT_WIDTH, DEFAULT_FLOAT_HEIGHT),
            min_window_size: WindowSize::new(MIN_FLOATING_WIDTH, MIN_FLOATING_HEIGHT),
        }
    }
}

impl PlacementConfig {
    /// Final options handed to the window provider. An explicit `title`
    /// wins over one carried in `options`.
    pub fn resolve_window_options(
        &self,
        title: Option<&str>,
        options: Option<WindowOptions>,
    ) -> WindowOptions {
        let mut resolved = match options {
            Some(options) => WindowOptions {
                size: options.size.at_least(self.min_window_size),
                ..options
            },
            None => WindowOptions::new(self.min_window_size),
        };
        if let Some(title) = title {
            resolved.title = Some(title.to_string());
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_fall_back_to_minimum_size() {
        let cfg = PlacementConfig::default();
        let opts = cfg.resolve_window_options(None, None);
        assert_eq!(opts.size, cfg.min_window_size);
        assert_eq!(opts.title, None);
    }

    #[test]
    fn explicit_title_overrides_options_title() {
        let cfg = PlacementConfig::default();
        let opts = cfg.resolve_window_options(
            Some("Explorer"),
            Some(WindowOptions::new(WindowSize::new(10, 900)).with_title("old")),
        );
        assert_eq!(opts.title.as_deref(), Some("Explorer"));
        assert_eq!(opts.size, WindowSize::new(MIN_FLOATING_WIDTH, 900));
    }
}
