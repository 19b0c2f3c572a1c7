use std::io;

use tracing::Level;

/// Install the stderr subscriber at INFO. See [`init`].
pub fn init_default() {
    init(Level::INFO);
}

/// Initialize a compact tracing subscriber on stderr, leaving stdout to
/// script output. Safe to call multiple times; subsequent calls are no-ops
/// for the global subscriber.
pub fn init(max_level: Level) {
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init(Level::DEBUG);
        init_default();
        tracing::debug!("subscriber installed");
    }
}
