//! Development-time tracing for debugging matches.
//!
//! Tracing goes to stderr and is filtered by `RUST_LOG`. Match narration and
//! the JSON match record are product output and are unaffected by it.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Falls back to `default_filter` if unset. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=werewolf=debug cargo run -- play --seed 7
/// ```
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

/// Filter used when `RUST_LOG` is unset: deaths, lynches and reveals while
/// playing, warnings only for the other commands.
pub fn default_filter(playing: bool) -> &'static str {
    if playing { "werewolf=info,warn" } else { "warn" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_surfaces_match_events() {
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
        assert_eq!(default_filter(false), "warn");
    }
}
