//! Logging setup on top of `tracing`.
//!
//! Call sites emit events with `module` and `event` fields so that JSON
//! output stays grep-able by the same keys across the crate.

use tracing_subscriber::EnvFilter;

use super::config::LogCfg;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` when a subscriber was already installed (tests, embedding).
pub fn init(cfg: &LogCfg) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cfg.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        let cfg = LogCfg::default();
        init(&cfg);
        assert!(!init(&cfg));
        tracing::error!(module = "log", event = "after_reinit", "still routed");
    }
}
