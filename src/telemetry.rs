// Logging setup
//
// RUST_LOG drives the filter (default "info"); CHURCH_LOG_JSON switches the
// fmt layer to JSON lines. Logs go to stderr so table output on stdout stays
// clean, and are muted while the TUI owns the terminal.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static MUTED: AtomicBool = AtomicBool::new(false);

pub fn init(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: a second call (tests, embedded use) keeps the first subscriber
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .try_init()
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

/// Drop log lines while set (alternate screen active)
pub fn set_muted(muted: bool) {
    MUTED.store(muted, Ordering::Relaxed);
}

pub fn is_muted() -> bool {
    MUTED.load(Ordering::Relaxed)
}

fn writer() -> Box<dyn io::Write> {
    if is_muted() {
        Box::new(io::sink())
    } else {
        Box::new(io::stderr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_toggle() {
        set_muted(true);
        assert!(is_muted());
        set_muted(false);
        assert!(!is_muted());
    }
}
