//! Diagnostic logging setup.
//!
//! Logs go to stderr so table output on stdout stays clean. `RUST_LOG` wins when
//! set; otherwise the `-v` count picks the level.

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "sigmax=warn",
        1 => "sigmax=info",
        2 => "sigmax=debug",
        _ => "sigmax=trace",
    }
}

/// Install the global subscriber. Calling this twice is a no-op.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "sigmax=warn");
        assert_eq!(default_directive(2), "sigmax=debug");
        assert_eq!(default_directive(9), "sigmax=trace");
    }

    #[test]
    fn init_is_idempotent() {
        init(0);
        init(3);
    }
}
