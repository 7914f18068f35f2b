//! Tracing subscriber setup for the binary.
//!
//! Stdout carries audio data, so all log output goes to stderr.

use tracing_subscriber::EnvFilter;

/// Maps `-q` / `-v` counts to a base filter level.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags. Calling this twice is harmless.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            env!("CARGO_PKG_NAME"),
            level_for(verbose, quiet)
        ))
    });

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_warn() {
        assert_eq!(level_for(0, false), "warn");
    }

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(1, false), "info");
        assert_eq!(level_for(2, false), "debug");
        assert_eq!(level_for(5, false), "debug");
    }

    #[test]
    fn quiet_wins() {
        assert_eq!(level_for(0, true), "error");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(0, true);
        init_logging(2, false);
    }
}
