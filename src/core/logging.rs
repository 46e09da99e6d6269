//! Diagnostic logging to stderr
//!
//! Filter directives come from `QCD_LOG`, then `RUST_LOG`. Without either,
//! only warnings are shown; `--verbose` raises the default to debug.
//! `QCD_LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "QCD_LOG";
pub const LOG_FORMAT_ENV: &str = "QCD_LOG_FORMAT";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "qcd=debug,info"
    } else {
        "warn"
    }
}

/// Build the filter from the environment, falling back to the default level
pub fn filter(verbose: bool) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };

    if result.is_ok() {
        tracing::debug!(json, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).contains("debug"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
