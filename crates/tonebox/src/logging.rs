#![forbid(unsafe_code)]

//! Log subscriber setup.
//!
//! The library crates only emit `tracing` events and spans. Applications that
//! want them printed call [`init`] once at startup. The filter is read from
//! `TONEBOX_LOG` using `EnvFilter` directive syntax, e.g.
//! `TONEBOX_LOG=tonebox_widgets=trace,info`.
//!
//! With the `tracing-json` feature the subscriber writes JSON lines instead
//! of human-readable text.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Environment variable holding the filter directives.
pub const ENV_VAR: &str = "TONEBOX_LOG";

/// Directives used when `TONEBOX_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Filter from `TONEBOX_LOG`, falling back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init() -> Result<()> {
    init_with_filter(env_filter())
}

/// Install the global subscriber with an explicit filter.
pub fn init_with_filter(filter: EnvFilter) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    #[cfg(feature = "tracing-json")]
    let installed = builder.json().try_init();
    #[cfg(not(feature = "tracing-json"))]
    let installed = builder.try_init();

    installed.map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_parses() {
        assert!(EnvFilter::try_new("tonebox_widgets=trace,info").is_ok());
        assert!(EnvFilter::try_new("tonebox_widgets=loud").is_err());
    }

    #[test]
    fn default_directives_are_valid() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
    }
}
