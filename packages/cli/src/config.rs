//! CLI configuration, populated from environment variables.

use std::path::PathBuf;

/// Runtime configuration for the `sigchain` CLI.
///
/// All fields are populated from environment variables with sensible
/// defaults, so the CLI works with zero configuration. Flags given on the
/// command line take precedence.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SIGCHAIN_KEYS` | `./sigchain-keys.json` | Exported key file used for signing |
/// | `SIGCHAIN_LOG` | `sigchain=warn` | `tracing` filter directive |
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Path of the exported key file.
    pub keys_path: PathBuf,

    /// Log filter, in `tracing_subscriber::EnvFilter` syntax.
    pub log_filter: String,
}

pub const KEYS_ENV: &str = "SIGCHAIN_KEYS";
pub const LOG_ENV: &str = "SIGCHAIN_LOG";
pub const DEFAULT_KEYS_PATH: &str = "./sigchain-keys.json";
pub const DEFAULT_LOG_FILTER: &str = "sigchain=warn";

impl CliConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            keys_path: lookup(KEYS_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_PATH)),
            log_filter: lookup(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
        }
    }

    /// Override the key file path with a command-line flag, if given.
    pub fn with_keys_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(p) = path {
            self.keys_path = p;
        }
        self
    }
}
