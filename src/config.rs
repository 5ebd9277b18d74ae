//! Connection settings for the record store.
//!
//! Settings come from command-line flags, falling back to environment
//! variables and then to the defaults below:
//!
//! ```bash
//! # Point the client at another deployment
//! CITYTEMP_API_BASE="https://weather.example.com"
//!
//! # Give slow servers more time (humantime syntax)
//! CITYTEMP_TIMEOUT=30s
//! ```

use std::time::Duration;

use clap::Args;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the record store
    #[arg(long, env = "CITYTEMP_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Request timeout, e.g. `10s` or `1m`
    #[arg(
        long,
        env = "CITYTEMP_TIMEOUT",
        default_value_t = humantime::Duration::from(DEFAULT_TIMEOUT)
    )]
    pub timeout: humantime::Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_API_BASE),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<ConnectionArgs> for ClientConfig {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            base_url: args.api_base,
            timeout: args.timeout.into(),
        }
    }
}
