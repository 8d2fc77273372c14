//! # phoenix-log
//!
//! Logging setup shared by the PhoenixCoder client crates. The libraries
//! only emit `tracing` events; binaries and tests pick a subscriber here.
//!
//! ```rust,no_run
//! fn main() -> phoenix_log::LogResult<()> {
//!     let _guard = phoenix_log::auto_init()?;
//!     tracing::info!("client started");
//!     Ok(())
//! }
//! ```
//!
//! Environment variables read by [`Config::from_env`]:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `PHOENIX_LOG` / `RUST_LOG` | filter directive |
//! | `PHOENIX_LOG_FORMAT` | `pretty`, `compact` or `json` |
//! | `PHOENIX_LOG_COLORS`, `PHOENIX_LOG_TIME`, `PHOENIX_LOG_SOURCE` | display flags |
//! | `PHOENIX_SERVICE`, `PHOENIX_ENV`, `PHOENIX_VERSION` | global fields |

mod builder;
pub mod config;
mod error;

pub use builder::{BoxedLayer, LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Fields, Format, Writer};
pub use error::{LogError, LogResult};

/// Installs the default logger (compact, `info`).
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Picks a configuration for the current process.
///
/// An explicit `PHOENIX_LOG` or `RUST_LOG` selects [`Config::from_env`].
/// Otherwise debug builds use [`Config::development`] and release builds
/// [`Config::production`].
pub fn auto_init() -> LogResult<LoggerGuard> {
    let explicit = [config::LEVEL_VAR, "RUST_LOG"]
        .iter()
        .any(|key| std::env::var_os(key).is_some());
    let config = if explicit {
        Config::from_env()
    } else if cfg!(debug_assertions) {
        Config::development()
    } else {
        Config::production()
    };
    init_with(config)
}

/// Installs the test logger once per process. Later calls are no-ops.
pub fn init_test() {
    // The test preset carries no global fields, so the guard holds nothing.
    match init_with(Config::test()) {
        Ok(_) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => eprintln!("phoenix-log: test logger not installed: {e}"),
    }
}

pub mod prelude {
    pub use crate::{Config, Format, LogError, LogResult, LoggerBuilder, LoggerGuard};
    pub use tracing::{debug, error, info, trace, warn};
}
