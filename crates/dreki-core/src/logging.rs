//! Logger setup.
//!
//! The crate itself only talks to the `log` facade. Binaries and examples
//! call [`init`] once at startup to route records to stderr via env_logger.

use crate::config::CoreConfig;

/// Install env_logger using the config's filter, or `RUST_LOG` when the
/// config has none. Calling it again is harmless.
pub fn init(config: &CoreConfig) {
    let mut builder = match &config.log_filter {
        Some(filter) => {
            let mut builder = env_logger::Builder::new();
            builder.parse_filters(filter);
            builder
        }
        None => env_logger::Builder::from_default_env(),
    };
    if builder.try_init().is_err() {
        log::debug!("logger already initialised");
    }
}
