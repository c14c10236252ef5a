//! Logging setup

use env_logger::Env;

/// Install `env_logger`, honouring `RUST_LOG` and falling back to `default_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
