//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// `default_level` is used when `RUST_LOG` is not set. Calling this more than
/// once is harmless; only the first call installs the logger.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Initialize logging for unit tests (captured output, debug level)
#[cfg(test)]
pub fn init_for_tests() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
