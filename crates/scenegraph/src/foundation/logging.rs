//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG`; calling it twice is harmless (the second call is ignored).
pub fn init() {
    let _ = env_logger::builder().try_init();
}
