/*!
 * Guard Logging
 * Injectable log capability with a bridge to the log facade
 */

/// Two-level logging capability
///
/// The guard reports state transitions and handler stash/restore through
/// this trait. No sink installed means no output.
pub trait LogSink: Send + Sync {
    /// Record a debug-level message
    fn debug(&self, message: &str);

    /// Record an info-level message
    fn info(&self, message: &str);
}

/// Sink that forwards to the `log` facade
///
/// Hosts that already run `env_logger` or another `log` backend install
/// this to collect guard records alongside their own.
pub struct LogBridge;

impl LogSink for LogBridge {
    fn debug(&self, message: &str) {
        log::debug!(target: "sigshield", "{}", message);
    }

    fn info(&self, message: &str) {
        log::info!(target: "sigshield", "{}", message);
    }
}
