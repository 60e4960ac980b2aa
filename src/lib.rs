/*!
 * Sigshield Library
 * Defers termination-class signals while a critical region runs
 */

pub mod controller;
mod dispatch;
pub mod logging;
pub mod state;
pub mod traps;
pub mod types;

// Re-export public API
pub use controller::ProtectionController;
pub use logging::{LogBridge, LogSink};
pub use state::{ExitHook, GuardState, OverrideFn};
pub use traps::TrapRegistry;
pub use types::{GuardError, GuardResult, Signal, DEFAULT_SIGNALS};
