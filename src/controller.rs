/*!
 * Protection Controller
 * Public surface for opening and closing protected regions
 */

use crate::dispatch;
use crate::logging::LogSink;
use crate::state::{ExitHook, GuardState};
use crate::traps::TrapRegistry;
use crate::types::{GuardResult, Signal, DEFAULT_SIGNALS};
use std::mem;
use std::sync::Arc;

/// Controller over the process-wide guard state
///
/// Every controller handle shares the same underlying state; the signal
/// dispatch consults that state no matter which handle opened the region.
///
/// Two calling shapes share one implementation: explicit
/// [`enter`](Self::enter)/[`exit_guard`](Self::exit_guard), and the scoped
/// [`protect`](Self::protect) which guarantees the exit step on every path
/// out of the region.
pub struct ProtectionController {
    state: Arc<GuardState>,
    traps: TrapRegistry,
}

impl ProtectionController {
    pub fn new() -> Self {
        let state = dispatch::process_state();
        let traps = TrapRegistry::new(state.clone());
        Self { state, traps }
    }

    /// Open a protected region
    ///
    /// An empty slice protects [`DEFAULT_SIGNALS`]. Installs the dispatch
    /// trampoline for each signal and stashes the prior dispositions, then
    /// clears the deferred-exit flag and marks the region active.
    ///
    /// Calling again without an intervening [`exit_guard`](Self::exit_guard)
    /// re-stashes the trampoline itself for signals common to both calls,
    /// losing their true original dispositions.
    pub fn enter(&self, signals: &[Signal]) -> GuardResult<()> {
        let signals = if signals.is_empty() {
            &DEFAULT_SIGNALS[..]
        } else {
            signals
        };
        self.state
            .debug(&format!("Protect requested for [{}]", join_names(signals)));

        self.traps.install_and_stash(signals)?;
        self.state.set_deferred_exit(false);
        self.state.set_active(true);
        self.state.info("Protection active");
        Ok(())
    }

    /// Run `region` inside a protected region, always closing it
    ///
    /// Equivalent to [`enter`](Self::enter) followed by `region` with a
    /// guaranteed [`exit_guard`](Self::exit_guard) on every exit path; a
    /// panic unwinding out of `region` closes the guard first and then
    /// propagates.
    pub fn protect<R>(&self, signals: &[Signal], region: impl FnOnce() -> R) -> GuardResult<R> {
        self.enter(signals)?;
        let cleanup = ExitOnDrop { controller: self };
        let output = region();
        mem::forget(cleanup);
        self.exit_guard()?;
        Ok(output)
    }

    /// Close the protected region
    ///
    /// Marks the region inactive, then honors a deferred exit by invoking
    /// the termination collaborator (the default does not return); with no
    /// deferral pending, restores every stashed handler. Closing while
    /// already inactive restores an empty stash, a no-op.
    pub fn exit_guard(&self) -> GuardResult<()> {
        self.state.debug("Unprotect requested");
        self.state.set_active(false);

        if self.state.deferred_exit() {
            self.state
                .info("Exiting: termination was requested during the protected region");
            self.state.terminate();
            // Reached only when an installed exit hook declined to end the
            // process; stashed handlers stay in place.
            return Ok(());
        }
        self.traps.restore_all()
    }

    /// True while a protected region is open
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// True once a protected signal arrived during the active region
    pub fn deferred_exit(&self) -> bool {
        self.state.deferred_exit()
    }

    /// Force or suppress the pending termination
    ///
    /// `false` after a catch cancels the pending exit; `true` makes the
    /// next [`exit_guard`](Self::exit_guard) terminate even without a
    /// caught signal.
    pub fn set_deferred_exit(&self, value: bool) {
        self.state.set_deferred_exit(value);
    }

    /// Signals whose prior dispositions are currently stashed
    pub fn stashed_signals(&self) -> Vec<Signal> {
        self.state.stashed_signals()
    }

    /// Register a callback replacing the default logic for one signal
    ///
    /// See [`GuardState::register_override`].
    pub fn register_override<F>(&self, signal: Signal, callback: F)
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        self.state.register_override(signal, callback);
    }

    /// Remove a per-signal override; returns whether one was present
    pub fn clear_override(&self, signal: Signal) -> bool {
        self.state.clear_override(signal)
    }

    /// Install the log sink
    pub fn set_log_sink(&self, sink: Arc<dyn LogSink>) {
        self.state.set_log_sink(sink);
    }

    /// Remove the log sink
    pub fn clear_log_sink(&self) {
        self.state.clear_log_sink();
    }

    /// Replace the termination collaborator
    ///
    /// See [`GuardState::set_exit_hook`].
    pub fn set_exit_hook(&self, hook: ExitHook) {
        self.state.set_exit_hook(hook);
    }

    /// Remove the termination collaborator, restoring the default
    pub fn clear_exit_hook(&self) {
        self.state.clear_exit_hook();
    }
}

impl Default for ProtectionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the guard when dropped; disarmed by `mem::forget` on the
/// non-panicking path so restore errors surface to the caller
struct ExitOnDrop<'a> {
    controller: &'a ProtectionController,
}

impl Drop for ExitOnDrop<'_> {
    fn drop(&mut self) {
        let _ = self.controller.exit_guard();
    }
}

fn join_names(signals: &[Signal]) -> String {
    signals
        .iter()
        .map(Signal::name)
        .collect::<Vec<_>>()
        .join(", ")
}
