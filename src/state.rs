/*!
 * Guard State
 * Process-wide protection state and the per-signal decision logic
 */

use crate::logging::LogSink;
use crate::types::Signal;
use ahash::RandomState;
use arc_swap::{ArcSwap, ArcSwapOption};
use nix::sys::signal::SigAction;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Override callback invoked in place of the default defer/terminate logic
pub type OverrideFn = Arc<dyn Fn(Signal) + Send + Sync>;

/// Replacement for the default termination collaborator
pub type ExitHook = Box<dyn Fn() + Send + Sync>;

type OverrideTable = HashMap<Signal, OverrideFn, RandomState>;

/// Guard state shared between the controller and the signal dispatch
///
/// One instance exists per process for real trap handling; standalone
/// instances can be constructed to exercise the decision logic directly.
///
/// The fields read on the signal-handler path (`active`, `deferred_exit`,
/// the override table, the exit hook) use atomics or lock-free loads; the
/// stash and the log sink are only ever touched from normal context.
pub struct GuardState {
    active: AtomicBool,
    deferred_exit: AtomicBool,
    saved: Mutex<HashMap<Signal, SigAction, RandomState>>,
    overrides: ArcSwap<OverrideTable>,
    sink: Mutex<Option<Arc<dyn LogSink>>>,
    exit_hook: ArcSwapOption<ExitHook>,
}

impl GuardState {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            deferred_exit: AtomicBool::new(false),
            saved: Mutex::new(HashMap::default()),
            overrides: ArcSwap::from_pointee(OverrideTable::default()),
            sink: Mutex::new(None),
            exit_hook: ArcSwapOption::empty(),
        }
    }

    /// True while a protected region is open
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the protected region open or closed
    ///
    /// Normally driven by the controller; exposed so the decision logic
    /// can be exercised on a standalone instance.
    pub fn set_active(&self, value: bool) {
        self.active.store(value, Ordering::SeqCst);
    }

    /// True once a protected signal arrived during an active region
    pub fn deferred_exit(&self) -> bool {
        self.deferred_exit.load(Ordering::SeqCst)
    }

    /// Force or suppress the pending termination
    pub fn set_deferred_exit(&self, value: bool) {
        self.deferred_exit.store(value, Ordering::SeqCst);
    }

    /// Register a callback that fully replaces the default defer/terminate
    /// logic for one signal
    ///
    /// The table persists across protect/unprotect cycles. The callback
    /// runs in signal-handler context; it must restrict itself to
    /// async-signal-safe work.
    pub fn register_override<F>(&self, signal: Signal, callback: F)
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        let callback: OverrideFn = Arc::new(callback);
        self.overrides.rcu(|table| {
            let mut next = (**table).clone();
            next.insert(signal, callback.clone());
            next
        });
        self.debug(&format!("Registered override for {}", signal));
    }

    /// Remove a per-signal override; returns whether one was present
    pub fn clear_override(&self, signal: Signal) -> bool {
        let previous = self.overrides.rcu(|table| {
            let mut next = (**table).clone();
            next.remove(&signal);
            next
        });
        previous.contains_key(&signal)
    }

    /// Install the log sink
    pub fn set_log_sink(&self, sink: Arc<dyn LogSink>) {
        *self.sink.lock() = Some(sink);
    }

    /// Remove the log sink
    pub fn clear_log_sink(&self) {
        *self.sink.lock() = None;
    }

    /// Replace the termination collaborator
    ///
    /// The default terminates the process with `std::process::exit(0)`,
    /// which runs process exit handlers. An installed hook is invoked
    /// instead; if it returns, the guard treats termination as handled and
    /// leaves any stashed handlers in place.
    pub fn set_exit_hook(&self, hook: ExitHook) {
        self.exit_hook.store(Some(Arc::new(hook)));
    }

    /// Remove the termination collaborator, restoring the default
    pub fn clear_exit_hook(&self) {
        self.exit_hook.store(None);
    }

    /// Decide what a delivered signal does
    ///
    /// Runs in signal-handler context: flag stores, one lock-free table
    /// load, at most one pre-registered callback. No locks, no
    /// allocation, no logging.
    pub fn on_signal(&self, signal: Signal) {
        let overrides = self.overrides.load();
        if let Some(callback) = overrides.get(&signal) {
            callback(signal);
            return;
        }

        if self.active.load(Ordering::SeqCst) {
            self.deferred_exit.store(true, Ordering::SeqCst);
        } else {
            self.terminate();
        }
    }

    /// Invoke the termination collaborator
    pub(crate) fn terminate(&self) {
        if let Some(hook) = self.exit_hook.load_full() {
            hook();
            return;
        }
        process::exit(0);
    }

    /// Signals currently stashed
    pub fn stashed_signals(&self) -> Vec<Signal> {
        self.saved.lock().keys().copied().collect()
    }

    pub(crate) fn stash(&self, signal: Signal, previous: SigAction) {
        self.saved.lock().insert(signal, previous);
    }

    pub(crate) fn drain_stash(&self) -> Vec<(Signal, SigAction)> {
        self.saved.lock().drain().collect()
    }

    pub(crate) fn debug(&self, message: &str) {
        if let Some(sink) = &*self.sink.lock() {
            sink.debug(message);
        }
    }

    pub(crate) fn info(&self, message: &str) {
        if let Some(sink) = &*self.sink.lock() {
            sink.info(message);
        }
    }
}

impl Default for GuardState {
    fn default() -> Self {
        Self::new()
    }
}
