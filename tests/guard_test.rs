/*!
 * Guard State Tests
 * Decision logic exercised on standalone state instances
 */

use pretty_assertions::assert_eq;
use sigshield::{GuardState, LogSink, Signal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_initial_state() {
    let state = GuardState::new();
    assert!(!state.is_active());
    assert!(!state.deferred_exit());
    assert!(state.stashed_signals().is_empty());
}

#[test]
fn test_signal_while_active_defers() {
    let state = GuardState::new();
    state.set_active(true);

    state.on_signal(Signal::SIGTERM);

    assert!(state.deferred_exit());
    assert!(state.is_active());
}

#[test]
fn test_multiple_signals_coalesce() {
    let state = GuardState::new();
    state.set_active(true);

    state.on_signal(Signal::SIGINT);
    state.on_signal(Signal::SIGTERM);
    state.on_signal(Signal::SIGHUP);

    // One boolean flag, however many signals arrived
    assert!(state.deferred_exit());
    state.set_deferred_exit(false);
    assert!(!state.deferred_exit());
}

#[test]
fn test_signal_while_inactive_terminates() {
    let state = GuardState::new();
    let fired = Arc::new(AtomicBool::new(false));
    let observed = fired.clone();
    state.set_exit_hook(Box::new(move || {
        observed.store(true, Ordering::SeqCst);
    }));

    state.on_signal(Signal::SIGTERM);

    assert!(fired.load(Ordering::SeqCst));
    assert!(!state.deferred_exit());
}

#[test]
fn test_manual_suppression() {
    let state = GuardState::new();
    state.set_active(true);
    state.on_signal(Signal::SIGINT);
    assert!(state.deferred_exit());

    state.set_deferred_exit(false);

    assert!(!state.deferred_exit());
}

#[test]
fn test_manual_forced_exit_flag() {
    let state = GuardState::new();
    state.set_active(true);

    state.set_deferred_exit(true);

    assert!(state.deferred_exit());
}

#[test]
fn test_override_replaces_default_logic() {
    let state = GuardState::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    state.register_override(Signal::SIGINT, move |signal| {
        assert_eq!(signal, Signal::SIGINT);
        counted.fetch_add(1, Ordering::SeqCst);
    });
    state.set_active(true);

    state.on_signal(Signal::SIGINT);

    // The override ran and the default flag-setting did not
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!state.deferred_exit());
}

#[test]
fn test_override_applies_while_inactive() {
    let state = GuardState::new();
    let fired = Arc::new(AtomicBool::new(false));
    let hook_observed = fired.clone();
    state.set_exit_hook(Box::new(move || {
        hook_observed.store(true, Ordering::SeqCst);
    }));
    state.register_override(Signal::SIGTERM, |_| {});

    state.on_signal(Signal::SIGTERM);

    // Override wins over the immediate-termination branch too
    assert!(!fired.load(Ordering::SeqCst));
}

#[test]
fn test_override_may_opt_back_into_deferral() {
    let state = Arc::new(GuardState::new());
    let handle = state.clone();
    state.register_override(Signal::SIGQUIT, move |_| {
        handle.set_deferred_exit(true);
    });

    state.set_active(true);
    state.on_signal(Signal::SIGQUIT);

    assert!(state.deferred_exit());
}

#[test]
fn test_override_persists_across_cycles() {
    let state = GuardState::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    state.register_override(Signal::SIGHUP, move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
    });

    state.set_active(true);
    state.on_signal(Signal::SIGHUP);
    state.set_active(false);
    state.set_active(true);
    state.on_signal(Signal::SIGHUP);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_override_restores_default() {
    let state = GuardState::new();
    state.register_override(Signal::SIGINT, |_| {});

    assert!(state.clear_override(Signal::SIGINT));
    assert!(!state.clear_override(Signal::SIGINT));

    state.set_active(true);
    state.on_signal(Signal::SIGINT);
    assert!(state.deferred_exit());
}

#[derive(Default)]
struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl LogSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("D {}", message));
    }

    fn info(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("I {}", message));
    }
}

#[test]
fn test_sink_records_registration() {
    let state = GuardState::new();
    let sink = Arc::new(RecordingSink::default());
    state.set_log_sink(sink.clone());

    state.register_override(Signal::SIGUSR1, |_| {});

    let lines = sink.lines.lock().unwrap();
    assert!(lines.iter().any(|l| l.contains("USR1")));
}

#[test]
fn test_absent_sink_is_silent() {
    let state = GuardState::new();
    state.register_override(Signal::SIGUSR1, |_| {});
    state.clear_log_sink();
    state.register_override(Signal::SIGUSR2, |_| {});
}
