/*!
 * Trap Registry
 * Reversible signal interception over the platform dispatch table
 */

use crate::dispatch;
use crate::state::GuardState;
use crate::types::{GuardError, GuardResult, Signal};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet};
use std::sync::Arc;

/// Installs the guard's dispatch trampoline and makes that reversible
///
/// Each install queries the disposition active immediately before and
/// stashes it; restore reinstates every stashed disposition exactly as
/// returned by the platform.
pub struct TrapRegistry {
    state: Arc<GuardState>,
}

impl TrapRegistry {
    pub fn new(state: Arc<GuardState>) -> Self {
        Self { state }
    }

    /// Install the dispatch trampoline for each signal, stashing the prior
    /// disposition
    ///
    /// Rejects `SIGKILL` and `SIGSTOP` before touching the dispatch table.
    /// Installing twice for the same signal without an intervening restore
    /// overwrites the stash with the trampoline itself, losing the true
    /// original disposition; callers must pair installs with restores.
    pub fn install_and_stash(&self, signals: &[Signal]) -> GuardResult<()> {
        for signal in signals {
            if !signal.can_catch() {
                return Err(GuardError::Uncatchable(*signal));
            }
        }

        // SA_RESTART so blocking calls inside the region resume instead of
        // failing with EINTR.
        let trap = SigAction::new(
            SigHandler::Handler(dispatch::trap_entry),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        for &signal in signals {
            let previous = unsafe { signal::sigaction(signal.as_nix(), &trap) }
                .map_err(|errno| GuardError::TrapInstall { signal, errno })?;
            self.state.stash(signal, previous);
            self.state
                .debug(&format!("Stashed previous handler for {}", signal));
        }
        Ok(())
    }

    /// Reinstate every stashed disposition and clear the stash
    ///
    /// Keeps going past individual failures and reports the first one.
    /// No-op when nothing is stashed.
    pub fn restore_all(&self) -> GuardResult<()> {
        let mut first_error = None;
        for (signal, previous) in self.state.drain_stash() {
            match unsafe { signal::sigaction(signal.as_nix(), &previous) } {
                Ok(_) => self
                    .state
                    .debug(&format!("Restored previous handler for {}", signal)),
                Err(errno) => {
                    self.state
                        .info(&format!("Failed to restore handler for {}: {}", signal, errno));
                    first_error.get_or_insert(GuardError::TrapRestore { signal, errno });
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
