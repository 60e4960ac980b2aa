/*!
 * Signal Dispatch
 * The trampoline registered with the platform and the state it consults
 */

use crate::state::GuardState;
use crate::types::Signal;
use nix::libc::c_int;
use std::sync::{Arc, OnceLock};

static PROCESS_GUARD: OnceLock<Arc<GuardState>> = OnceLock::new();

/// The process-wide guard state consulted by the trampoline
pub(crate) fn process_state() -> Arc<GuardState> {
    PROCESS_GUARD
        .get_or_init(|| Arc::new(GuardState::new()))
        .clone()
}

/// Entry point the platform invokes on signal delivery
///
/// Signal-handler context: converts the raw number and hands off to the
/// decision logic. Unknown numbers are ignored.
pub(crate) extern "C" fn trap_entry(signum: c_int) {
    if let Some(state) = PROCESS_GUARD.get() {
        if let Ok(signal) = Signal::from_number(signum) {
            state.on_signal(signal);
        }
    }
}
