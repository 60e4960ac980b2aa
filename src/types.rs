/*!
 * Guard Types
 * Portable signal identifiers and result types
 */

use nix::sys::signal::Signal as NixSignal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Guard operation result
pub type GuardResult<T> = Result<T, GuardError>;

/// Guard errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Unknown signal name: {0}")]
    UnknownSignal(String),

    #[error("Invalid signal number: {0}")]
    InvalidSignal(i32),

    #[error("Signal {0} cannot be trapped")]
    Uncatchable(Signal),

    #[error("Failed to install trap for {signal}: {errno}")]
    TrapInstall {
        signal: Signal,
        errno: nix::errno::Errno,
    },

    #[error("Failed to restore handler for {signal}: {errno}")]
    TrapRestore {
        signal: Signal,
        errno: nix::errno::Errno,
    },
}

/// Signals protected when the caller supplies none: interrupt, terminate,
/// hang-up, quit.
pub const DEFAULT_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGHUP,
    Signal::SIGQUIT,
];

/// Portable UNIX signal identifiers
///
/// Numbering is delegated to the platform; variants carry no hardcoded
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Hangup detected on controlling terminal
    SIGHUP,
    /// Interrupt from keyboard (Ctrl+C)
    SIGINT,
    /// Quit from keyboard (Ctrl+\)
    SIGQUIT,
    /// Abort signal
    SIGABRT,
    /// Kill signal (cannot be caught or ignored)
    SIGKILL,
    /// User-defined signal 1
    SIGUSR1,
    /// User-defined signal 2
    SIGUSR2,
    /// Broken pipe
    SIGPIPE,
    /// Timer signal
    SIGALRM,
    /// Termination signal
    SIGTERM,
    /// Child process stopped or terminated
    SIGCHLD,
    /// Continue if stopped
    SIGCONT,
    /// Stop process (cannot be caught or ignored)
    SIGSTOP,
    /// Stop typed at terminal (Ctrl+Z)
    SIGTSTP,
    /// Terminal input for background process
    SIGTTIN,
    /// Terminal output for background process
    SIGTTOU,
    /// Window resize signal
    SIGWINCH,
}

impl Signal {
    /// Parse a signal name; accepts "INT", "SIGINT" and any casing
    pub fn from_name(name: &str) -> GuardResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let short = upper.strip_prefix("SIG").unwrap_or(&upper);
        match short {
            "HUP" => Ok(Signal::SIGHUP),
            "INT" => Ok(Signal::SIGINT),
            "QUIT" => Ok(Signal::SIGQUIT),
            "ABRT" => Ok(Signal::SIGABRT),
            "KILL" => Ok(Signal::SIGKILL),
            "USR1" => Ok(Signal::SIGUSR1),
            "USR2" => Ok(Signal::SIGUSR2),
            "PIPE" => Ok(Signal::SIGPIPE),
            "ALRM" => Ok(Signal::SIGALRM),
            "TERM" => Ok(Signal::SIGTERM),
            "CHLD" => Ok(Signal::SIGCHLD),
            "CONT" => Ok(Signal::SIGCONT),
            "STOP" => Ok(Signal::SIGSTOP),
            "TSTP" => Ok(Signal::SIGTSTP),
            "TTIN" => Ok(Signal::SIGTTIN),
            "TTOU" => Ok(Signal::SIGTTOU),
            "WINCH" => Ok(Signal::SIGWINCH),
            _ => Err(GuardError::UnknownSignal(name.to_string())),
        }
    }

    /// Get the short name ("INT", "TERM", ...)
    pub fn name(&self) -> &'static str {
        match self {
            Signal::SIGHUP => "HUP",
            Signal::SIGINT => "INT",
            Signal::SIGQUIT => "QUIT",
            Signal::SIGABRT => "ABRT",
            Signal::SIGKILL => "KILL",
            Signal::SIGUSR1 => "USR1",
            Signal::SIGUSR2 => "USR2",
            Signal::SIGPIPE => "PIPE",
            Signal::SIGALRM => "ALRM",
            Signal::SIGTERM => "TERM",
            Signal::SIGCHLD => "CHLD",
            Signal::SIGCONT => "CONT",
            Signal::SIGSTOP => "STOP",
            Signal::SIGTSTP => "TSTP",
            Signal::SIGTTIN => "TTIN",
            Signal::SIGTTOU => "TTOU",
            Signal::SIGWINCH => "WINCH",
        }
    }

    /// Convert from the platform signal number
    pub fn from_number(n: i32) -> GuardResult<Self> {
        let nix = NixSignal::try_from(n).map_err(|_| GuardError::InvalidSignal(n))?;
        Self::from_nix(nix).ok_or(GuardError::InvalidSignal(n))
    }

    /// Get the platform signal number
    pub fn number(&self) -> i32 {
        self.as_nix() as i32
    }

    /// Check if signal can be caught/blocked
    pub fn can_catch(&self) -> bool {
        !matches!(self, Signal::SIGKILL | Signal::SIGSTOP)
    }

    /// Convert to the platform signal type
    pub fn as_nix(&self) -> NixSignal {
        match self {
            Signal::SIGHUP => NixSignal::SIGHUP,
            Signal::SIGINT => NixSignal::SIGINT,
            Signal::SIGQUIT => NixSignal::SIGQUIT,
            Signal::SIGABRT => NixSignal::SIGABRT,
            Signal::SIGKILL => NixSignal::SIGKILL,
            Signal::SIGUSR1 => NixSignal::SIGUSR1,
            Signal::SIGUSR2 => NixSignal::SIGUSR2,
            Signal::SIGPIPE => NixSignal::SIGPIPE,
            Signal::SIGALRM => NixSignal::SIGALRM,
            Signal::SIGTERM => NixSignal::SIGTERM,
            Signal::SIGCHLD => NixSignal::SIGCHLD,
            Signal::SIGCONT => NixSignal::SIGCONT,
            Signal::SIGSTOP => NixSignal::SIGSTOP,
            Signal::SIGTSTP => NixSignal::SIGTSTP,
            Signal::SIGTTIN => NixSignal::SIGTTIN,
            Signal::SIGTTOU => NixSignal::SIGTTOU,
            Signal::SIGWINCH => NixSignal::SIGWINCH,
        }
    }

    fn from_nix(nix: NixSignal) -> Option<Self> {
        match nix {
            NixSignal::SIGHUP => Some(Signal::SIGHUP),
            NixSignal::SIGINT => Some(Signal::SIGINT),
            NixSignal::SIGQUIT => Some(Signal::SIGQUIT),
            NixSignal::SIGABRT => Some(Signal::SIGABRT),
            NixSignal::SIGKILL => Some(Signal::SIGKILL),
            NixSignal::SIGUSR1 => Some(Signal::SIGUSR1),
            NixSignal::SIGUSR2 => Some(Signal::SIGUSR2),
            NixSignal::SIGPIPE => Some(Signal::SIGPIPE),
            NixSignal::SIGALRM => Some(Signal::SIGALRM),
            NixSignal::SIGTERM => Some(Signal::SIGTERM),
            NixSignal::SIGCHLD => Some(Signal::SIGCHLD),
            NixSignal::SIGCONT => Some(Signal::SIGCONT),
            NixSignal::SIGSTOP => Some(Signal::SIGSTOP),
            NixSignal::SIGTSTP => Some(Signal::SIGTSTP),
            NixSignal::SIGTTIN => Some(Signal::SIGTTIN),
            NixSignal::SIGTTOU => Some(Signal::SIGTTOU),
            NixSignal::SIGWINCH => Some(Signal::SIGWINCH),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_forms() {
        assert_eq!(Signal::from_name("INT").unwrap(), Signal::SIGINT);
        assert_eq!(Signal::from_name("SIGINT").unwrap(), Signal::SIGINT);
        assert_eq!(Signal::from_name("int").unwrap(), Signal::SIGINT);
        assert_eq!(Signal::from_name("sigterm").unwrap(), Signal::SIGTERM);
        assert_eq!(Signal::from_name(" HUP ").unwrap(), Signal::SIGHUP);
        assert!(matches!(
            Signal::from_name("NOPE"),
            Err(GuardError::UnknownSignal(_))
        ));
    }

    #[test]
    fn test_number_round_trip() {
        assert_eq!(
            Signal::from_number(Signal::SIGTERM.number()).unwrap(),
            Signal::SIGTERM
        );
        assert!(matches!(
            Signal::from_number(0),
            Err(GuardError::InvalidSignal(0))
        ));
    }

    #[test]
    fn test_catchability() {
        assert!(!Signal::SIGKILL.can_catch());
        assert!(!Signal::SIGSTOP.can_catch());
        assert!(Signal::SIGTERM.can_catch());
        assert!(Signal::SIGUSR1.can_catch());
    }

    #[test]
    fn test_default_list() {
        let names: Vec<&str> = DEFAULT_SIGNALS.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["INT", "TERM", "HUP", "QUIT"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Signal::SIGQUIT.to_string(), "QUIT");
    }
}
