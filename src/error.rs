// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Tether return `error::Result<T>`.  Malformed
// native notifications are NOT errors: translators drop them early and never
// surface anything to the host.  Everything here is either reported once to
// the caller (fatal initialization) or logged and absorbed by the caller.

use thiserror::Error;

/// Every error that Tether can produce.
#[derive(Debug, Error)]
pub enum TetherError {
    /// A native toolkit call reported failure.
    #[error("{function} failed (error {code:#010x})")]
    Native {
        /// The name of the failing native function, for display purposes.
        function: &'static str,
        /// The raw status / error code returned by the toolkit.
        code: u32,
    },

    /// A standard I/O error (settings file read or write, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file could not be encoded or decoded.
    #[error("settings error: {0}")]
    Config(#[from] serde_json::Error),

    /// The rendering context could not be created or validated.
    #[error("unable to initialize video driver: {0}")]
    ContextCreation(String),

    /// The visual subsystem could not be brought up.
    #[error("visual subsystem failed to start: {0}")]
    VisualInit(String),

    /// An operation was issued in a lifecycle state that does not allow it.
    #[error("{operation} is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// A context operation requires the context to be current on this thread.
    #[error("rendering context is not current")]
    ContextNotCurrent,

    /// The context is current on a different thread than the caller.
    #[error("rendering context is owned by another thread")]
    WrongThread,

    /// The operation has no implementation on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

// Convert a windows-crate error (HRESULT) directly into a TetherError so that
// `?` can be used on `windows::core::Result<T>` throughout the Win32 backend.
#[cfg(windows)]
impl From<windows::core::Error> for TetherError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Native {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TetherError>;
