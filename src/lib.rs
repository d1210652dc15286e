// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 / WGL
// FFI).  Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Window and input bridge between a native windowing toolkit and a host
//! engine.  Native notifications go in, normalized input events and
//! lifecycle signals come out, and the host drives window chrome and the
//! rendering context through [`coordinator::Platform`].

pub mod collab;
pub mod config;
pub mod coordinator;
pub mod cursor;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod logging;
pub mod message;
pub mod platform;
pub mod replay;
pub mod video;

pub use coordinator::{Platform, PlatformState};
pub use error::{Result, TetherError};
