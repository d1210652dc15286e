// ── Win32 platform implementation ─────────────────────────────────────────────
//
// This is the only module in the codebase where `unsafe` code is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

pub mod window; // window class, WndProc translation, message pump

pub(crate) mod dpi; // per-monitor DPI awareness
pub(crate) mod gl; // WGL rendering surface
pub(crate) mod keys; // virtual-key re-encoding

pub use window::{pump, show_error_dialog, Win32Toolkit, Win32Window};
