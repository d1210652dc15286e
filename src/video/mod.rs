// ── Video mode, window session and rendering context ─────────────────────────

pub mod context;
pub mod mode;
pub mod session;

pub use context::{ContextState, RenderContext};
pub use mode::VideoMode;
pub use session::WindowSession;
