// ── Input translation ─────────────────────────────────────────────────────────
//
// Turns native pointer, wheel, keyboard and drop notifications into
// `InputEvent` values.  Translators are plain functions over `PointerState`;
// the dispatcher decides where their output goes.

pub mod drop;
pub mod event;
pub mod keyboard;
pub mod keymap;
pub mod pointer;
pub mod state;

pub use event::{ButtonEvent, InputEvent, KeyEvent, ModifierEvent, MotionEvent};
pub use keymap::Key;
pub use state::{ButtonMask, Modifiers, MouseButton, PointerState, PointerWatch};
