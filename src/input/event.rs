// ── Normalized input events ───────────────────────────────────────────────────
//
// What the host's input queue receives.  Each value is created for a single
// native notification and handed over immediately; nothing keeps a reference.

use serde::Serialize;

use crate::geometry::PointI;

use super::keymap::Key;
use super::state::{ButtonMask, Modifiers, MouseButton};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Button(ButtonEvent),
    Motion(MotionEvent),
    Key(KeyEvent),
    Modifiers(ModifierEvent),
}

impl InputEvent {
    pub fn position(&self) -> PointI {
        match self {
            Self::Button(e) => e.position,
            Self::Motion(e) => e.position,
            Self::Key(e) => e.position,
            Self::Modifiers(e) => e.position,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::Button(e) => e.modifiers,
            Self::Motion(e) => e.modifiers,
            Self::Key(e) => e.modifiers,
            Self::Modifiers(e) => e.modifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonEvent {
    pub position: PointI,
    pub modifiers: Modifiers,
    pub button_mask: ButtonMask,
    pub button: MouseButton,
    pub pressed: bool,
    pub double_click: bool,
    /// Raw wheel delta for wheel buttons; 1.0 otherwise.
    pub factor: f32,
}

/// Pointer velocity in device pixels per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Speed {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tilt {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionEvent {
    pub position: PointI,
    pub modifiers: Modifiers,
    pub button_mask: ButtonMask,
    pub relative: PointI,
    pub speed: Speed,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<Tilt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyEvent {
    /// Last known pointer position when the key arrived.
    pub position: PointI,
    pub modifiers: Modifiers,
    pub key: Key,
    /// Unicode scalar value of the produced text, 0 when none.
    pub unicode: u32,
    pub pressed: bool,
    /// Auto-repeat.
    pub echo: bool,
}

/// Modifier keys changed without any other key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifierEvent {
    pub position: PointI,
    /// The new modifier state.
    pub modifiers: Modifiers,
    /// Which flags flipped.
    pub changed: Modifiers,
}
