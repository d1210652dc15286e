// ── Modifier / button state tracking ─────────────────────────────────────────
//
// Pure mappings from the toolkit's raw bitmasks to normalized flags, plus the
// single `PointerState` the translators mutate.  All mutation happens on the
// toolkit thread; the render thread reads a lock-free `PointerWatch` copy.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

use crate::geometry::PointI;

/// Raw bit values used by the native toolkit.
pub mod native {
    pub const PRIMARY_MOUSE_BUTTON: u32 = 0x01;
    pub const SECONDARY_MOUSE_BUTTON: u32 = 0x02;
    pub const TERTIARY_MOUSE_BUTTON: u32 = 0x04;

    pub const SHIFT_KEY: u32 = 0x0000_0001;
    pub const COMMAND_KEY: u32 = 0x0000_0002;
    pub const CONTROL_KEY: u32 = 0x0000_0004;
    pub const CAPS_LOCK: u32 = 0x0000_0008;
    pub const SCROLL_LOCK: u32 = 0x0000_0010;
    pub const NUM_LOCK: u32 = 0x0000_0020;
    pub const OPTION_KEY: u32 = 0x0000_0040;
    pub const MENU_KEY: u32 = 0x0000_0080;
}

// ── Modifiers ─────────────────────────────────────────────────────────────────

/// The four portable modifier flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Map a raw toolkit modifier mask.  Lock keys are ignored.
    pub fn from_native(raw: u32) -> Self {
        Self {
            shift: raw & native::SHIFT_KEY != 0,
            control: raw & native::CONTROL_KEY != 0,
            alt: raw & native::OPTION_KEY != 0,
            meta: raw & native::COMMAND_KEY != 0,
        }
    }
}

// ── Buttons ───────────────────────────────────────────────────────────────────

/// Logical button mask handed to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ButtonMask(u32);

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask(0);
    pub const LEFT: ButtonMask = ButtonMask(1 << 0);
    pub const RIGHT: ButtonMask = ButtonMask(1 << 1);
    pub const MIDDLE: ButtonMask = ButtonMask(1 << 2);

    /// Recompute the mask from scratch.  Depends only on `raw`.
    pub fn from_native(raw: u32) -> Self {
        let mut bits = 0;
        if raw & native::PRIMARY_MOUSE_BUTTON != 0 {
            bits |= Self::LEFT.0;
        }
        if raw & native::SECONDARY_MOUSE_BUTTON != 0 {
            bits |= Self::RIGHT.0;
        }
        if raw & native::TERTIARY_MOUSE_BUTTON != 0 {
            bits |= Self::MIDDLE.0;
        }
        ButtonMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        ButtonMask(bits)
    }

    pub const fn contains(self, other: ButtonMask) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Logical button index reported in button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left = 1,
    Right = 2,
    Middle = 3,
    WheelUp = 4,
    WheelDown = 5,
    WheelLeft = 6,
    WheelRight = 7,
}

/// Which button changed between two raw masks.
///
/// Uses the lowest differing bit.  A zero or unrecognised difference reports
/// the primary button, which is what toolkits that only ever flip one bit per
/// notification imply.
pub fn changed_button(last_raw: u32, raw: u32) -> MouseButton {
    let diff = last_raw ^ raw;
    match diff & diff.wrapping_neg() {
        native::SECONDARY_MOUSE_BUTTON => MouseButton::Right,
        native::TERTIARY_MOUSE_BUTTON => MouseButton::Middle,
        _ => MouseButton::Left,
    }
}

// ── Pointer state ─────────────────────────────────────────────────────────────

/// Last-known pointer and modifier state for the one window.
#[derive(Debug, Default)]
pub struct PointerState {
    last_position: Option<PointI>,
    last_buttons_raw: u32,
    button_mask: ButtonMask,
    modifiers_raw: u32,
    last_when: Option<i64>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the raw modifier mask and return its normalized form.
    pub fn observe_modifiers(&mut self, raw: u32) -> Modifiers {
        self.modifiers_raw = raw;
        Modifiers::from_native(raw)
    }

    /// Recompute and cache the logical button mask from `raw`.
    pub fn observe_buttons(&mut self, raw: u32) -> ButtonMask {
        self.button_mask = ButtonMask::from_native(raw);
        self.button_mask
    }

    /// XOR `raw` against the previous raw mask, then remember `raw`.
    pub fn button_transition(&mut self, raw: u32) -> MouseButton {
        let button = changed_button(self.last_buttons_raw, raw);
        self.last_buttons_raw = raw;
        button
    }

    /// Relative motion to `pos`, seeding the last position on first use so
    /// the very first delta is zero.  Updates the last position.
    pub fn advance_to(&mut self, pos: PointI) -> PointI {
        let last = *self.last_position.get_or_insert(pos);
        self.last_position = Some(pos);
        pos - last
    }

    /// Swap in a new timestamp (µs), returning the previous one.
    pub fn advance_clock(&mut self, when: Option<i64>) -> Option<i64> {
        std::mem::replace(&mut self.last_when, when)
    }

    pub fn last_position(&self) -> PointI {
        self.last_position.unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn has_position(&self) -> bool {
        self.last_position.is_some()
    }

    /// Overwrite the last position without producing motion.
    pub fn set_last_position(&mut self, pos: PointI) {
        self.last_position = Some(pos);
    }

    pub fn button_mask(&self) -> ButtonMask {
        self.button_mask
    }

    pub fn modifiers_raw(&self) -> u32 {
        self.modifiers_raw
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers::from_native(self.modifiers_raw)
    }
}

// ── Cross-thread snapshot ─────────────────────────────────────────────────────

/// Read-only view of the pointer for the render thread.
///
/// Each field is stored as one whole value, so readers never observe a
/// half-written position.
#[derive(Debug, Default)]
pub struct PointerWatch {
    position: AtomicU64,
    button_mask: AtomicU32,
}

impl PointerWatch {
    pub fn publish(&self, position: PointI, mask: ButtonMask) {
        self.position.store(pack(position), Ordering::Release);
        self.button_mask.store(mask.bits(), Ordering::Release);
    }

    pub fn position(&self) -> PointI {
        unpack(self.position.load(Ordering::Acquire))
    }

    pub fn button_mask(&self) -> ButtonMask {
        ButtonMask::from_bits(self.button_mask.load(Ordering::Acquire))
    }
}

fn pack(p: PointI) -> u64 {
    (u64::from(p.x as u32) << 32) | u64::from(p.y as u32)
}

fn unpack(v: u64) -> PointI {
    PointI::new((v >> 32) as u32 as i32, v as u32 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_map_each_native_bit() {
        let m = Modifiers::from_native(native::SHIFT_KEY | native::OPTION_KEY);
        assert!(m.shift && m.alt);
        assert!(!m.control && !m.meta);

        let m = Modifiers::from_native(native::CONTROL_KEY | native::COMMAND_KEY | native::CAPS_LOCK);
        assert!(m.control && m.meta);
        assert!(!m.shift && !m.alt);
    }

    #[test]
    fn button_mask_depends_only_on_current_raw_value() {
        let mut state = PointerState::new();
        let raw = native::PRIMARY_MOUSE_BUTTON | native::TERTIARY_MOUSE_BUTTON;
        let first = state.observe_buttons(raw);
        state.observe_buttons(native::SECONDARY_MOUSE_BUTTON);
        let again = state.observe_buttons(raw);
        assert_eq!(first, again);
        assert_eq!(first, ButtonMask::from_bits(ButtonMask::LEFT.bits() | ButtonMask::MIDDLE.bits()));
    }

    #[test]
    fn transition_reports_press_and_release_of_primary() {
        let mut state = PointerState::new();
        assert_eq!(state.button_transition(native::PRIMARY_MOUSE_BUTTON), MouseButton::Left);
        assert_eq!(state.button_transition(0), MouseButton::Left);
    }

    #[test]
    fn transition_selects_the_bit_that_changed() {
        assert_eq!(
            changed_button(native::PRIMARY_MOUSE_BUTTON, native::PRIMARY_MOUSE_BUTTON | native::SECONDARY_MOUSE_BUTTON),
            MouseButton::Right
        );
        assert_eq!(changed_button(native::TERTIARY_MOUSE_BUTTON, 0), MouseButton::Middle);
    }

    #[test]
    fn first_advance_is_zero_then_deltas_follow() {
        let mut state = PointerState::new();
        assert_eq!(state.advance_to(PointI::new(100, 50)), PointI::new(0, 0));
        assert_eq!(state.advance_to(PointI::new(103, 45)), PointI::new(3, -5));
        assert_eq!(state.last_position(), PointI::new(103, 45));
    }

    #[test]
    fn watch_round_trips_negative_coordinates() {
        let watch = PointerWatch::default();
        watch.publish(PointI::new(-20, 7), ButtonMask::RIGHT);
        assert_eq!(watch.position(), PointI::new(-20, 7));
        assert_eq!(watch.button_mask(), ButtonMask::RIGHT);
    }
}
