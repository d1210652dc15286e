// ── Virtual-key encoding ──────────────────────────────────────────────────────
//
// Win32 reports virtual-key codes.  The translators expect the interpreted
// character plus a physical key code of the standard layout, so each VK is
// re-encoded into that pair here.  Pure code; no FFI.

use crate::input::keymap::{raw_char, scancode_for, Key};
use crate::input::state::native;

/// `(raw_char, key)` for a virtual key, or `None` for keys we do not map.
pub(crate) fn encode(vk: u16, extended: bool) -> Option<(i32, i32)> {
    if let Some(code) = function_code(vk) {
        return Some((raw_char::FUNCTION_KEY, code));
    }
    let key = match vk {
        0x0D if extended => Key::KpEnter,
        _ => symbol(vk)?,
    };
    let code = scancode_for(key)?;
    Some((system_char(key), code))
}

/// Pack pressed/toggled modifier keys into the native modifier bitmask.
pub(crate) fn modifier_bits(pressed: impl Fn(u16) -> bool, toggled: impl Fn(u16) -> bool) -> u32 {
    let mut bits = 0;
    if pressed(0x10) {
        bits |= native::SHIFT_KEY;
    }
    if pressed(0x11) {
        bits |= native::CONTROL_KEY;
    }
    if pressed(0x12) {
        bits |= native::OPTION_KEY;
    }
    if pressed(0x5B) || pressed(0x5C) {
        bits |= native::COMMAND_KEY;
    }
    if toggled(0x14) {
        bits |= native::CAPS_LOCK;
    }
    if toggled(0x90) {
        bits |= native::NUM_LOCK;
    }
    if toggled(0x91) {
        bits |= native::SCROLL_LOCK;
    }
    bits
}

fn function_code(vk: u16) -> Option<i32> {
    match vk {
        0x70..=0x7B => Some(0x02 + i32::from(vk - 0x70)),
        0x2C => Some(0x0e),
        0x91 => Some(0x0f),
        0x13 => Some(0x10),
        _ => None,
    }
}

fn system_char(key: Key) -> i32 {
    match key {
        Key::Backspace => raw_char::BACKSPACE,
        Key::Tab => raw_char::TAB,
        Key::Enter => raw_char::ENTER,
        Key::Escape => raw_char::ESCAPE,
        Key::Left => raw_char::LEFT_ARROW,
        Key::Right => raw_char::RIGHT_ARROW,
        Key::Up => raw_char::UP_ARROW,
        Key::Down => raw_char::DOWN_ARROW,
        Key::Insert => raw_char::INSERT,
        Key::Delete => raw_char::DELETE,
        Key::Home => raw_char::HOME,
        Key::End => raw_char::END,
        Key::PageUp => raw_char::PAGE_UP,
        Key::PageDown => raw_char::PAGE_DOWN,
        Key::Space => raw_char::SPACE,
        _ => 0,
    }
}

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
    Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
];

const KEYPAD_DIGITS: [Key; 10] = [
    Key::Kp0, Key::Kp1, Key::Kp2, Key::Kp3, Key::Kp4,
    Key::Kp5, Key::Kp6, Key::Kp7, Key::Kp8, Key::Kp9,
];

fn symbol(vk: u16) -> Option<Key> {
    let key = match vk {
        0x41..=0x5A => LETTERS[usize::from(vk - 0x41)],
        0x30..=0x39 => DIGITS[usize::from(vk - 0x30)],
        0x60..=0x69 => KEYPAD_DIGITS[usize::from(vk - 0x60)],
        0x08 => Key::Backspace,
        0x09 => Key::Tab,
        0x0D => Key::Enter,
        0x10 => Key::Shift,
        0x11 => Key::Control,
        0x12 => Key::Alt,
        0x14 => Key::CapsLock,
        0x1B => Key::Escape,
        0x20 => Key::Space,
        0x21 => Key::PageUp,
        0x22 => Key::PageDown,
        0x23 => Key::End,
        0x24 => Key::Home,
        0x25 => Key::Left,
        0x26 => Key::Up,
        0x27 => Key::Right,
        0x28 => Key::Down,
        0x2D => Key::Insert,
        0x2E => Key::Delete,
        0x5B | 0x5C => Key::Meta,
        0x5D => Key::Menu,
        0x6A => Key::KpMultiply,
        0x6B => Key::KpAdd,
        0x6D => Key::KpSubtract,
        0x6E => Key::KpPeriod,
        0x6F => Key::KpDivide,
        0x90 => Key::NumLock,
        0xBA => Key::Semicolon,
        0xBB => Key::Equal,
        0xBC => Key::Comma,
        0xBD => Key::Minus,
        0xBE => Key::Period,
        0xBF => Key::Slash,
        0xC0 => Key::QuoteLeft,
        0xDB => Key::BracketLeft,
        0xDC => Key::Backslash,
        0xDD => Key::BracketRight,
        0xDE => Key::Apostrophe,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::key_symbol;

    fn decode(vk: u16, extended: bool) -> Key {
        let (raw, code) = encode(vk, extended).expect("mapped");
        key_symbol(raw, code)
    }

    #[test]
    fn encoded_keys_decode_to_the_same_symbol() {
        assert_eq!(decode(0x41, false), Key::A);
        assert_eq!(decode(0x5A, false), Key::Z);
        assert_eq!(decode(0x35, false), Key::Num5);
        assert_eq!(decode(0x25, false), Key::Left);
        assert_eq!(decode(0x0D, false), Key::Enter);
        assert_eq!(decode(0x0D, true), Key::KpEnter);
        assert_eq!(decode(0x63, false), Key::Kp3);
        assert_eq!(decode(0x70, false), Key::F1);
        assert_eq!(decode(0x7B, false), Key::F12);
        assert_eq!(decode(0x13, false), Key::Pause);
    }

    #[test]
    fn unmapped_keys_are_skipped() {
        assert_eq!(encode(0xFF, false), None);
    }

    #[test]
    fn modifier_bits_follow_key_state() {
        let bits = modifier_bits(|vk| vk == 0x10 || vk == 0x12, |vk| vk == 0x14);
        assert_eq!(bits, native::SHIFT_KEY | native::OPTION_KEY | native::CAPS_LOCK);
    }
}
