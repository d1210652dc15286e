// ── Native key → portable key symbol ─────────────────────────────────────────
//
// Three static tables, consulted in order:
//   1. keypad scancodes (keypad keys report navigation characters when
//      Num Lock is off, so the scancode must win),
//   2. system characters keyed by the interpreted `raw_char`,
//   3. function keys (raw_char == FUNCTION_KEY) and finally the physical
//      scancode table for everything printable.

use serde::Serialize;

/// Portable key symbols understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Unknown,
    Escape,
    Tab,
    /// Reverse tab.  Never reaches the host; see `keyboard::normalize`.
    BackTab,
    Backspace,
    Enter,
    KpEnter,
    Insert,
    Delete,
    Pause,
    Print,
    Home,
    End,
    Left,
    Up,
    Right,
    Down,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    Meta,
    Menu,
    CapsLock,
    NumLock,
    ScrollLock,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    KpMultiply,
    KpDivide,
    KpSubtract,
    KpAdd,
    KpPeriod,
    Kp0,
    Kp1,
    Kp2,
    Kp3,
    Kp4,
    Kp5,
    Kp6,
    Kp7,
    Kp8,
    Kp9,
    Space,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Semicolon,
    Equal,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    BracketLeft,
    Backslash,
    BracketRight,
    QuoteLeft,
}

/// Interpreted characters the toolkit reports for non-printing keys.
pub mod raw_char {
    pub const HOME: i32 = 0x01;
    pub const END: i32 = 0x04;
    pub const INSERT: i32 = 0x05;
    pub const BACKSPACE: i32 = 0x08;
    pub const TAB: i32 = 0x09;
    pub const ENTER: i32 = 0x0a;
    pub const PAGE_UP: i32 = 0x0b;
    pub const PAGE_DOWN: i32 = 0x0c;
    pub const FUNCTION_KEY: i32 = 0x10;
    /// Emitted by keymaps that turn Shift+Tab into a distinct character.
    pub const BACK_TAB: i32 = 0x19;
    pub const ESCAPE: i32 = 0x1b;
    pub const LEFT_ARROW: i32 = 0x1c;
    pub const RIGHT_ARROW: i32 = 0x1d;
    pub const UP_ARROW: i32 = 0x1e;
    pub const DOWN_ARROW: i32 = 0x1f;
    pub const SPACE: i32 = 0x20;
    pub const DELETE: i32 = 0x7f;
}

const KEYPAD_KEYS: &[(i32, Key)] = &[
    (0x23, Key::KpDivide),
    (0x24, Key::KpMultiply),
    (0x25, Key::KpSubtract),
    (0x37, Key::Kp7),
    (0x38, Key::Kp8),
    (0x39, Key::Kp9),
    (0x3a, Key::KpAdd),
    (0x48, Key::Kp4),
    (0x49, Key::Kp5),
    (0x4a, Key::Kp6),
    (0x58, Key::Kp1),
    (0x59, Key::Kp2),
    (0x5a, Key::Kp3),
    (0x5b, Key::KpEnter),
    (0x64, Key::Kp0),
    (0x65, Key::KpPeriod),
];

const SYSTEM_KEYS: &[(i32, Key)] = &[
    (raw_char::BACKSPACE, Key::Backspace),
    (raw_char::TAB, Key::Tab),
    (raw_char::BACK_TAB, Key::BackTab),
    (raw_char::ENTER, Key::Enter),
    (raw_char::ESCAPE, Key::Escape),
    (raw_char::LEFT_ARROW, Key::Left),
    (raw_char::RIGHT_ARROW, Key::Right),
    (raw_char::UP_ARROW, Key::Up),
    (raw_char::DOWN_ARROW, Key::Down),
    (raw_char::INSERT, Key::Insert),
    (raw_char::DELETE, Key::Delete),
    (raw_char::HOME, Key::Home),
    (raw_char::END, Key::End),
    (raw_char::PAGE_UP, Key::PageUp),
    (raw_char::PAGE_DOWN, Key::PageDown),
    (raw_char::SPACE, Key::Space),
];

const FUNCTION_KEYS: &[(i32, Key)] = &[
    (0x02, Key::F1),
    (0x03, Key::F2),
    (0x04, Key::F3),
    (0x05, Key::F4),
    (0x06, Key::F5),
    (0x07, Key::F6),
    (0x08, Key::F7),
    (0x09, Key::F8),
    (0x0a, Key::F9),
    (0x0b, Key::F10),
    (0x0c, Key::F11),
    (0x0d, Key::F12),
    (0x0e, Key::Print),
    (0x0f, Key::ScrollLock),
    (0x10, Key::Pause),
];

/// Physical scancodes of the standard keyboard layout.
const SCANCODES: &[(i32, Key)] = &[
    (0x01, Key::Escape),
    (0x11, Key::QuoteLeft),
    (0x12, Key::Num1),
    (0x13, Key::Num2),
    (0x14, Key::Num3),
    (0x15, Key::Num4),
    (0x16, Key::Num5),
    (0x17, Key::Num6),
    (0x18, Key::Num7),
    (0x19, Key::Num8),
    (0x1a, Key::Num9),
    (0x1b, Key::Num0),
    (0x1c, Key::Minus),
    (0x1d, Key::Equal),
    (0x1e, Key::Backspace),
    (0x1f, Key::Insert),
    (0x20, Key::Home),
    (0x21, Key::PageUp),
    (0x22, Key::NumLock),
    (0x26, Key::Tab),
    (0x27, Key::Q),
    (0x28, Key::W),
    (0x29, Key::E),
    (0x2a, Key::R),
    (0x2b, Key::T),
    (0x2c, Key::Y),
    (0x2d, Key::U),
    (0x2e, Key::I),
    (0x2f, Key::O),
    (0x30, Key::P),
    (0x31, Key::BracketLeft),
    (0x32, Key::BracketRight),
    (0x33, Key::Backslash),
    (0x34, Key::Delete),
    (0x35, Key::End),
    (0x36, Key::PageDown),
    (0x3b, Key::CapsLock),
    (0x3c, Key::A),
    (0x3d, Key::S),
    (0x3e, Key::D),
    (0x3f, Key::F),
    (0x40, Key::G),
    (0x41, Key::H),
    (0x42, Key::J),
    (0x43, Key::K),
    (0x44, Key::L),
    (0x45, Key::Semicolon),
    (0x46, Key::Apostrophe),
    (0x47, Key::Enter),
    (0x4b, Key::Shift),
    (0x4c, Key::Z),
    (0x4d, Key::X),
    (0x4e, Key::C),
    (0x4f, Key::V),
    (0x50, Key::B),
    (0x51, Key::N),
    (0x52, Key::M),
    (0x53, Key::Comma),
    (0x54, Key::Period),
    (0x55, Key::Slash),
    (0x56, Key::Shift),
    (0x57, Key::Up),
    (0x5c, Key::Control),
    (0x5d, Key::Alt),
    (0x5e, Key::Space),
    (0x5f, Key::Alt),
    (0x60, Key::Control),
    (0x61, Key::Left),
    (0x62, Key::Down),
    (0x63, Key::Right),
    (0x66, Key::Meta),
    (0x67, Key::Meta),
    (0x68, Key::Menu),
];

fn lookup(table: &[(i32, Key)], code: i32) -> Option<Key> {
    table.iter().find(|(c, _)| *c == code).map(|(_, k)| *k)
}

/// Map a key notification's interpreted character and scancode to a symbol.
pub fn key_symbol(raw_char: i32, key: i32) -> Key {
    if let Some(k) = lookup(KEYPAD_KEYS, key) {
        return k;
    }
    if raw_char == raw_char::FUNCTION_KEY {
        return lookup(FUNCTION_KEYS, key).unwrap_or(Key::Unknown);
    }
    lookup(SYSTEM_KEYS, raw_char)
        .or_else(|| lookup(SCANCODES, key))
        .unwrap_or(Key::Unknown)
}

/// Reverse lookup used by backends that start from a symbol.
pub fn scancode_for(key: Key) -> Option<i32> {
    KEYPAD_KEYS
        .iter()
        .chain(SCANCODES)
        .find(|(_, k)| *k == key)
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_keys_use_the_scancode() {
        assert_eq!(key_symbol('a' as i32, 0x3c), Key::A);
        assert_eq!(key_symbol('A' as i32, 0x3c), Key::A);
        assert_eq!(key_symbol('1' as i32, 0x12), Key::Num1);
    }

    #[test]
    fn system_characters_win_over_scancode() {
        assert_eq!(key_symbol(raw_char::ENTER, 0x47), Key::Enter);
        assert_eq!(key_symbol(raw_char::LEFT_ARROW, 0x61), Key::Left);
        assert_eq!(key_symbol(raw_char::BACK_TAB, 0x26), Key::BackTab);
    }

    #[test]
    fn function_keys_are_resolved_by_scancode() {
        assert_eq!(key_symbol(raw_char::FUNCTION_KEY, 0x02), Key::F1);
        assert_eq!(key_symbol(raw_char::FUNCTION_KEY, 0x0d), Key::F12);
        assert_eq!(key_symbol(raw_char::FUNCTION_KEY, 0x7e), Key::Unknown);
    }

    #[test]
    fn keypad_navigation_reports_keypad_symbols() {
        // Num Lock off: keypad 0 arrives as INSERT.
        assert_eq!(key_symbol(raw_char::INSERT, 0x64), Key::Kp0);
        assert_eq!(key_symbol(raw_char::END, 0x58), Key::Kp1);
    }

    #[test]
    fn unknown_codes_fall_back_to_unknown() {
        assert_eq!(key_symbol(0x7e, 0x7f), Key::Unknown);
    }

    #[test]
    fn reverse_lookup_finds_letters() {
        assert_eq!(scancode_for(Key::Z), Some(0x4c));
        assert_eq!(scancode_for(Key::F5), None);
    }
}
