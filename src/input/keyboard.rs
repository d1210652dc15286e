// ── Keyboard translation ──────────────────────────────────────────────────────

use tracing::trace;

use crate::message::{field, MessageKind, NativeMessage};

use super::event::{KeyEvent, ModifierEvent};
use super::keymap::{key_symbol, Key};
use super::state::{Modifiers, PointerState};

/// Translate a key-down / key-up notification.
///
/// `raw_char`, `key` and `modifiers` are all required; a notification missing
/// any of them produces nothing.
pub fn translate_key(state: &mut PointerState, msg: &NativeMessage) -> Option<KeyEvent> {
    let (Some(raw_char), Some(key), Some(modifiers_raw)) = (
        msg.find_i32(field::RAW_CHAR),
        msg.find_i32(field::KEY),
        msg.find_i32(field::MODIFIERS),
    ) else {
        trace!(what = ?msg.what, "key notification missing required fields, dropped");
        return None;
    };

    let unicode = msg
        .find_string(field::BYTES)
        .and_then(|s| s.chars().next())
        .map_or(0, u32::from);

    let event = KeyEvent {
        position: state.last_position(),
        modifiers: state.observe_modifiers(modifiers_raw as u32),
        key: key_symbol(raw_char, key),
        unicode,
        pressed: msg.what == MessageKind::KeyDown,
        echo: msg.has_i32(field::KEY_REPEAT),
    };

    Some(normalize(event))
}

/// Present reverse-tab as Tab with Shift held, whatever the platform sent.
pub fn normalize(mut event: KeyEvent) -> KeyEvent {
    if event.key == Key::BackTab {
        event.key = Key::Tab;
        event.modifiers.shift = true;
    }
    event
}

/// Translate a modifiers-changed notification (no key code involved).
pub fn translate_modifiers(state: &mut PointerState, msg: &NativeMessage) -> Option<ModifierEvent> {
    let (Some(old), Some(new)) = (
        msg.find_i32(field::OLD_MODIFIERS),
        msg.find_i32(field::MODIFIERS),
    ) else {
        trace!("modifier notification missing old or new state, dropped");
        return None;
    };

    let changed = Modifiers::from_native((old ^ new) as u32);

    Some(ModifierEvent {
        position: state.last_position(),
        modifiers: state.observe_modifiers(new as u32),
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keymap::raw_char;
    use crate::input::state::native;

    fn key_down(raw: i32, key: i32, modifiers: u32) -> NativeMessage {
        NativeMessage::new(MessageKind::KeyDown)
            .with_i32(field::RAW_CHAR, raw)
            .with_i32(field::KEY, key)
            .with_i32(field::MODIFIERS, modifiers as i32)
    }

    #[test]
    fn letter_with_text() {
        let mut state = PointerState::new();
        let msg = key_down('a' as i32, 0x3c, 0).with_string(field::BYTES, "a");
        let ev = translate_key(&mut state, &msg).unwrap();
        assert_eq!(ev.key, Key::A);
        assert_eq!(ev.unicode, 'a' as u32);
        assert!(ev.pressed);
        assert!(!ev.echo);
    }

    #[test]
    fn unicode_takes_first_scalar_of_utf8_text() {
        let mut state = PointerState::new();
        let msg = key_down('e' as i32, 0x29, 0).with_string(field::BYTES, "éx");
        let ev = translate_key(&mut state, &msg).unwrap();
        assert_eq!(ev.unicode, 0xe9);
    }

    #[test]
    fn unicode_defaults_to_zero() {
        let mut state = PointerState::new();
        let ev = translate_key(&mut state, &key_down(raw_char::FUNCTION_KEY, 0x02, 0)).unwrap();
        assert_eq!(ev.key, Key::F1);
        assert_eq!(ev.unicode, 0);
    }

    #[test]
    fn repeat_field_presence_marks_echo() {
        let mut state = PointerState::new();
        let ev = translate_key(&mut state, &key_down('a' as i32, 0x3c, 0).with_i32(field::KEY_REPEAT, 0)).unwrap();
        assert!(ev.echo);
    }

    #[test]
    fn key_up_is_not_pressed() {
        let mut state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::KeyUp)
            .with_i32(field::RAW_CHAR, raw_char::ESCAPE)
            .with_i32(field::KEY, 0x01)
            .with_i32(field::MODIFIERS, 0);
        let ev = translate_key(&mut state, &msg).unwrap();
        assert_eq!(ev.key, Key::Escape);
        assert!(!ev.pressed);
    }

    #[test]
    fn missing_required_field_emits_nothing() {
        let mut state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::KeyDown)
            .with_i32(field::RAW_CHAR, 'a' as i32)
            .with_i32(field::KEY, 0x3c);
        assert!(translate_key(&mut state, &msg).is_none());
        assert_eq!(state.modifiers_raw(), 0);
    }

    #[test]
    fn back_tab_becomes_shift_tab_regardless_of_shift_bit() {
        let mut state = PointerState::new();
        for modifiers in [0, native::SHIFT_KEY, native::CONTROL_KEY] {
            let ev = translate_key(&mut state, &key_down(raw_char::BACK_TAB, 0x26, modifiers)).unwrap();
            assert_eq!(ev.key, Key::Tab);
            assert!(ev.modifiers.shift);
        }
    }

    #[test]
    fn plain_tab_keeps_its_shift_state() {
        let mut state = PointerState::new();
        let ev = translate_key(&mut state, &key_down(raw_char::TAB, 0x26, 0)).unwrap();
        assert_eq!(ev.key, Key::Tab);
        assert!(!ev.modifiers.shift);
    }

    #[test]
    fn modifier_change_reports_new_state_and_flipped_bits() {
        let mut state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::ModifiersChanged)
            .with_i32(field::OLD_MODIFIERS, native::SHIFT_KEY as i32)
            .with_i32(field::MODIFIERS, (native::SHIFT_KEY | native::CONTROL_KEY) as i32);
        let ev = translate_modifiers(&mut state, &msg).unwrap();
        assert!(ev.modifiers.shift && ev.modifiers.control);
        assert!(!ev.changed.shift && ev.changed.control);
        assert_eq!(state.modifiers_raw(), native::SHIFT_KEY | native::CONTROL_KEY);
    }

    #[test]
    fn modifier_change_without_old_state_is_dropped() {
        let mut state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::ModifiersChanged).with_i32(field::MODIFIERS, 1);
        assert!(translate_modifiers(&mut state, &msg).is_none());
    }
}
