// ── Pointer & wheel translation ───────────────────────────────────────────────

use tracing::trace;

use crate::geometry::{Point, PointI};
use crate::host::Lifecycle;
use crate::message::{field, transit, MessageKind, NativeMessage};

use super::event::{ButtonEvent, MotionEvent, Speed, Tilt};
use super::state::{MouseButton, PointerState};

/// Translate a button-down / button-up notification.
///
/// Requires `where`.  `buttons`, `modifiers` and `clicks` default to zero.
pub fn translate_button(state: &mut PointerState, msg: &NativeMessage) -> Option<ButtonEvent> {
    let Some(where_) = msg.find_point(field::WHERE) else {
        trace!(what = ?msg.what, "button notification without position, dropped");
        return None;
    };

    let modifiers_raw = msg.find_i32(field::MODIFIERS).unwrap_or(0) as u32;
    let buttons = msg.find_i32(field::BUTTONS).unwrap_or(0) as u32;

    let button = state.button_transition(buttons);
    let button_mask = state.observe_buttons(buttons);
    let modifiers = state.observe_modifiers(modifiers_raw);
    let pressed = msg.what == MessageKind::MouseDown;

    let double_click =
        pressed && button == MouseButton::Left && msg.find_i32(field::CLICKS).unwrap_or(0) > 1;

    Some(ButtonEvent {
        position: where_.to_int(),
        modifiers,
        button_mask,
        button,
        pressed,
        double_click,
        factor: 1.0,
    })
}

/// Pointer-enter / pointer-exit signalled by a motion notification.
pub fn transit_notice(msg: &NativeMessage) -> Option<Lifecycle> {
    match msg.find_i32(field::TRANSIT)? {
        transit::ENTERED => Some(Lifecycle::PointerEnter),
        transit::EXITED => Some(Lifecycle::PointerExit),
        _ => None,
    }
}

/// Translate a motion notification.
///
/// Tablet coordinates win over the generic position when both are present.
pub fn translate_motion(state: &mut PointerState, msg: &NativeMessage) -> Option<MotionEvent> {
    let tablet = msg
        .find_f32(field::TABLET_X)
        .zip(msg.find_f32(field::TABLET_Y))
        .map(|(x, y)| Point::new(x, y));

    let Some(where_) = tablet.or_else(|| msg.find_point(field::WHERE)) else {
        trace!("motion notification without position, dropped");
        return None;
    };

    let pos = where_.to_int();
    let modifiers = state.observe_modifiers(msg.find_i32(field::MODIFIERS).unwrap_or(0) as u32);
    let button_mask = state.observe_buttons(msg.find_i32(field::BUTTONS).unwrap_or(0) as u32);

    let relative = state.advance_to(pos);
    let when = msg.find_i64(field::WHEN);
    let speed = speed(relative, state.advance_clock(when), when);

    let pressure = msg.find_f32(field::TABLET_PRESSURE);
    let tilt = msg
        .find_f32(field::TABLET_TILT_X)
        .zip(msg.find_f32(field::TABLET_TILT_Y))
        .map(|(x, y)| Tilt { x, y });

    Some(MotionEvent {
        position: pos,
        modifiers,
        button_mask,
        relative,
        speed,
        pressure,
        tilt,
    })
}

fn speed(relative: PointI, previous: Option<i64>, now: Option<i64>) -> Speed {
    let elapsed = match (previous, now) {
        (Some(prev), Some(now)) => now.checked_sub(prev),
        _ => None,
    };
    match elapsed {
        Some(us) if us > 0 => {
            let secs = us as f32 / 1_000_000.0;
            Speed {
                x: relative.x as f32 / secs,
                y: relative.y as f32 / secs,
            }
        }
        _ => Speed::default(),
    }
}

/// Translate a wheel notification into press/release pairs.
///
/// Vertical first, then horizontal; each non-zero axis yields exactly two
/// events.  The last pointer position and modifiers are reused and left as is.
pub fn translate_wheel(state: &PointerState, msg: &NativeMessage) -> Vec<ButtonEvent> {
    let mut out = Vec::with_capacity(4);

    let axes = [
        (field::WHEEL_DELTA_Y, MouseButton::WheelUp, MouseButton::WheelDown),
        (field::WHEEL_DELTA_X, MouseButton::WheelRight, MouseButton::WheelLeft),
    ];

    for (name, positive, negative) in axes {
        let delta = match msg.find_f32(name) {
            Some(d) if d != 0.0 => d,
            _ => continue,
        };

        let template = ButtonEvent {
            position: state.last_position(),
            modifiers: state.modifiers(),
            button_mask: state.button_mask(),
            button: if delta > 0.0 { positive } else { negative },
            pressed: true,
            double_click: false,
            factor: delta,
        };
        out.push(template.clone());
        out.push(ButtonEvent {
            pressed: false,
            ..template
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::state::{native, ButtonMask};

    fn down(x: f32, y: f32, buttons: u32) -> NativeMessage {
        NativeMessage::new(MessageKind::MouseDown)
            .with_point(field::WHERE, Point::new(x, y))
            .with_i32(field::BUTTONS, buttons as i32)
    }

    fn up(x: f32, y: f32, buttons: u32) -> NativeMessage {
        NativeMessage::new(MessageKind::MouseUp)
            .with_point(field::WHERE, Point::new(x, y))
            .with_i32(field::BUTTONS, buttons as i32)
    }

    fn moved(x: f32, y: f32) -> NativeMessage {
        NativeMessage::new(MessageKind::MouseMoved).with_point(field::WHERE, Point::new(x, y))
    }

    #[test]
    fn press_then_release_primary() {
        let mut state = PointerState::new();
        let press = translate_button(&mut state, &down(5.0, 6.0, native::PRIMARY_MOUSE_BUTTON)).unwrap();
        assert_eq!(press.button, MouseButton::Left);
        assert!(press.pressed);
        assert_eq!(press.button_mask, ButtonMask::LEFT);
        assert_eq!(press.position, PointI::new(5, 6));

        let release = translate_button(&mut state, &up(5.0, 6.0, 0)).unwrap();
        assert_eq!(release.button, MouseButton::Left);
        assert!(!release.pressed);
        assert_eq!(release.button_mask, ButtonMask::NONE);
    }

    #[test]
    fn secondary_press_while_primary_held() {
        let mut state = PointerState::new();
        translate_button(&mut state, &down(0.0, 0.0, native::PRIMARY_MOUSE_BUTTON));
        let ev = translate_button(
            &mut state,
            &down(0.0, 0.0, native::PRIMARY_MOUSE_BUTTON | native::SECONDARY_MOUSE_BUTTON),
        )
        .unwrap();
        assert_eq!(ev.button, MouseButton::Right);
        assert!(ev.button_mask.contains(ButtonMask::LEFT));
        assert!(ev.button_mask.contains(ButtonMask::RIGHT));
    }

    #[test]
    fn double_click_only_on_primary_down() {
        let mut state = PointerState::new();
        let ev = translate_button(
            &mut state,
            &down(1.0, 1.0, native::PRIMARY_MOUSE_BUTTON).with_i32(field::CLICKS, 2),
        )
        .unwrap();
        assert!(ev.double_click);

        let ev = translate_button(&mut state, &up(1.0, 1.0, 0).with_i32(field::CLICKS, 2)).unwrap();
        assert!(!ev.double_click);

        let ev = translate_button(
            &mut state,
            &down(1.0, 1.0, native::SECONDARY_MOUSE_BUTTON).with_i32(field::CLICKS, 3),
        )
        .unwrap();
        assert!(!ev.double_click);
    }

    #[test]
    fn button_without_position_leaves_state_untouched() {
        let mut state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::MouseDown)
            .with_i32(field::BUTTONS, native::PRIMARY_MOUSE_BUTTON as i32);
        assert!(translate_button(&mut state, &msg).is_none());
        // The press was never recorded, so the next real press is still a press.
        let ev = translate_button(&mut state, &down(0.0, 0.0, native::PRIMARY_MOUSE_BUTTON)).unwrap();
        assert_eq!(ev.button, MouseButton::Left);
        assert_eq!(ev.button_mask, ButtonMask::LEFT);
    }

    #[test]
    fn first_motion_has_zero_delta() {
        let mut state = PointerState::new();
        let ev = translate_motion(&mut state, &moved(120.0, 80.0)).unwrap();
        assert_eq!(ev.relative, PointI::new(0, 0));

        let ev = translate_motion(&mut state, &moved(125.0, 70.0)).unwrap();
        assert_eq!(ev.relative, PointI::new(5, -10));

        let ev = translate_motion(&mut state, &moved(100.0, 100.0)).unwrap();
        assert_eq!(ev.relative, PointI::new(-25, 30));
    }

    #[test]
    fn tablet_coordinates_win() {
        let mut state = PointerState::new();
        let msg = moved(10.0, 10.0)
            .with_f32(field::TABLET_X, 300.0)
            .with_f32(field::TABLET_Y, 200.0)
            .with_f32(field::TABLET_PRESSURE, 0.75)
            .with_f32(field::TABLET_TILT_X, 0.1)
            .with_f32(field::TABLET_TILT_Y, -0.2);
        let ev = translate_motion(&mut state, &msg).unwrap();
        assert_eq!(ev.position, PointI::new(300, 200));
        assert_eq!(ev.pressure, Some(0.75));
        assert_eq!(ev.tilt, Some(Tilt { x: 0.1, y: -0.2 }));
    }

    #[test]
    fn partial_tablet_fields_fall_back_to_where() {
        let mut state = PointerState::new();
        let msg = moved(10.0, 20.0)
            .with_f32(field::TABLET_X, 300.0)
            .with_f32(field::TABLET_TILT_X, 0.5);
        let ev = translate_motion(&mut state, &msg).unwrap();
        assert_eq!(ev.position, PointI::new(10, 20));
        assert_eq!(ev.tilt, None);
        assert_eq!(ev.pressure, None);
    }

    #[test]
    fn motion_without_any_position_is_dropped() {
        let mut state = PointerState::new();
        assert!(translate_motion(&mut state, &NativeMessage::new(MessageKind::MouseMoved)).is_none());
        assert!(!state.has_position());
    }

    #[test]
    fn speed_uses_timestamps_when_present() {
        let mut state = PointerState::new();
        translate_motion(&mut state, &moved(0.0, 0.0).with_i64(field::WHEN, 1_000_000));
        let ev = translate_motion(&mut state, &moved(10.0, -5.0).with_i64(field::WHEN, 1_500_000)).unwrap();
        assert_eq!(ev.speed, Speed { x: 20.0, y: -10.0 });

        let ev = translate_motion(&mut state, &moved(20.0, 0.0)).unwrap();
        assert_eq!(ev.speed, Speed::default());
    }

    #[test]
    fn distant_positions_give_a_saturated_delta() {
        let mut state = PointerState::new();
        translate_motion(&mut state, &moved(2.0e9, 0.0));
        let ev = translate_motion(&mut state, &moved(-2.0e9, 0.0)).unwrap();
        assert_eq!(ev.relative, PointI::new(i32::MIN, 0));
        assert_eq!(ev.position, PointI::new(-2_000_000_000, 0));
    }

    #[test]
    fn timestamps_too_far_apart_give_zero_speed() {
        let mut state = PointerState::new();
        translate_motion(&mut state, &moved(0.0, 0.0).with_i64(field::WHEN, i64::MIN));
        let ev = translate_motion(&mut state, &moved(10.0, 0.0).with_i64(field::WHEN, i64::MAX)).unwrap();
        assert_eq!(ev.relative, PointI::new(10, 0));
        assert_eq!(ev.speed, Speed::default());
    }

    #[test]
    fn transit_maps_enter_and_exit_only() {
        let enter = moved(0.0, 0.0).with_i32(field::TRANSIT, transit::ENTERED);
        let exit = moved(0.0, 0.0).with_i32(field::TRANSIT, transit::EXITED);
        let inside = moved(0.0, 0.0).with_i32(field::TRANSIT, transit::INSIDE);
        assert_eq!(transit_notice(&enter), Some(Lifecycle::PointerEnter));
        assert_eq!(transit_notice(&exit), Some(Lifecycle::PointerExit));
        assert_eq!(transit_notice(&inside), None);
    }

    #[test]
    fn vertical_wheel_yields_one_press_release_pair() {
        let mut state = PointerState::new();
        translate_motion(&mut state, &moved(40.0, 50.0));

        let up = NativeMessage::new(MessageKind::MouseWheelChanged).with_f32(field::WHEEL_DELTA_Y, 5.0);
        let evs = translate_wheel(&state, &up);
        assert_eq!(evs.len(), 2);
        assert!(evs.iter().all(|e| e.button == MouseButton::WheelUp));
        assert!(evs[0].pressed && !evs[1].pressed);
        assert_eq!(evs[0].position, PointI::new(40, 50));
        assert_eq!(evs[0].factor, 5.0);

        let down = NativeMessage::new(MessageKind::MouseWheelChanged).with_f32(field::WHEEL_DELTA_Y, -5.0);
        let evs = translate_wheel(&state, &down);
        assert_eq!(evs.len(), 2);
        assert!(evs.iter().all(|e| e.button == MouseButton::WheelDown));
    }

    #[test]
    fn both_axes_produce_independent_pairs() {
        let state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::MouseWheelChanged)
            .with_f32(field::WHEEL_DELTA_Y, 1.0)
            .with_f32(field::WHEEL_DELTA_X, -2.0);
        let evs = translate_wheel(&state, &msg);
        let buttons: Vec<_> = evs.iter().map(|e| (e.button, e.pressed)).collect();
        assert_eq!(
            buttons,
            vec![
                (MouseButton::WheelUp, true),
                (MouseButton::WheelUp, false),
                (MouseButton::WheelLeft, true),
                (MouseButton::WheelLeft, false),
            ]
        );
    }

    #[test]
    fn zero_wheel_delta_is_silent() {
        let state = PointerState::new();
        let msg = NativeMessage::new(MessageKind::MouseWheelChanged)
            .with_f32(field::WHEEL_DELTA_Y, 0.0);
        assert!(translate_wheel(&state, &msg).is_empty());
    }
}
