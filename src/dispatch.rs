// ── Message dispatcher ────────────────────────────────────────────────────────
//
// Runs on the toolkit thread, one notification at a time and in delivery
// order.  Each kind goes to exactly one handler; kinds this layer does not
// interpret are returned as `Dispatch::Default` so the toolkit can apply its
// own handling.  Handlers either complete their update or bail out before
// touching any state.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::host::{HostLink, Lifecycle};
use crate::input::{drop, keyboard, pointer, InputEvent, PointerState, PointerWatch};
use crate::message::{field, MessageKind, NativeMessage};
use crate::video::WindowSession;

/// What the dispatcher did with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// The quit request was accepted.  There is no refusal path.
    QuitAccepted,
    /// Not interpreted here; the toolkit's default handling applies.
    Default,
}

pub struct Dispatcher {
    pointer: PointerState,
    watch: Arc<PointerWatch>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_watch(Arc::new(PointerWatch::default()))
    }

    /// Fresh pointer tracking that publishes into an existing watch.
    pub fn with_watch(watch: Arc<PointerWatch>) -> Self {
        Self {
            pointer: PointerState::new(),
            watch,
        }
    }

    /// Lock-free view of the pointer for other threads.
    pub fn watch(&self) -> Arc<PointerWatch> {
        Arc::clone(&self.watch)
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Overwrite the tracked position without emitting motion.
    pub fn set_last_position(&mut self, pos: crate::geometry::PointI) {
        self.pointer.set_last_position(pos);
        self.publish();
    }

    pub fn dispatch(
        &mut self,
        msg: &NativeMessage,
        window: &mut WindowSession,
        host: &mut HostLink,
    ) -> Dispatch {
        match msg.what {
            MessageKind::MouseDown | MessageKind::MouseUp => {
                if let Some(ev) = pointer::translate_button(&mut self.pointer, msg) {
                    self.publish();
                    host.emit(InputEvent::Button(ev));
                }
            }

            MessageKind::MouseMoved => {
                if let Some(signal) = pointer::transit_notice(msg) {
                    host.signal(signal);
                }
                if let Some(ev) = pointer::translate_motion(&mut self.pointer, msg) {
                    self.publish();
                    host.emit(InputEvent::Motion(ev));
                }
            }

            MessageKind::MouseWheelChanged => {
                for ev in pointer::translate_wheel(&self.pointer, msg) {
                    host.emit(InputEvent::Button(ev));
                }
            }

            MessageKind::KeyDown | MessageKind::KeyUp => {
                if let Some(ev) = keyboard::translate_key(&mut self.pointer, msg) {
                    host.emit(InputEvent::Key(ev));
                }
            }

            MessageKind::ModifiersChanged => {
                if let Some(ev) = keyboard::translate_modifiers(&mut self.pointer, msg) {
                    host.emit(InputEvent::Modifiers(ev));
                }
            }

            MessageKind::WindowResized => {
                match (msg.find_i32(field::WIDTH), msg.find_i32(field::HEIGHT)) {
                    (Some(width), Some(height)) => {
                        debug!(width, height, "window resized");
                        window.resized(width, height);
                    }
                    _ => trace!("resize notification without dimensions, dropped"),
                }
            }

            MessageKind::WindowActivated => {
                if let Some(active) = msg.find_bool(field::ACTIVE) {
                    debug!(active, "window activation changed");
                    window.focused = active;
                    host.signal(if active {
                        Lifecycle::FocusIn
                    } else {
                        Lifecycle::FocusOut
                    });
                } else {
                    trace!("activation notification without state, dropped");
                }
            }

            MessageKind::SimpleData => {
                let paths = drop::collect_paths(msg);
                if paths.is_empty() {
                    trace!("drop carried no resolvable files");
                } else if let Some(listener) = host.listener.as_mut() {
                    debug!(count = paths.len(), "files dropped");
                    listener.drop_files(paths);
                }
            }

            MessageKind::QuitRequested => {
                info!("quit requested");
                host.signal(Lifecycle::QuitRequested);
                return Dispatch::QuitAccepted;
            }

            MessageKind::Other(code) => {
                trace!(code, "notification left to the toolkit");
                return Dispatch::Default;
            }
        }

        Dispatch::Handled
    }

    fn publish(&self) {
        self.watch
            .publish(self.pointer.last_position(), self.pointer.button_mask());
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::geometry::{Point, PointI, Size};
    use crate::host::LifecycleListener;
    use crate::input::state::native;
    use crate::input::{ButtonMask, MouseButton};

    #[derive(Debug, Clone, PartialEq)]
    enum Heard {
        Signal(Lifecycle),
        Files(Vec<PathBuf>),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Heard>>>);

    impl Recorder {
        fn heard(&self) -> Vec<Heard> {
            self.0.lock().unwrap().clone()
        }
    }

    impl LifecycleListener for Recorder {
        fn notify(&mut self, signal: Lifecycle) {
            self.0.lock().unwrap().push(Heard::Signal(signal));
        }

        fn drop_files(&mut self, paths: Vec<PathBuf>) {
            self.0.lock().unwrap().push(Heard::Files(paths));
        }
    }

    struct Rig {
        dispatcher: Dispatcher,
        window: WindowSession,
        host: HostLink,
        events: Receiver<InputEvent>,
        recorder: Recorder,
    }

    impl Rig {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            let recorder = Recorder::default();
            let mut host = HostLink::new(Box::new(tx));
            host.listener = Some(Box::new(recorder.clone()));
            Self {
                dispatcher: Dispatcher::new(),
                window: WindowSession::default(),
                host,
                events: rx,
                recorder,
            }
        }

        fn send(&mut self, msg: NativeMessage) -> Dispatch {
            self.dispatcher.dispatch(&msg, &mut self.window, &mut self.host)
        }

        fn events(&self) -> Vec<InputEvent> {
            self.events.try_iter().collect()
        }
    }

    #[test]
    fn quit_is_signalled_and_accepted() {
        let mut rig = Rig::new();
        assert_eq!(rig.send(NativeMessage::new(MessageKind::QuitRequested)), Dispatch::QuitAccepted);
        assert_eq!(rig.recorder.heard(), vec![Heard::Signal(Lifecycle::QuitRequested)]);
    }

    #[test]
    fn quit_is_accepted_without_a_listener() {
        let mut rig = Rig::new();
        rig.host.listener = None;
        assert_eq!(rig.send(NativeMessage::new(MessageKind::QuitRequested)), Dispatch::QuitAccepted);
    }

    #[test]
    fn unknown_kinds_fall_through() {
        let mut rig = Rig::new();
        assert_eq!(rig.send(NativeMessage::new(MessageKind::Other(0x5f5f))), Dispatch::Default);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn activation_maps_to_focus_signals() {
        let mut rig = Rig::new();
        rig.send(NativeMessage::new(MessageKind::WindowActivated).with_bool(field::ACTIVE, false));
        assert!(!rig.window.is_focused());
        rig.send(NativeMessage::new(MessageKind::WindowActivated).with_bool(field::ACTIVE, true));
        assert!(rig.window.is_focused());
        assert_eq!(
            rig.recorder.heard(),
            vec![Heard::Signal(Lifecycle::FocusOut), Heard::Signal(Lifecycle::FocusIn)]
        );
    }

    #[test]
    fn resize_updates_dimensions_only_when_complete() {
        let mut rig = Rig::new();
        rig.send(
            NativeMessage::new(MessageKind::WindowResized)
                .with_i32(field::WIDTH, 640)
                .with_i32(field::HEIGHT, 480),
        );
        assert_eq!(rig.window.mode().size(), Size::new(640, 480));

        rig.send(NativeMessage::new(MessageKind::WindowResized).with_i32(field::WIDTH, 10));
        assert_eq!(rig.window.mode().size(), Size::new(640, 480));
    }

    #[test]
    fn button_motion_and_wheel_arrive_in_order() {
        let mut rig = Rig::new();
        rig.send(NativeMessage::new(MessageKind::MouseMoved).with_point(field::WHERE, Point::new(10.0, 10.0)));
        rig.send(
            NativeMessage::new(MessageKind::MouseDown)
                .with_point(field::WHERE, Point::new(10.0, 10.0))
                .with_i32(field::BUTTONS, native::PRIMARY_MOUSE_BUTTON as i32),
        );
        rig.send(NativeMessage::new(MessageKind::MouseWheelChanged).with_f32(field::WHEEL_DELTA_Y, 5.0));

        let events = rig.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], InputEvent::Motion(_)));
        match &events[1] {
            InputEvent::Button(b) => {
                assert_eq!(b.button, MouseButton::Left);
                assert!(b.pressed);
            }
            other => panic!("expected button, got {other:?}"),
        }
        match (&events[2], &events[3]) {
            (InputEvent::Button(p), InputEvent::Button(r)) => {
                assert_eq!((p.button, p.pressed), (MouseButton::WheelUp, true));
                assert_eq!((r.button, r.pressed), (MouseButton::WheelUp, false));
                assert_eq!(p.position, PointI::new(10, 10));
                assert_eq!(p.button_mask, ButtonMask::LEFT);
            }
            other => panic!("expected wheel pair, got {other:?}"),
        }
    }

    #[test]
    fn pointer_watch_follows_translated_state() {
        let mut rig = Rig::new();
        let watch = rig.dispatcher.watch();
        rig.send(
            NativeMessage::new(MessageKind::MouseMoved)
                .with_point(field::WHERE, Point::new(33.0, 44.0))
                .with_i32(field::BUTTONS, native::SECONDARY_MOUSE_BUTTON as i32),
        );
        assert_eq!(watch.position(), PointI::new(33, 44));
        assert_eq!(watch.button_mask(), ButtonMask::RIGHT);
    }

    #[test]
    fn transit_signals_precede_motion() {
        let mut rig = Rig::new();
        rig.send(
            NativeMessage::new(MessageKind::MouseMoved)
                .with_i32(field::TRANSIT, crate::message::transit::ENTERED)
                .with_point(field::WHERE, Point::new(1.0, 1.0)),
        );
        assert_eq!(rig.recorder.heard(), vec![Heard::Signal(Lifecycle::PointerEnter)]);
        assert_eq!(rig.events().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn drop_delivers_all_resolved_paths_once() {
        let mut rig = Rig::new();
        rig.send(
            NativeMessage::new(MessageKind::SimpleData)
                .with_ref(field::REFS, "/tmp/one")
                .with_ref(field::REFS, "bogus")
                .with_ref(field::REFS, "/tmp/two"),
        );
        assert_eq!(
            rig.recorder.heard(),
            vec![Heard::Files(vec![PathBuf::from("/tmp/one"), PathBuf::from("/tmp/two")])]
        );
    }

    #[test]
    fn drop_with_nothing_resolvable_is_silent() {
        let mut rig = Rig::new();
        rig.send(NativeMessage::new(MessageKind::SimpleData).with_ref(field::REFS, "bogus"));
        rig.send(NativeMessage::new(MessageKind::SimpleData));
        assert!(rig.recorder.heard().is_empty());
    }

    #[test]
    fn malformed_key_emits_nothing() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.send(NativeMessage::new(MessageKind::KeyDown).with_i32(field::KEY, 0x3c)),
            Dispatch::Handled
        );
        assert!(rig.events().is_empty());
    }
}
