// ── Headless replay ───────────────────────────────────────────────────────────
//
// Feeds a recorded list of native notifications through a headless platform
// and reports everything the host would have seen, one JSON object per line.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::coordinator::Platform;
use crate::dispatch::Dispatch;
use crate::error::Result;
use crate::host::{EventSink, HostLink, Lifecycle, LifecycleListener, NullVisual};
use crate::input::InputEvent;
use crate::message::{MessageKind, NativeMessage};
use crate::platform::headless::HeadlessToolkit;
use crate::video::VideoMode;

/// One observable outcome of a replayed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    Input(InputEvent),
    Lifecycle(Lifecycle),
    Drop(Vec<PathBuf>),
    /// Left to the toolkit's default handling.
    Unhandled(MessageKind),
}

/// Input sink and lifecycle listener writing into one ordered tape.
#[derive(Clone, Default)]
struct Tape(Arc<Mutex<Vec<Record>>>);

impl Tape {
    fn record(&self, record: Record) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }

    fn into_records(self) -> Vec<Record> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for Tape {
    fn push(&mut self, event: InputEvent) {
        self.record(Record::Input(event));
    }
}

impl LifecycleListener for Tape {
    fn notify(&mut self, signal: Lifecycle) {
        self.record(Record::Lifecycle(signal));
    }

    fn drop_files(&mut self, paths: Vec<PathBuf>) {
        self.record(Record::Drop(paths));
    }
}

/// Dispatch `messages` in order until a quit request is accepted.
pub fn replay<I>(messages: I, mode: &VideoMode) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = NativeMessage>,
{
    let tape = Tape::default();
    let mut platform = Platform::new(
        HeadlessToolkit::default(),
        HostLink::new(Box::new(tape.clone())),
        Box::new(NullVisual::default()),
        "replay",
    );
    platform.set_listener(Box::new(tape.clone()));
    platform.initialize(mode, 0, 0)?;

    let mut dispatched = 0usize;
    for msg in messages {
        dispatched += 1;
        match platform.dispatch(&msg) {
            Dispatch::Handled => {}
            Dispatch::Default => tape.record(Record::Unhandled(msg.what)),
            Dispatch::QuitAccepted => {
                debug!(dispatched, "quit accepted, replay stops");
                break;
            }
        }
    }
    platform.finalize();
    info!(dispatched, "replay finished");
    Ok(tape.into_records())
}

/// Replay a JSON array of notifications from `path`, writing JSON lines to
/// `out`.  Returns the number of records written.
pub fn replay_file(path: &Path, mode: &VideoMode, out: &mut impl Write) -> Result<usize> {
    let data = fs::read(path)?;
    let messages: Vec<NativeMessage> = serde_json::from_slice(&data)?;
    info!(path = %path.display(), count = messages.len(), "replaying notifications");

    let records = replay(messages, mode)?;
    for record in &records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::input::MouseButton;
    use crate::message::field;

    #[test]
    fn lifecycle_and_input_share_one_order() {
        let records = replay(
            vec![
                NativeMessage::new(MessageKind::WindowActivated).with_bool(field::ACTIVE, true),
                NativeMessage::new(MessageKind::MouseWheelChanged).with_f32(field::WHEEL_DELTA_Y, -1.0),
                NativeMessage::new(MessageKind::Other(7)),
                NativeMessage::new(MessageKind::QuitRequested),
                NativeMessage::new(MessageKind::MouseMoved).with_point(field::WHERE, Point::new(1.0, 1.0)),
            ],
            &VideoMode::default(),
        )
        .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0], Record::Lifecycle(Lifecycle::FocusIn));
        match (&records[1], &records[2]) {
            (Record::Input(InputEvent::Button(p)), Record::Input(InputEvent::Button(r))) => {
                assert_eq!(p.button, MouseButton::WheelDown);
                assert!(p.pressed && !r.pressed);
            }
            other => panic!("expected wheel pair, got {other:?}"),
        }
        assert_eq!(records[3], Record::Unhandled(MessageKind::Other(7)));
        assert_eq!(records[4], Record::Lifecycle(Lifecycle::QuitRequested));
    }

    #[test]
    fn file_replay_writes_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(
            &path,
            r#"[
                {"what": "mouse_down", "fields": {"where": [{"point": {"x": 3.0, "y": 4.0}}],
                                                 "buttons": [{"int32": 1}]}},
                {"what": "quit_requested"}
            ]"#,
        )
        .expect("write");

        let mut out = Vec::new();
        let written = replay_file(&path, &VideoMode::default(), &mut out).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines[0]["input"]["type"], "button");
        assert_eq!(lines[0]["input"]["button"], "left");
        assert_eq!(lines[1]["lifecycle"], "quit_requested");
    }

    #[test]
    fn malformed_script_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "[{").expect("write");
        let mut out = Vec::new();
        assert!(matches!(
            replay_file(&path, &VideoMode::default(), &mut out),
            Err(crate::error::TetherError::Config(_))
        ));
    }
}
