// ── Native notifications ──────────────────────────────────────────────────────
//
// A `NativeMessage` is one occurrence delivered by the windowing toolkit: a
// kind tag plus a bag of named, typed, optionally-present fields.  Every
// access goes through a `find_*` query that returns `None` when the field is
// absent or carries a different type; handlers never assume presence.
//
// Messages are serde-serializable so recorded sessions can be replayed
// headlessly (see `main.rs`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

// ── Kinds ─────────────────────────────────────────────────────────────────────

/// What a notification is about.  Anything the dispatcher does not route is
/// handed back to the toolkit's default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    MouseDown,
    MouseUp,
    MouseMoved,
    MouseWheelChanged,
    KeyDown,
    KeyUp,
    ModifiersChanged,
    WindowResized,
    WindowActivated,
    /// Drag-and-drop payload (file references).
    SimpleData,
    QuitRequested,
    /// A toolkit code this layer does not interpret.
    Other(u32),
}

// ── Field names ───────────────────────────────────────────────────────────────

/// Field names used by the translators.
pub mod field {
    pub const WHERE: &str = "where";
    pub const WHEN: &str = "when";
    pub const BUTTONS: &str = "buttons";
    pub const MODIFIERS: &str = "modifiers";
    pub const OLD_MODIFIERS: &str = "be:old_modifiers";
    pub const CLICKS: &str = "clicks";
    pub const TRANSIT: &str = "be:transit";
    pub const TABLET_X: &str = "be:tablet_x";
    pub const TABLET_Y: &str = "be:tablet_y";
    pub const TABLET_PRESSURE: &str = "be:tablet_pressure";
    pub const TABLET_TILT_X: &str = "be:tablet_tilt_x";
    pub const TABLET_TILT_Y: &str = "be:tablet_tilt_y";
    pub const WHEEL_DELTA_X: &str = "be:wheel_delta_x";
    pub const WHEEL_DELTA_Y: &str = "be:wheel_delta_y";
    pub const RAW_CHAR: &str = "raw_char";
    pub const KEY: &str = "key";
    pub const KEY_REPEAT: &str = "be:key_repeat";
    pub const BYTES: &str = "bytes";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const ACTIVE: &str = "active";
    pub const REFS: &str = "refs";
}

/// Values of the `be:transit` field on motion notifications.
pub mod transit {
    pub const ENTERED: i32 = 0;
    pub const INSIDE: i32 = 1;
    pub const EXITED: i32 = 2;
    pub const OUTSIDE: i32 = 3;
}

// ── Values ────────────────────────────────────────────────────────────────────

/// A file reference attached to a drop notification.  Resolution to a
/// filesystem path happens in the drop translator and may fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

/// One typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Int32(i32),
    Int64(i64),
    Float(f32),
    Bool(bool),
    Point(Point),
    String(String),
    Ref(FileRef),
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A single native notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeMessage {
    pub what: MessageKind,
    /// Each name holds an ordered array of values; scalar lookups read index 0.
    #[serde(default)]
    fields: BTreeMap<String, Vec<FieldValue>>,
}

impl NativeMessage {
    pub fn new(what: MessageKind) -> Self {
        Self {
            what,
            fields: BTreeMap::new(),
        }
    }

    /// Append a value under `name`.
    pub fn add(&mut self, name: &str, value: FieldValue) -> &mut Self {
        self.fields.entry(name.to_owned()).or_default().push(value);
        self
    }

    pub fn with_i32(mut self, name: &str, v: i32) -> Self {
        self.add(name, FieldValue::Int32(v));
        self
    }

    pub fn with_i64(mut self, name: &str, v: i64) -> Self {
        self.add(name, FieldValue::Int64(v));
        self
    }

    pub fn with_f32(mut self, name: &str, v: f32) -> Self {
        self.add(name, FieldValue::Float(v));
        self
    }

    pub fn with_bool(mut self, name: &str, v: bool) -> Self {
        self.add(name, FieldValue::Bool(v));
        self
    }

    pub fn with_point(mut self, name: &str, v: Point) -> Self {
        self.add(name, FieldValue::Point(v));
        self
    }

    pub fn with_string(mut self, name: &str, v: impl Into<String>) -> Self {
        self.add(name, FieldValue::String(v.into()));
        self
    }

    pub fn with_ref(mut self, name: &str, v: impl Into<String>) -> Self {
        self.add(name, FieldValue::Ref(FileRef(v.into())));
        self
    }

    fn value(&self, name: &str, index: usize) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|vs| vs.get(index))
    }

    pub fn find_i32(&self, name: &str) -> Option<i32> {
        match self.value(name, 0)? {
            FieldValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn find_i64(&self, name: &str) -> Option<i64> {
        match self.value(name, 0)? {
            FieldValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn find_f32(&self, name: &str) -> Option<f32> {
        match self.value(name, 0)? {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn find_bool(&self, name: &str) -> Option<bool> {
        match self.value(name, 0)? {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn find_point(&self, name: &str) -> Option<Point> {
        match self.value(name, 0)? {
            FieldValue::Point(v) => Some(*v),
            _ => None,
        }
    }

    pub fn find_string(&self, name: &str) -> Option<&str> {
        match self.value(name, 0)? {
            FieldValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The `index`-th file reference stored under `name`.
    ///
    /// Returns `None` once enumeration is exhausted.  A value of the wrong
    /// type also ends enumeration, the same as a missing entry.
    pub fn find_ref(&self, name: &str, index: usize) -> Option<&FileRef> {
        match self.value(name, index)? {
            FieldValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Presence test that ignores the stored value.
    pub fn has_i32(&self, name: &str) -> bool {
        self.find_i32(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_none() {
        let msg = NativeMessage::new(MessageKind::MouseDown);
        assert_eq!(msg.find_point(field::WHERE), None);
        assert!(!msg.has_i32(field::BUTTONS));
    }

    #[test]
    fn type_mismatch_is_none() {
        let msg = NativeMessage::new(MessageKind::MouseDown).with_f32(field::BUTTONS, 1.0);
        assert_eq!(msg.find_i32(field::BUTTONS), None);
        assert_eq!(msg.find_f32(field::BUTTONS), Some(1.0));
    }

    #[test]
    fn refs_enumerate_by_index_until_exhausted() {
        let msg = NativeMessage::new(MessageKind::SimpleData)
            .with_ref(field::REFS, "/boot/home/a.png")
            .with_ref(field::REFS, "/boot/home/b.png");
        assert_eq!(msg.find_ref(field::REFS, 0).map(|r| r.0.as_str()), Some("/boot/home/a.png"));
        assert_eq!(msg.find_ref(field::REFS, 1).map(|r| r.0.as_str()), Some("/boot/home/b.png"));
        assert_eq!(msg.find_ref(field::REFS, 2), None);
    }

    #[test]
    fn recorded_message_parses_from_json() {
        let json = r#"{
            "what": "mouse_moved",
            "fields": {
                "where": [{"point": {"x": 12.0, "y": 40.5}}],
                "buttons": [{"int32": 1}]
            }
        }"#;
        let msg: NativeMessage = serde_json::from_str(json).expect("parse");
        assert_eq!(msg.what, MessageKind::MouseMoved);
        assert_eq!(msg.find_point(field::WHERE), Some(Point::new(12.0, 40.5)));
        assert_eq!(msg.find_i32(field::BUTTONS), Some(1));
    }

    #[test]
    fn unknown_kind_round_trips_through_other() {
        let json = r#"{"what": {"other": 1234}}"#;
        let msg: NativeMessage = serde_json::from_str(json).expect("parse");
        assert_eq!(msg.what, MessageKind::Other(1234));
    }
}
