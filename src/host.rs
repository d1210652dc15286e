// ── Host-facing surface ───────────────────────────────────────────────────────
//
// The host registers an input sink (always present) and, optionally, a
// lifecycle listener (its main loop).  The visual subsystem is the host's
// renderer front-end that the coordinator brings up and tears down.

use std::path::PathBuf;
use std::sync::mpsc;

use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::input::InputEvent;

/// Window-level signals delivered to the host's main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    QuitRequested,
    FocusIn,
    FocusOut,
    PointerEnter,
    PointerExit,
}

/// Receives normalized input events in strict delivery order.
pub trait EventSink {
    fn push(&mut self, event: InputEvent);
}

impl EventSink for Vec<InputEvent> {
    fn push(&mut self, event: InputEvent) {
        Vec::push(self, event);
    }
}

/// Hand events from the toolkit thread to a render-thread receiver.
impl EventSink for mpsc::Sender<InputEvent> {
    fn push(&mut self, event: InputEvent) {
        if self.send(event).is_err() {
            trace!("input receiver gone, event discarded");
        }
    }
}

/// The host's main loop as seen from the window.
pub trait LifecycleListener {
    fn notify(&mut self, signal: Lifecycle);

    /// Files dropped onto the window, in enumeration order.  Never empty.
    fn drop_files(&mut self, paths: Vec<PathBuf>);
}

/// Renderer front-end owned by the host.
pub trait VisualSubsystem {
    /// Whether the renderer can run on the context that was just created.
    fn is_viable(&self) -> bool {
        true
    }

    /// Register renderer settings and make it the active backend.
    fn activate(&mut self) {}

    fn init(&mut self) -> Result<()>;

    /// Stop all render-side work.  Called before the context is destroyed.
    fn finish(&mut self);
}

/// Visual subsystem that does nothing; used for headless runs.
#[derive(Debug, Default)]
pub struct NullVisual {
    running: bool,
}

impl NullVisual {
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl VisualSubsystem for NullVisual {
    fn init(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn finish(&mut self) {
        self.running = false;
    }
}

/// Everything the dispatcher delivers to.
pub struct HostLink {
    pub(crate) sink: Box<dyn EventSink + Send>,
    pub(crate) listener: Option<Box<dyn LifecycleListener + Send>>,
}

impl HostLink {
    pub fn new(sink: Box<dyn EventSink + Send>) -> Self {
        Self {
            sink,
            listener: None,
        }
    }

    pub(crate) fn emit(&mut self, event: InputEvent) {
        trace!(?event, "input");
        self.sink.push(event);
    }

    /// Notify the listener if one is registered.
    pub(crate) fn signal(&mut self, signal: Lifecycle) {
        if let Some(listener) = self.listener.as_mut() {
            listener.notify(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointI;
    use crate::input::{ModifierEvent, Modifiers};

    fn sample() -> InputEvent {
        InputEvent::Modifiers(ModifierEvent {
            position: PointI::new(1, 2),
            modifiers: Modifiers::default(),
            changed: Modifiers::default(),
        })
    }

    #[test]
    fn channel_sink_preserves_order() {
        let (tx, rx) = mpsc::channel();
        let mut link = HostLink::new(Box::new(tx));
        link.emit(sample());
        link.emit(sample());
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut link = HostLink::new(Box::new(tx));
        link.emit(sample());
    }

    #[test]
    fn null_visual_runs_between_init_and_finish() {
        let mut visual = NullVisual::default();
        assert!(!visual.is_running());
        visual.init().unwrap();
        assert!(visual.is_running());
        visual.finish();
        assert!(!visual.is_running());
    }

    #[test]
    fn signal_without_listener_is_a_no_op() {
        let mut link = HostLink::new(Box::new(Vec::new()));
        link.signal(Lifecycle::FocusIn);
    }
}
