// ── Video-mode descriptor ─────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Logical window dimensions and display flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMode {
    pub width: i32,
    pub height: i32,
    pub fullscreen: bool,
    pub resizable: bool,
    pub maximized: bool,
    pub minimized: bool,
    pub always_on_top: bool,
    pub borderless: bool,
    pub use_vsync: bool,
}

impl Default for VideoMode {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 600,
            fullscreen: false,
            resizable: true,
            maximized: false,
            minimized: false,
            always_on_top: false,
            borderless: false,
            use_vsync: true,
        }
    }
}

impl VideoMode {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The same dimensions with every chrome flag cleared.
    ///
    /// This is the state a freshly created native window is in.
    pub fn baseline(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            use_vsync: self.use_vsync,
            fullscreen: false,
            resizable: false,
            maximized: false,
            minimized: false,
            always_on_top: false,
            borderless: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_clears_flags_but_keeps_size_and_vsync() {
        let mode = VideoMode {
            width: 640,
            height: 480,
            fullscreen: true,
            resizable: true,
            always_on_top: true,
            use_vsync: false,
            ..VideoMode::default()
        };
        let base = mode.baseline();
        assert_eq!(base.size(), Size::new(640, 480));
        assert!(!base.fullscreen && !base.resizable && !base.always_on_top);
        assert!(!base.use_vsync);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let mode: VideoMode = serde_json::from_str(r#"{"width": 800}"#).expect("parse");
        assert_eq!(mode.width, 800);
        assert_eq!(mode.height, 600);
        assert!(mode.resizable);
    }
}
