// ── Window session ────────────────────────────────────────────────────────────
//
// The one authoritative record of the window's logical state.  The message
// dispatcher writes size and focus; the coordinator writes everything else,
// and only after the native toolkit accepted the change.

use crate::geometry::{PointI, Rect, Size};

use super::mode::VideoMode;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSession {
    pub(crate) mode: VideoMode,
    pub(crate) position: PointI,
    pub(crate) min_size: Size,
    pub(crate) max_size: Size,
    pub(crate) focused: bool,
    /// Frame recorded when maximize was requested.
    pub(crate) restore_frame: Option<Rect>,
    pub(crate) cursor_grabbed: bool,
}

impl Default for WindowSession {
    fn default() -> Self {
        Self {
            mode: VideoMode::default().baseline(),
            position: PointI::default(),
            min_size: Size::ZERO,
            max_size: Size::ZERO,
            focused: true,
            restore_frame: None,
            cursor_grabbed: false,
        }
    }
}

impl WindowSession {
    /// Session for a window that was just created in its baseline state.
    pub fn new(desired: &VideoMode, frame: Rect, min_size: Size, max_size: Size) -> Self {
        let mut mode = desired.baseline();
        mode.width = frame.size.width;
        mode.height = frame.size.height;
        Self {
            mode,
            position: frame.origin,
            min_size,
            max_size,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> &VideoMode {
        &self.mode
    }

    pub fn frame(&self) -> Rect {
        Rect {
            origin: self.position,
            size: self.mode.size(),
        }
    }

    /// Record a native resize.  Only the dimensions change.
    pub fn resized(&mut self, width: i32, height: i32) {
        self.mode.width = width;
        self.mode.height = height;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn max_size(&self) -> Size {
        self.max_size
    }
}

/// A non-zero maximum must not be smaller than the minimum on either axis.
pub fn max_size_allowed(min: Size, max: Size) -> bool {
    max.is_zero() || (max.width >= min.width && max.height >= min.height)
}

/// A non-zero minimum must not exceed a non-zero maximum on either axis.
pub fn min_size_allowed(min: Size, max: Size) -> bool {
    min.is_zero() || max.is_zero() || (min.width <= max.width && min.height <= max.height)
}
