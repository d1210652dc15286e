// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the seam between the coordinator and the native
// windowing toolkit.  No `unsafe` lives here; all Win32 FFI is confined to the
// `win32` sub-module and never leaks outward.  The `headless` backend records
// every call and backs the test-suite and the replay tool.

use crate::error::Result;
use crate::geometry::{PointI, Rect, Size};

pub mod headless;

#[cfg(windows)]
pub mod win32;

/// Cursor images the toolkit can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCursor {
    SystemDefault,
    IBeam,
    FollowLink,
    CrossHair,
    Progress,
    Grabbing,
    Grab,
    NotAllowed,
    ResizeNorthSouth,
    ResizeEastWest,
    ResizeNorthEastSouthWest,
    ResizeNorthWestSouthEast,
    Move,
    Help,
}

/// Creates the one native window.
pub trait Toolkit {
    type Window: NativeWindow;

    /// Create a hidden window whose client area is `size`.
    ///
    /// The window starts in the baseline state: fixed size, normal stacking
    /// level, decorated, windowed, not maximized.
    fn create_window(&mut self, title: &str, size: Size) -> Result<Self::Window>;
}

/// Native window attributes.  Every setter reports whether the toolkit
/// accepted the change; callers update logical state only on `Ok`.
pub trait NativeWindow {
    /// Client frame in screen coordinates.
    fn frame(&self) -> Rect;
    /// Frame of the screen the window is on.
    fn screen_frame(&self) -> Rect;
    /// Part of that screen left free by task bars and docks.
    fn work_frame(&self) -> Rect;
    /// Native (min, max) client-size limits.
    fn size_limits(&self) -> (Size, Size);
    fn set_size_limits(&mut self, min: Size, max: Size) -> Result<()>;

    fn set_title(&mut self, title: &str) -> Result<()>;
    fn move_to(&mut self, position: PointI) -> Result<()>;
    fn resize_to(&mut self, size: Size) -> Result<()>;
    fn center_on_screen(&mut self) -> Result<()>;

    fn set_fullscreen(&mut self, enabled: bool) -> Result<()>;
    fn set_resizable(&mut self, enabled: bool) -> Result<()>;
    fn set_always_on_top(&mut self, enabled: bool) -> Result<()>;
    fn set_borderless(&mut self, enabled: bool) -> Result<()>;
    /// Move and size the window to exactly `frame`.
    fn zoom(&mut self, frame: Rect) -> Result<()>;
    fn minimize(&mut self, minimized: bool) -> Result<()>;
    fn is_minimized(&self) -> bool;

    /// Bring the window to the foreground.
    fn activate(&mut self) -> Result<()>;
    fn show(&mut self) -> Result<()>;

    fn convert_to_screen(&self, point: PointI) -> PointI;
    fn set_pointer_position(&mut self, screen_point: PointI) -> Result<()>;
    fn set_cursor(&mut self, cursor: NativeCursor) -> Result<()>;
    fn show_cursor(&mut self, visible: bool);

    /// Modal message to the user.
    fn alert(&mut self, title: &str, text: &str);

    /// Create the drawable surface the rendering context binds to.
    fn create_surface(&mut self) -> Result<Box<dyn RenderSurface + Send>>;
}

/// The drawable side of a rendering context.
pub trait RenderSurface {
    /// Bind the surface to the window.
    fn attach(&mut self) -> Result<()>;
    /// Make the graphics context current on the calling thread.
    fn lock(&mut self) -> Result<()>;
    fn unlock(&mut self) -> Result<()>;
    fn swap(&mut self, vsync: bool) -> Result<()>;
    fn destroy(&mut self);
}
