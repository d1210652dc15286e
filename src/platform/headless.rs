// ── Headless backend ──────────────────────────────────────────────────────────
//
// An in-memory toolkit.  Attribute changes update a simulated window and are
// appended to a shared journal, so callers can assert exactly which native
// calls were made.  Individual operations can be told to fail.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::error::{Result, TetherError};
use crate::geometry::{PointI, Rect, Size};

use super::{NativeCursor, NativeWindow, RenderSurface, Toolkit};

// ── Journal ───────────────────────────────────────────────────────────────────

/// Shared, append-only call log.
#[derive(Debug)]
pub struct Journal<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for Journal<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Journal<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl<T: Clone> Journal<T> {
    fn push(&self, call: T) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| pred(c))
            .count()
    }
}

// ── Calls ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    SetSizeLimits { min: Size, max: Size },
    SetTitle(String),
    MoveTo(PointI),
    ResizeTo(Size),
    CenterOnScreen,
    SetFullscreen(bool),
    SetResizable(bool),
    SetAlwaysOnTop(bool),
    SetBorderless(bool),
    Zoom(Rect),
    Minimize(bool),
    Activate,
    Show,
    SetPointerPosition(PointI),
    SetCursor(NativeCursor),
    ShowCursor(bool),
    Alert { title: String, text: String },
    CreateSurface,
}

/// Operation names accepted by [`HeadlessWindow::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOp {
    SetFullscreen,
    SetResizable,
    SetAlwaysOnTop,
    SetBorderless,
    Zoom,
    Minimize,
    SetCursor,
    CreateSurface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Attach,
    Lock,
    Unlock,
    Swap { vsync: bool },
    Destroy,
}

// ── Toolkit ───────────────────────────────────────────────────────────────────

/// Windows created by one toolkit share its journals, so calls stay
/// observable after the window itself is gone.
#[derive(Debug, Clone)]
pub struct HeadlessToolkit {
    screen: Rect,
    work_area: Option<Rect>,
    broken_surface: bool,
    calls: Journal<NativeCall>,
    surface_calls: Journal<SurfaceCall>,
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self {
            screen: Rect::new(0, 0, 1920, 1080),
            work_area: None,
            broken_surface: false,
            calls: Journal::default(),
            surface_calls: Journal::default(),
        }
    }
}

impl HeadlessToolkit {
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    /// Reserve part of the screen, as a task bar would.  Defaults to the
    /// whole screen.
    pub fn with_work_area(mut self, work_area: Rect) -> Self {
        self.work_area = Some(work_area);
        self
    }

    /// Windows created from now on hand out surfaces that fail to attach.
    pub fn with_broken_surface(mut self) -> Self {
        self.broken_surface = true;
        self
    }

    pub fn calls(&self) -> Journal<NativeCall> {
        self.calls.clone()
    }

    pub fn surface_calls(&self) -> Journal<SurfaceCall> {
        self.surface_calls.clone()
    }
}

impl Toolkit for HeadlessToolkit {
    type Window = HeadlessWindow;

    fn create_window(&mut self, title: &str, size: Size) -> Result<HeadlessWindow> {
        info!(title, width = size.width, height = size.height, "headless window created");
        Ok(HeadlessWindow {
            title: title.to_owned(),
            frame: Rect {
                origin: PointI::default(),
                size,
            },
            screen: self.screen,
            work_area: self.work_area.unwrap_or(self.screen),
            min_size: Size::ZERO,
            max_size: Size::new(32_768, 32_768),
            fullscreen: false,
            resizable: false,
            always_on_top: false,
            borderless: false,
            minimized: false,
            visible: false,
            cursor_visible: true,
            pointer: PointI::default(),
            failing: HashSet::new(),
            broken_surface: self.broken_surface,
            calls: self.calls.clone(),
            surface_calls: self.surface_calls.clone(),
        })
    }
}

// ── Window ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct HeadlessWindow {
    title: String,
    frame: Rect,
    screen: Rect,
    work_area: Rect,
    min_size: Size,
    max_size: Size,
    fullscreen: bool,
    resizable: bool,
    always_on_top: bool,
    borderless: bool,
    minimized: bool,
    visible: bool,
    cursor_visible: bool,
    pointer: PointI,
    failing: HashSet<NativeOp>,
    broken_surface: bool,
    calls: Journal<NativeCall>,
    surface_calls: Journal<SurfaceCall>,
}

impl HeadlessWindow {
    /// Make `op` report failure from now on.
    pub fn fail(&mut self, op: NativeOp) {
        self.failing.insert(op);
    }

    pub fn calls(&self) -> &Journal<NativeCall> {
        &self.calls
    }

    pub fn surface_calls(&self) -> &Journal<SurfaceCall> {
        &self.surface_calls
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn is_always_on_top(&self) -> bool {
        self.always_on_top
    }

    pub fn is_borderless(&self) -> bool {
        self.borderless
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn pointer(&self) -> PointI {
        self.pointer
    }

    fn check(&self, op: NativeOp, function: &'static str) -> Result<()> {
        if self.failing.contains(&op) {
            Err(TetherError::Native { function, code: 1 })
        } else {
            Ok(())
        }
    }
}

impl NativeWindow for HeadlessWindow {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn screen_frame(&self) -> Rect {
        self.screen
    }

    fn work_frame(&self) -> Rect {
        self.work_area
    }

    fn size_limits(&self) -> (Size, Size) {
        (self.min_size, self.max_size)
    }

    fn set_size_limits(&mut self, min: Size, max: Size) -> Result<()> {
        self.calls.push(NativeCall::SetSizeLimits { min, max });
        self.min_size = min;
        self.max_size = max;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.calls.push(NativeCall::SetTitle(title.to_owned()));
        self.title = title.to_owned();
        Ok(())
    }

    fn move_to(&mut self, position: PointI) -> Result<()> {
        self.calls.push(NativeCall::MoveTo(position));
        self.frame.origin = position;
        Ok(())
    }

    fn resize_to(&mut self, size: Size) -> Result<()> {
        self.calls.push(NativeCall::ResizeTo(size));
        self.frame.size = size;
        Ok(())
    }

    fn center_on_screen(&mut self) -> Result<()> {
        self.calls.push(NativeCall::CenterOnScreen);
        self.frame = self.screen.centered(self.frame.size);
        Ok(())
    }

    fn set_fullscreen(&mut self, enabled: bool) -> Result<()> {
        self.calls.push(NativeCall::SetFullscreen(enabled));
        self.check(NativeOp::SetFullscreen, "SetFullScreen")?;
        self.fullscreen = enabled;
        Ok(())
    }

    fn set_resizable(&mut self, enabled: bool) -> Result<()> {
        self.calls.push(NativeCall::SetResizable(enabled));
        self.check(NativeOp::SetResizable, "SetFlags")?;
        self.resizable = enabled;
        Ok(())
    }

    fn set_always_on_top(&mut self, enabled: bool) -> Result<()> {
        self.calls.push(NativeCall::SetAlwaysOnTop(enabled));
        self.check(NativeOp::SetAlwaysOnTop, "SetFeel")?;
        self.always_on_top = enabled;
        Ok(())
    }

    fn set_borderless(&mut self, enabled: bool) -> Result<()> {
        self.calls.push(NativeCall::SetBorderless(enabled));
        self.check(NativeOp::SetBorderless, "SetLook")?;
        self.borderless = enabled;
        Ok(())
    }

    fn zoom(&mut self, frame: Rect) -> Result<()> {
        self.calls.push(NativeCall::Zoom(frame));
        self.check(NativeOp::Zoom, "Zoom")?;
        self.frame = frame;
        Ok(())
    }

    fn minimize(&mut self, minimized: bool) -> Result<()> {
        self.calls.push(NativeCall::Minimize(minimized));
        self.check(NativeOp::Minimize, "Minimize")?;
        self.minimized = minimized;
        Ok(())
    }

    fn is_minimized(&self) -> bool {
        self.minimized
    }

    fn activate(&mut self) -> Result<()> {
        self.calls.push(NativeCall::Activate);
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.calls.push(NativeCall::Show);
        self.visible = true;
        Ok(())
    }

    fn convert_to_screen(&self, point: PointI) -> PointI {
        PointI::new(point.x + self.frame.origin.x, point.y + self.frame.origin.y)
    }

    fn set_pointer_position(&mut self, screen_point: PointI) -> Result<()> {
        self.calls.push(NativeCall::SetPointerPosition(screen_point));
        self.pointer = screen_point;
        Ok(())
    }

    fn set_cursor(&mut self, cursor: NativeCursor) -> Result<()> {
        self.calls.push(NativeCall::SetCursor(cursor));
        self.check(NativeOp::SetCursor, "SetCursor")
    }

    fn show_cursor(&mut self, visible: bool) {
        self.calls.push(NativeCall::ShowCursor(visible));
        self.cursor_visible = visible;
    }

    fn alert(&mut self, title: &str, text: &str) {
        self.calls.push(NativeCall::Alert {
            title: title.to_owned(),
            text: text.to_owned(),
        });
    }

    fn create_surface(&mut self) -> Result<Box<dyn RenderSurface + Send>> {
        self.calls.push(NativeCall::CreateSurface);
        self.check(NativeOp::CreateSurface, "CreateSurface")?;
        let mut surface = HeadlessSurface {
            calls: self.surface_calls.clone(),
            fail_attach: false,
        };
        if self.broken_surface {
            surface.fail_attach();
        }
        Ok(Box::new(surface))
    }
}

// ── Surface ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    calls: Journal<SurfaceCall>,
    fail_attach: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal<SurfaceCall> {
        self.calls.clone()
    }

    pub fn fail_attach(&mut self) {
        self.fail_attach = true;
    }
}

impl RenderSurface for HeadlessSurface {
    fn attach(&mut self) -> Result<()> {
        self.calls.push(SurfaceCall::Attach);
        if self.fail_attach {
            return Err(TetherError::Native {
                function: "AddChild",
                code: 1,
            });
        }
        Ok(())
    }

    fn lock(&mut self) -> Result<()> {
        self.calls.push(SurfaceCall::Lock);
        Ok(())
    }

    fn unlock(&mut self) -> Result<()> {
        self.calls.push(SurfaceCall::Unlock);
        Ok(())
    }

    fn swap(&mut self, vsync: bool) -> Result<()> {
        self.calls.push(SurfaceCall::Swap { vsync });
        Ok(())
    }

    fn destroy(&mut self) {
        self.calls.push(SurfaceCall::Destroy);
    }
}
