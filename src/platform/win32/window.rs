// ── Native window ─────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the window class and create the one top-level window.
//   • Translate WM_* messages into `NativeMessage` values in the WndProc.
//   • Pump the thread's message queue without blocking.
//   • Implement `NativeWindow` over window styles and SetWindowPos.
//   • Expose a safe error-dialog helper for use by main().
//
// The WndProc cannot borrow the platform, so translated messages go into a
// thread-local queue that `pump` drains.

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Once;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, BOOL, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM},
        Graphics::Gdi::{
            ClientToScreen, GetMonitorInfoW, MonitorFromWindow, MONITORINFO,
            MONITOR_DEFAULTTONEAREST,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Input::KeyboardAndMouse::{
                GetKeyState, GetKeyboardState, ToUnicode, TrackMouseEvent, TME_LEAVE,
                TRACKMOUSEEVENT,
            },
            Shell::{DragAcceptFiles, DragFinish, DragQueryFileW, HDROP},
            WindowsAndMessaging::{
                AdjustWindowRectEx, CreateWindowExW, DefWindowProcW, DestroyWindow,
                DispatchMessageW, GetClientRect, GetMessageTime, GetWindowLongPtrW,
                IsIconic, IsWindowVisible, LoadCursorW, MessageBoxW, PeekMessageW,
                PostQuitMessage, RegisterClassExW, SetCursor, SetCursorPos,
                SetForegroundWindow, SetWindowLongPtrW, SetWindowPos, SetWindowTextW,
                ShowCursor, ShowWindow, CS_DBLCLKS, CS_OWNDC, CW_USEDEFAULT, GWL_STYLE,
                HCURSOR, HMENU, HWND_NOTOPMOST, HWND_TOPMOST, IDC_ARROW, IDC_CROSS,
                IDC_HAND, IDC_HELP, IDC_IBEAM, IDC_NO, IDC_SIZEALL, IDC_SIZENESW,
                IDC_SIZENS, IDC_SIZENWSE, IDC_SIZEWE, IDC_WAIT, MB_ICONERROR,
                MB_ICONWARNING, MB_OK, MINMAXINFO, MSG, PM_REMOVE, SET_WINDOW_POS_FLAGS,
                SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
                SW_MINIMIZE, SW_RESTORE, SW_SHOW, WINDOW_EX_STYLE, WINDOW_STYLE,
                WM_ACTIVATE, WM_CLOSE, WM_DESTROY, WM_DROPFILES, WM_GETMINMAXINFO,
                WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDBLCLK, WM_LBUTTONDOWN, WM_LBUTTONUP,
                WM_MBUTTONDBLCLK, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHWHEEL,
                WM_MOUSELEAVE, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDBLCLK,
                WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SETCURSOR, WM_SIZE, WM_SYSKEYDOWN,
                WM_SYSKEYUP, WNDCLASSEXW, WS_CAPTION, WS_MAXIMIZEBOX, WS_MINIMIZEBOX,
                WS_OVERLAPPED, WS_POPUP, WS_SYSMENU, WS_THICKFRAME, WS_VISIBLE,
            },
        },
    },
};

use tracing::{debug, trace, warn};

use crate::error::{Result, TetherError};
use crate::geometry::{Point, PointI, Rect, Size};
use crate::input::state::native;
use crate::message::{field, transit, MessageKind, NativeMessage};
use crate::platform::{NativeCursor, NativeWindow, RenderSurface, Toolkit};

use super::{dpi, gl::WglSurface, keys};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the window class.
const CLASS_NAME: PCWSTR = w!("TetherWindow");

/// Win32 `ERROR_CLASS_ALREADY_EXISTS`.
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

/// `HTCLIENT` hit-test code carried in the low word of WM_SETCURSOR's LPARAM.
const HT_CLIENT: isize = 1;

const WHEEL_DELTA: f32 = 120.0;

// ── Thread-local capture state ────────────────────────────────────────────────

/// State the WndProc needs between messages.
struct Capture {
    queue: VecDeque<NativeMessage>,
    tracking_leave: bool,
    last_where: Point,
    modifiers: u32,
    cursor: HCURSOR,
    min_size: Size,
    max_size: Size,
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            tracking_leave: false,
            last_where: Point::default(),
            modifiers: 0,
            cursor: HCURSOR::default(),
            min_size: Size::ZERO,
            max_size: Size::ZERO,
        }
    }
}

thread_local! {
    static CAPTURE: RefCell<Capture> = RefCell::new(Capture::default());
}

fn with_capture<R>(f: impl FnOnce(&mut Capture) -> R) -> R {
    CAPTURE.with(|c| f(&mut c.borrow_mut()))
}

fn enqueue(msg: NativeMessage) {
    with_capture(|c| c.queue.push_back(msg));
}

/// Dispatch every pending Win32 message and return the notifications they
/// produced, in delivery order.  Never blocks.
pub fn pump() -> Vec<NativeMessage> {
    let mut msg = MSG::default();
    // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
    // messages for all windows on this thread; 0,0 filter accepts all.
    while unsafe { PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE) }.as_bool() {
        if msg.message == WM_QUIT {
            enqueue(NativeMessage::new(MessageKind::QuitRequested));
            break;
        }
        // SAFETY: msg was populated by a successful PeekMessageW call.
        // Keys are translated in the WndProc, so TranslateMessage is skipped.
        unsafe {
            DispatchMessageW(&msg);
        }
    }
    with_capture(|c| c.queue.drain(..).collect())
}

// ── Toolkit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Win32Toolkit;

impl Win32Toolkit {
    pub fn new() -> Self {
        Self
    }
}

impl Toolkit for Win32Toolkit {
    type Window = Win32Window;

    fn create_window(&mut self, title: &str, size: Size) -> Result<Win32Window> {
        static DPI: Once = Once::new();
        DPI.call_once(dpi::init);

        // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
        // always valid for the process lifetime.
        let hmodule = unsafe { GetModuleHandleW(None) }?;
        let hinstance = HINSTANCE(hmodule.0);
        register_class(hinstance)?;

        let style = Styling::default().style();
        let outer = outer_rect(Rect::new(0, 0, size.width, size.height), style)?;
        let title_wide = wide(title);

        // SAFETY: CLASS_NAME is registered; title_wide is a live, null-terminated
        // UTF-16 string for the duration of the call.  Null parent and menu
        // create a plain top-level window; no creation data is passed.
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                CLASS_NAME,
                PCWSTR(title_wide.as_ptr()),
                style,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                outer.right - outer.left,
                outer.bottom - outer.top,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            )
        }?;

        // SAFETY: hwnd was just created and is valid.
        unsafe { DragAcceptFiles(hwnd, BOOL::from(true)) };

        let mut window = Win32Window {
            hwnd,
            styling: Styling::default(),
            windowed_frame: None,
            cursor_visible: true,
        };
        window.set_cursor(NativeCursor::SystemDefault)?;
        debug!(title, width = size.width, height = size.height, "native window created");
        Ok(window)
    }
}

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadCursorW with IDC_ARROW loads a built-in resource that
    // exists on all Windows versions.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~80 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        // CS_OWNDC keeps one device context for the GL surface;
        // CS_DBLCLKS delivers the double-click messages.
        style: CS_OWNDC | CS_DBLCLKS,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hCursor: cursor,
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised; CLASS_NAME is a valid
    // null-terminated UTF-16 literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        let err = last_error("RegisterClassExW");
        if matches!(err, TetherError::Native { code, .. } if code == ERROR_CLASS_ALREADY_EXISTS) {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

// ── Window ────────────────────────────────────────────────────────────────────

pub struct Win32Window {
    hwnd: HWND,
    styling: Styling,
    /// Client frame to return to when leaving fullscreen.
    windowed_frame: Option<Rect>,
    cursor_visible: bool,
}

/// Chrome flags the installed window style was built from.  Only replaced
/// once the native restyle has succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Styling {
    resizable: bool,
    borderless: bool,
    fullscreen: bool,
}

impl Styling {
    fn style(self) -> WINDOW_STYLE {
        if self.borderless || self.fullscreen {
            return WS_POPUP;
        }
        let mut style = WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX;
        if self.resizable {
            style |= WS_THICKFRAME | WS_MAXIMIZEBOX;
        }
        style
    }

    fn with_resizable(self, resizable: bool) -> Self {
        Self { resizable, ..self }
    }

    fn with_borderless(self, borderless: bool) -> Self {
        Self { borderless, ..self }
    }

    fn with_fullscreen(self, fullscreen: bool) -> Self {
        Self { fullscreen, ..self }
    }
}

fn rect_from(rc: RECT) -> Rect {
    Rect::new(rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top)
}

/// Outer window rectangle whose client area is `client`.
fn outer_rect(client: Rect, style: WINDOW_STYLE) -> Result<RECT> {
    let mut rc = RECT {
        left: client.origin.x,
        top: client.origin.y,
        right: client.origin.x + client.size.width,
        bottom: client.origin.y + client.size.height,
    };
    // SAFETY: rc is a valid, writable RECT.
    unsafe { AdjustWindowRectEx(&mut rc, style, BOOL::from(false), WINDOW_EX_STYLE(0)) }?;
    Ok(rc)
}

impl Win32Window {
    /// Install the style for `next` and place the client area at `client`.
    /// On failure the previous style is put back and `self.styling` is left
    /// untouched.
    fn restyle(&mut self, next: Styling, client: Rect) -> Result<()> {
        // SAFETY: hwnd is owned by self and alive.
        let visible = if unsafe { IsWindowVisible(self.hwnd) }.as_bool() {
            WS_VISIBLE
        } else {
            WINDOW_STYLE(0)
        };
        self.install_style(next.style() | visible)?;
        if let Err(e) = self.place_styled(client, next.style(), SWP_FRAMECHANGED) {
            if let Err(undo) = self.install_style(self.styling.style() | visible) {
                warn!(error = %undo, "previous window style not restored");
            }
            return Err(e);
        }
        self.styling = next;
        Ok(())
    }

    fn install_style(&self, style: WINDOW_STYLE) -> Result<()> {
        // SAFETY: GWL_STYLE takes the style bits; hwnd is alive.  Every style
        // we install is non-zero, so a zero previous value signals failure.
        let previous = unsafe { SetWindowLongPtrW(self.hwnd, GWL_STYLE, style.0 as isize) };
        if previous == 0 {
            return Err(last_error("SetWindowLongPtrW"));
        }
        Ok(())
    }

    fn monitor_info(&self) -> Option<MONITORINFO> {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        // SAFETY: hwnd is alive; MonitorFromWindow with DEFAULTTONEAREST always
        // returns a monitor; info has cbSize set.
        let ok = unsafe {
            let monitor = MonitorFromWindow(self.hwnd, MONITOR_DEFAULTTONEAREST);
            GetMonitorInfoW(monitor, &mut info).as_bool()
        };
        ok.then_some(info)
    }

    fn place(&self, client: Rect, extra: SET_WINDOW_POS_FLAGS) -> Result<()> {
        self.place_styled(client, self.styling.style(), extra)
    }

    fn place_styled(&self, client: Rect, style: WINDOW_STYLE, extra: SET_WINDOW_POS_FLAGS) -> Result<()> {
        let outer = outer_rect(client, style)?;
        // SAFETY: hwnd is alive; SWP_NOZORDER makes the insert-after handle unused.
        unsafe {
            SetWindowPos(
                self.hwnd,
                HWND::default(),
                outer.left,
                outer.top,
                outer.right - outer.left,
                outer.bottom - outer.top,
                SWP_NOZORDER | SWP_NOACTIVATE | extra,
            )
        }?;
        Ok(())
    }
}

impl NativeWindow for Win32Window {
    fn frame(&self) -> Rect {
        let mut rc = RECT::default();
        let mut origin = POINT::default();
        // SAFETY: hwnd is alive; rc and origin are valid out-pointers.
        let ok = unsafe {
            GetClientRect(self.hwnd, &mut rc).is_ok()
                && ClientToScreen(self.hwnd, &mut origin).as_bool()
        };
        if !ok {
            warn!("client frame unavailable");
            return Rect::default();
        }
        Rect::new(origin.x, origin.y, rc.right - rc.left, rc.bottom - rc.top)
    }

    fn screen_frame(&self) -> Rect {
        self.monitor_info()
            .map(|info| rect_from(info.rcMonitor))
            .unwrap_or_default()
    }

    /// Client area whose outer frame fills the monitor's work area.
    fn work_frame(&self) -> Rect {
        let Some(info) = self.monitor_info() else {
            return Rect::default();
        };
        let work = rect_from(info.rcWork);
        let Ok(border) = outer_rect(Rect::default(), self.styling.style()) else {
            return work;
        };
        Rect::new(
            work.origin.x - border.left,
            work.origin.y - border.top,
            work.size.width - (border.right - border.left),
            work.size.height - (border.bottom - border.top),
        )
    }

    fn size_limits(&self) -> (Size, Size) {
        with_capture(|c| (c.min_size, c.max_size))
    }

    fn set_size_limits(&mut self, min: Size, max: Size) -> Result<()> {
        with_capture(|c| {
            c.min_size = min;
            c.max_size = max;
        });
        // Re-place at the current frame so the new limits take effect.
        self.place(self.frame(), SWP_NOMOVE)
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        let title_wide = wide(title);
        // SAFETY: title_wide is a live, null-terminated UTF-16 string.
        unsafe { SetWindowTextW(self.hwnd, PCWSTR(title_wide.as_ptr())) }?;
        Ok(())
    }

    fn move_to(&mut self, position: PointI) -> Result<()> {
        let size = self.frame().size;
        self.place(Rect { origin: position, size }, SWP_NOSIZE)
    }

    fn resize_to(&mut self, size: Size) -> Result<()> {
        let origin = self.frame().origin;
        self.place(Rect { origin, size }, SWP_NOMOVE)
    }

    fn center_on_screen(&mut self) -> Result<()> {
        let target = self.screen_frame().centered(self.frame().size);
        self.place(target, SWP_NOSIZE)
    }

    fn set_fullscreen(&mut self, enabled: bool) -> Result<()> {
        let current = self.frame();
        let target = if enabled {
            self.screen_frame()
        } else {
            self.windowed_frame.unwrap_or(current)
        };
        self.restyle(self.styling.with_fullscreen(enabled), target)?;
        self.windowed_frame = enabled.then_some(current);
        Ok(())
    }

    fn set_resizable(&mut self, enabled: bool) -> Result<()> {
        self.restyle(self.styling.with_resizable(enabled), self.frame())
    }

    fn set_always_on_top(&mut self, enabled: bool) -> Result<()> {
        let after = if enabled { HWND_TOPMOST } else { HWND_NOTOPMOST };
        // SAFETY: hwnd is alive; HWND_TOPMOST/NOTOPMOST are documented sentinels.
        unsafe { SetWindowPos(self.hwnd, after, 0, 0, 0, 0, SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE) }?;
        Ok(())
    }

    fn set_borderless(&mut self, enabled: bool) -> Result<()> {
        self.restyle(self.styling.with_borderless(enabled), self.frame())
    }

    fn zoom(&mut self, frame: Rect) -> Result<()> {
        self.place(frame, SET_WINDOW_POS_FLAGS(0))
    }

    fn minimize(&mut self, minimized: bool) -> Result<()> {
        let cmd = if minimized { SW_MINIMIZE } else { SW_RESTORE };
        // SAFETY: hwnd is alive.  The return value is the previous visibility.
        unsafe {
            let _ = ShowWindow(self.hwnd, cmd);
        }
        Ok(())
    }

    fn is_minimized(&self) -> bool {
        // SAFETY: hwnd is alive.
        unsafe { IsIconic(self.hwnd) }.as_bool()
    }

    fn activate(&mut self) -> Result<()> {
        // SAFETY: hwnd is alive.
        if unsafe { SetForegroundWindow(self.hwnd) }.as_bool() {
            Ok(())
        } else {
            Err(last_error("SetForegroundWindow"))
        }
    }

    fn show(&mut self) -> Result<()> {
        // SAFETY: hwnd is alive.  The return value is the previous visibility.
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
        }
        Ok(())
    }

    fn convert_to_screen(&self, point: PointI) -> PointI {
        let mut pt = POINT { x: point.x, y: point.y };
        // SAFETY: hwnd is alive; pt is a valid in/out pointer.
        unsafe {
            let _ = ClientToScreen(self.hwnd, &mut pt);
        }
        PointI::new(pt.x, pt.y)
    }

    fn set_pointer_position(&mut self, screen_point: PointI) -> Result<()> {
        // SAFETY: no pointers involved.
        unsafe { SetCursorPos(screen_point.x, screen_point.y) }?;
        Ok(())
    }

    fn set_cursor(&mut self, cursor: NativeCursor) -> Result<()> {
        let id = match cursor {
            NativeCursor::SystemDefault => IDC_ARROW,
            NativeCursor::IBeam => IDC_IBEAM,
            NativeCursor::FollowLink | NativeCursor::Grab => IDC_HAND,
            NativeCursor::CrossHair => IDC_CROSS,
            NativeCursor::Progress => IDC_WAIT,
            NativeCursor::Grabbing | NativeCursor::Move => IDC_SIZEALL,
            NativeCursor::NotAllowed => IDC_NO,
            NativeCursor::ResizeNorthSouth => IDC_SIZENS,
            NativeCursor::ResizeEastWest => IDC_SIZEWE,
            NativeCursor::ResizeNorthEastSouthWest => IDC_SIZENESW,
            NativeCursor::ResizeNorthWestSouthEast => IDC_SIZENWSE,
            NativeCursor::Help => IDC_HELP,
        };
        // SAFETY: the IDC_* ids name built-in cursor resources.
        let handle = unsafe { LoadCursorW(None, id) }?;
        with_capture(|c| c.cursor = handle);
        // SAFETY: handle was just loaded and is a shared system cursor.
        unsafe {
            let _ = SetCursor(handle);
        }
        Ok(())
    }

    fn show_cursor(&mut self, visible: bool) {
        if visible == self.cursor_visible {
            return;
        }
        // SAFETY: ShowCursor adjusts a per-thread display counter; calling it
        // only on state changes keeps the counter balanced.
        unsafe {
            let _ = ShowCursor(BOOL::from(visible));
        }
        self.cursor_visible = visible;
    }

    fn alert(&mut self, title: &str, text: &str) {
        let text_wide = wide(text);
        let title_wide = wide(title);
        // SAFETY: both strings are live, null-terminated UTF-16 for the call.
        unsafe {
            let _ = MessageBoxW(
                self.hwnd,
                PCWSTR(text_wide.as_ptr()),
                PCWSTR(title_wide.as_ptr()),
                MB_OK | MB_ICONWARNING,
            );
        }
    }

    fn create_surface(&mut self) -> Result<Box<dyn RenderSurface + Send>> {
        Ok(Box::new(WglSurface::new(self.hwnd)))
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        // SAFETY: hwnd is owned by self and destroyed exactly once.
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

// ── Public helpers ────────────────────────────────────────────────────────────

/// Show a modal error dialog with the given message.
///
/// Used by `main()` when startup fails before a window exists.
pub fn show_error_dialog(message: &str) {
    let msg_wide = wide(message);
    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.  A null owner is
    // allowed for an application-modal dialog.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            w!("Tether - Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

// ── Window procedure ──────────────────────────────────────────────────────────

fn low_word(v: isize) -> i32 {
    i32::from((v & 0xFFFF) as u16 as i16)
}

fn high_word(v: isize) -> i32 {
    i32::from(((v >> 16) & 0xFFFF) as u16 as i16)
}

fn client_point(lparam: LPARAM) -> Point {
    Point::new(low_word(lparam.0) as f32, high_word(lparam.0) as f32)
}

/// Native button bits from the MK_* flags in a mouse message's WPARAM.
fn button_bits(wparam: WPARAM) -> i32 {
    let mk = wparam.0;
    let mut bits = 0;
    if mk & 0x0001 != 0 {
        bits |= native::PRIMARY_MOUSE_BUTTON;
    }
    if mk & 0x0002 != 0 {
        bits |= native::SECONDARY_MOUSE_BUTTON;
    }
    if mk & 0x0010 != 0 {
        bits |= native::TERTIARY_MOUSE_BUTTON;
    }
    bits as i32
}

fn modifier_state() -> u32 {
    // SAFETY: GetKeyState reads the calling thread's key state; no pointers.
    let state = |vk: u16| unsafe { GetKeyState(i32::from(vk)) };
    keys::modifier_bits(|vk| state(vk) < 0, |vk| state(vk) & 1 != 0)
}

fn message_time() -> i64 {
    // SAFETY: no parameters; reads the time of the message being processed.
    i64::from(unsafe { GetMessageTime() }) * 1000
}

fn pointer_message(kind: MessageKind, lparam: LPARAM, buttons: i32, clicks: i32) -> NativeMessage {
    let pos = client_point(lparam);
    with_capture(|c| c.last_where = pos);
    NativeMessage::new(kind)
        .with_point(field::WHERE, pos)
        .with_i32(field::BUTTONS, buttons)
        .with_i32(field::MODIFIERS, modifier_state() as i32)
        .with_i32(field::CLICKS, clicks)
        .with_i64(field::WHEN, message_time())
}

fn on_mouse_move(hwnd: HWND, lparam: LPARAM, wparam: WPARAM) {
    let entering = with_capture(|c| !std::mem::replace(&mut c.tracking_leave, true));
    if entering {
        let mut tme = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: hwnd,
            dwHoverTime: 0,
        };
        // SAFETY: tme is fully initialised for this window.
        if let Err(e) = unsafe { TrackMouseEvent(&mut tme) } {
            debug!(error = %e, "leave tracking unavailable");
        }
    }
    let state = if entering { transit::ENTERED } else { transit::INSIDE };
    enqueue(
        pointer_message(MessageKind::MouseMoved, lparam, button_bits(wparam), 0)
            .with_i32(field::TRANSIT, state),
    );
}

fn on_mouse_leave() {
    let last = with_capture(|c| {
        c.tracking_leave = false;
        c.last_where
    });
    enqueue(
        NativeMessage::new(MessageKind::MouseMoved)
            .with_point(field::WHERE, last)
            .with_i32(field::TRANSIT, transit::EXITED)
            .with_i64(field::WHEN, message_time()),
    );
}

fn on_wheel(wparam: WPARAM, horizontal: bool) {
    let delta = high_word(wparam.0 as isize) as f32 / WHEEL_DELTA;
    let name = if horizontal {
        field::WHEEL_DELTA_X
    } else {
        field::WHEEL_DELTA_Y
    };
    enqueue(NativeMessage::new(MessageKind::MouseWheelChanged).with_f32(name, delta));
}

fn on_key(wparam: WPARAM, lparam: LPARAM, down: bool) {
    let modifiers = modifier_state();
    let old = with_capture(|c| std::mem::replace(&mut c.modifiers, modifiers));
    if old != modifiers {
        enqueue(
            NativeMessage::new(MessageKind::ModifiersChanged)
                .with_i32(field::OLD_MODIFIERS, old as i32)
                .with_i32(field::MODIFIERS, modifiers as i32),
        );
    }

    let vk = (wparam.0 & 0xFFFF) as u16;
    // Shift, Ctrl, Alt, Win and Caps Lock only change modifiers.
    if matches!(vk, 0x10 | 0x11 | 0x12 | 0x14 | 0x5B | 0x5C) {
        return;
    }
    let extended = lparam.0 & (1 << 24) != 0;
    let Some((raw_char, key)) = keys::encode(vk, extended) else {
        trace!(vk, "unmapped virtual key");
        return;
    };

    let kind = if down { MessageKind::KeyDown } else { MessageKind::KeyUp };
    let mut msg = NativeMessage::new(kind)
        .with_i32(field::RAW_CHAR, raw_char)
        .with_i32(field::KEY, key)
        .with_i32(field::MODIFIERS, modifiers as i32)
        .with_i64(field::WHEN, message_time());
    if down && lparam.0 & (1 << 30) != 0 {
        msg = msg.with_i32(field::KEY_REPEAT, 1);
    }
    if let Some(text) = key_text(vk, lparam) {
        msg = msg.with_string(field::BYTES, text);
    }
    enqueue(msg);
}

/// Text a key produces under the current layout, without touching dead-key state.
fn key_text(vk: u16, lparam: LPARAM) -> Option<String> {
    let mut state = [0u8; 256];
    let mut buf = [0u16; 8];
    let scan = ((lparam.0 >> 16) & 0xFF) as u32;
    // SAFETY: state and buf are valid, correctly sized buffers.  Flag 0x4
    // leaves the keyboard state untouched (Windows 10 1607+).
    let n = unsafe {
        GetKeyboardState(&mut state).ok()?;
        ToUnicode(u32::from(vk), scan, Some(&state), &mut buf, 0x4)
    };
    if n <= 0 {
        return None;
    }
    let text = String::from_utf16_lossy(&buf[..n as usize]);
    text.chars().next().filter(|c| !c.is_control())?;
    Some(text)
}

fn on_drop(wparam: WPARAM) {
    let hdrop = HDROP(wparam.0 as *mut _);
    let mut msg = NativeMessage::new(MessageKind::SimpleData);
    // SAFETY: hdrop comes from WM_DROPFILES and is released exactly once
    // below.  Index 0xFFFFFFFF queries the file count.
    unsafe {
        let count = DragQueryFileW(hdrop, u32::MAX, None);
        for index in 0..count {
            let len = DragQueryFileW(hdrop, index, None) as usize;
            let mut buf = vec![0u16; len + 1];
            let copied = DragQueryFileW(hdrop, index, Some(&mut buf)) as usize;
            msg = msg.with_ref(field::REFS, String::from_utf16_lossy(&buf[..copied]));
        }
        DragFinish(hdrop);
    }
    enqueue(msg);
}

fn on_min_max(hwnd: HWND, lparam: LPARAM) {
    let (min, max) = with_capture(|c| (c.min_size, c.max_size));
    // SAFETY: hwnd is the window being sized; reading its style is harmless.
    let style = WINDOW_STYLE(unsafe { GetWindowLongPtrW(hwnd, GWL_STYLE) } as u32);
    // SAFETY: for WM_GETMINMAXINFO, lparam points at a MINMAXINFO owned by
    // the system for the duration of this message.
    let info = unsafe { &mut *(lparam.0 as *mut MINMAXINFO) };
    if !min.is_zero() {
        if let Ok(rc) = outer_rect(Rect::new(0, 0, min.width, min.height), style) {
            info.ptMinTrackSize = POINT { x: rc.right - rc.left, y: rc.bottom - rc.top };
        }
    }
    if !max.is_zero() {
        if let Ok(rc) = outer_rect(Rect::new(0, 0, max.width, max.height), style) {
            info.ptMaxTrackSize = POINT { x: rc.right - rc.left, y: rc.bottom - rc.top };
        }
    }
}

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        // ── Pointer ───────────────────────────────────────────────────────────
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => {
            enqueue(pointer_message(MessageKind::MouseDown, lparam, button_bits(wparam), 1));
            LRESULT(0)
        }
        WM_LBUTTONDBLCLK | WM_RBUTTONDBLCLK | WM_MBUTTONDBLCLK => {
            enqueue(pointer_message(MessageKind::MouseDown, lparam, button_bits(wparam), 2));
            LRESULT(0)
        }
        WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP => {
            enqueue(pointer_message(MessageKind::MouseUp, lparam, button_bits(wparam), 0));
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            on_mouse_move(hwnd, lparam, wparam);
            LRESULT(0)
        }
        WM_MOUSELEAVE => {
            on_mouse_leave();
            LRESULT(0)
        }
        WM_MOUSEWHEEL => {
            on_wheel(wparam, false);
            LRESULT(0)
        }
        WM_MOUSEHWHEEL => {
            on_wheel(wparam, true);
            LRESULT(0)
        }
        WM_SETCURSOR if low_word(lparam.0) as isize == HT_CLIENT => {
            let cursor = with_capture(|c| c.cursor);
            let _ = SetCursor(cursor);
            LRESULT(1)
        }

        // ── Keyboard ──────────────────────────────────────────────────────────
        WM_KEYDOWN | WM_KEYUP => {
            on_key(wparam, lparam, msg == WM_KEYDOWN);
            LRESULT(0)
        }
        WM_SYSKEYDOWN | WM_SYSKEYUP => {
            on_key(wparam, lparam, msg == WM_SYSKEYDOWN);
            // Keep Alt+F4 and the system menu working.
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        // ── Window ────────────────────────────────────────────────────────────
        WM_SIZE => {
            enqueue(
                NativeMessage::new(MessageKind::WindowResized)
                    .with_i32(field::WIDTH, low_word(lparam.0) & 0xFFFF)
                    .with_i32(field::HEIGHT, high_word(lparam.0) & 0xFFFF),
            );
            LRESULT(0)
        }
        WM_ACTIVATE => {
            enqueue(
                NativeMessage::new(MessageKind::WindowActivated)
                    .with_bool(field::ACTIVE, wparam.0 & 0xFFFF != 0),
            );
            LRESULT(0)
        }
        WM_GETMINMAXINFO => {
            on_min_max(hwnd, lparam);
            LRESULT(0)
        }
        WM_DROPFILES => {
            on_drop(wparam);
            LRESULT(0)
        }

        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CLOSE => {
            // The platform decides; the window is destroyed on finalize.
            enqueue(NativeMessage::new(MessageKind::QuitRequested));
            LRESULT(0)
        }
        WM_DESTROY => {
            // SAFETY: PostQuitMessage is always safe to call from WM_DESTROY.
            PostQuitMessage(0);
            LRESULT(0)
        }

        // SAFETY: hwnd and message parameters are valid; Windows provides them.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `TetherError`.
///
/// Call immediately after a Win32 function that signals failure. `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
pub(crate) fn last_error(function: &'static str) -> TetherError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    let code = unsafe { GetLastError() };
    TetherError::Native {
        function,
        code: code.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_popup(style: WINDOW_STYLE) -> bool {
        style.0 & WS_POPUP.0 != 0
    }

    #[test]
    fn refused_borderless_does_not_leak_into_next_restyle() {
        let installed = Styling::default().with_resizable(true);

        // A borderless restyle that fails never replaces `installed`.
        let refused = installed.with_borderless(true);
        assert!(is_popup(refused.style()));

        let next = installed.with_resizable(false);
        assert!(!is_popup(next.style()));
        assert_eq!(next.style().0 & WS_CAPTION.0, WS_CAPTION.0);
        assert_eq!(next.style().0 & WS_THICKFRAME.0, 0);
    }

    #[test]
    fn fullscreen_and_borderless_both_drop_the_frame() {
        let base = Styling::default();
        assert!(is_popup(base.with_fullscreen(true).style()));
        assert!(is_popup(base.with_borderless(true).style()));
        assert!(!is_popup(base.with_fullscreen(true).with_fullscreen(false).style()));
    }
}
