// ── Platform session ──────────────────────────────────────────────────────────
//
// A single `Platform` is created on startup and owns the native window, the
// window session, the rendering context and the input dispatcher for the
// lifetime of the process.  Every mutation goes through `&mut self`; there is
// no global state.  Render-side readers that cannot borrow the platform use
// the `PointerWatch` it hands out.

use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::collab::{Clipboard, Launcher, MidiRoster};
use crate::cursor::{CursorShape, MouseMode};
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::{Result, TetherError};
use crate::geometry::{PointI, Rect, Size};
use crate::host::{HostLink, LifecycleListener, VisualSubsystem};
use crate::input::{ButtonMask, PointerWatch};
use crate::message::NativeMessage;
use crate::platform::{NativeWindow, Toolkit};
use crate::video::session::{max_size_allowed, min_size_allowed};
use crate::video::{RenderContext, VideoMode, WindowSession};

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    Uninitialized,
    Initialized,
    /// At least one batch of notifications has been dispatched.
    Running,
    Finalized,
}

impl PlatformState {
    fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Finalized => "finalized",
        }
    }
}

/// Battery status.  Always `Unknown` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Unknown,
    OnBattery,
    NoBattery,
    Charging,
    Charged,
}

// ── Window chrome ─────────────────────────────────────────────────────────────

/// Boolean window attributes that map onto exactly one native setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowFlag {
    Fullscreen,
    Resizable,
    AlwaysOnTop,
    Borderless,
}

impl WindowFlag {
    fn slot(self, mode: &mut VideoMode) -> &mut bool {
        match self {
            Self::Fullscreen => &mut mode.fullscreen,
            Self::Resizable => &mut mode.resizable,
            Self::AlwaysOnTop => &mut mode.always_on_top,
            Self::Borderless => &mut mode.borderless,
        }
    }

    fn get(self, mut mode: VideoMode) -> bool {
        *self.slot(&mut mode)
    }

    fn apply<W: NativeWindow>(self, window: &mut W, enabled: bool) -> Result<()> {
        match self {
            Self::Fullscreen => window.set_fullscreen(enabled),
            Self::Resizable => window.set_resizable(enabled),
            Self::AlwaysOnTop => window.set_always_on_top(enabled),
            Self::Borderless => window.set_borderless(enabled),
        }
    }
}

/// The native window paired with its logical session.  Logical state only
/// changes after the native call succeeded.
struct Chrome<W> {
    window: W,
    session: WindowSession,
}

impl<W: NativeWindow> Chrome<W> {
    fn toggle(&mut self, flag: WindowFlag, enabled: bool) {
        if flag.get(self.session.mode) == enabled {
            trace!(?flag, enabled, "window flag unchanged");
            return;
        }
        match flag.apply(&mut self.window, enabled) {
            Ok(()) => {
                *flag.slot(&mut self.session.mode) = enabled;
                debug!(?flag, enabled, "window flag changed");
            }
            Err(e) => warn!(?flag, enabled, error = %e, "window flag change refused"),
        }
    }

    fn set_maximized(&mut self, enabled: bool) {
        if self.session.mode.maximized == enabled {
            return;
        }
        if enabled {
            let restore = self.window.frame();
            let target = self.window.work_frame();
            match self.window.zoom(target) {
                Ok(()) => {
                    self.session.restore_frame = Some(restore);
                    self.adopt_frame(target);
                    self.session.mode.maximized = true;
                    debug!(?restore, "window maximized");
                }
                Err(e) => warn!(error = %e, "maximize refused"),
            }
        } else {
            let Some(restore) = self.session.restore_frame else {
                warn!("no frame recorded before maximize, keeping current geometry");
                self.session.mode.maximized = false;
                return;
            };
            match self.window.zoom(restore) {
                Ok(()) => {
                    self.session.restore_frame = None;
                    self.adopt_frame(restore);
                    self.session.mode.maximized = false;
                    debug!(?restore, "window restored");
                }
                Err(e) => warn!(error = %e, "restore from maximize refused"),
            }
        }
    }

    fn set_minimized(&mut self, enabled: bool) {
        if self.window.is_minimized() == enabled {
            return;
        }
        match self.window.minimize(enabled) {
            Ok(()) => {
                self.session.mode.minimized = enabled;
                debug!(enabled, "window minimized state changed");
            }
            Err(e) => warn!(enabled, error = %e, "minimize refused"),
        }
    }

    fn adopt_frame(&mut self, frame: Rect) {
        self.session.position = frame.origin;
        self.session.resized(frame.size.width, frame.size.height);
    }

    /// Bring a baseline window to the desired flags through the runtime setters.
    fn apply_desired(&mut self, desired: &VideoMode) {
        if desired.resizable {
            self.toggle(WindowFlag::Resizable, true);
        }
        if desired.always_on_top {
            self.toggle(WindowFlag::AlwaysOnTop, true);
        }

        let exclusive = [desired.maximized, desired.fullscreen, desired.borderless];
        if exclusive.iter().filter(|f| **f).count() > 1 {
            warn!("maximized, fullscreen and borderless are exclusive; applying only the first");
        }
        if desired.maximized {
            self.set_maximized(true);
        } else if desired.fullscreen {
            self.toggle(WindowFlag::Fullscreen, true);
        } else if desired.borderless {
            self.toggle(WindowFlag::Borderless, true);
        }
    }
}

/// Everything that exists only between `initialize` and `finalize`.
struct Live<W> {
    chrome: Chrome<W>,
    context: RenderContext,
}

// ── Platform ──────────────────────────────────────────────────────────────────

/// Top-level platform state.
pub struct Platform<T: Toolkit> {
    toolkit: T,
    host: HostLink,
    visual: Box<dyn VisualSubsystem + Send>,
    title: String,
    state: PlatformState,
    live: Option<Live<T::Window>>,
    dispatcher: Option<Dispatcher>,
    watch: Arc<PointerWatch>,
    cursor_shape: CursorShape,
    mouse_mode: MouseMode,
    video_driver: usize,
    audio_driver: usize,
    clipboard: Option<Box<dyn Clipboard + Send>>,
    midi: Option<Box<dyn MidiRoster + Send>>,
    launcher: Option<Box<dyn Launcher + Send>>,
}

impl<T: Toolkit> Platform<T> {
    pub fn new(
        toolkit: T,
        host: HostLink,
        visual: Box<dyn VisualSubsystem + Send>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            toolkit,
            host,
            visual,
            title: title.into(),
            state: PlatformState::Uninitialized,
            live: None,
            dispatcher: None,
            watch: Arc::new(PointerWatch::default()),
            cursor_shape: CursorShape::Arrow,
            mouse_mode: MouseMode::Visible,
            video_driver: 0,
            audio_driver: 0,
            clipboard: None,
            midi: None,
            launcher: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard + Send>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn with_midi(mut self, midi: Box<dyn MidiRoster + Send>) -> Self {
        self.midi = Some(midi);
        self
    }

    pub fn with_launcher(mut self, launcher: Box<dyn Launcher + Send>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn state(&self) -> PlatformState {
        self.state
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn window(&self) -> Option<&T::Window> {
        self.live.as_ref().map(|l| &l.chrome.window)
    }

    pub fn window_mut(&mut self) -> Option<&mut T::Window> {
        self.live.as_mut().map(|l| &mut l.chrome.window)
    }

    pub fn session(&self) -> Option<&WindowSession> {
        self.live.as_ref().map(|l| &l.chrome.session)
    }

    // ── Startup / shutdown ────────────────────────────────────────────────────

    /// Create the window and rendering context and bring up the visual
    /// subsystem.  On error nothing is left running and the platform stays
    /// uninitialized.
    pub fn initialize(
        &mut self,
        desired: &VideoMode,
        video_driver: usize,
        audio_driver: usize,
    ) -> Result<()> {
        if self.state != PlatformState::Uninitialized {
            return Err(TetherError::InvalidState {
                operation: "initialize",
                state: self.state.name(),
            });
        }
        info!(
            width = desired.width,
            height = desired.height,
            video_driver,
            audio_driver,
            "initializing platform"
        );

        let mut window = self.toolkit.create_window(&self.title, desired.size())?;
        if let Err(e) = window.center_on_screen() {
            warn!(error = %e, "could not center window");
        }
        let (min_size, max_size) = window.size_limits();
        let session = WindowSession::new(desired, window.frame(), min_size, max_size);
        let mut chrome = Chrome { window, session };
        chrome.apply_desired(desired);

        let mut context = match create_context(&mut chrome.window) {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "rendering context creation failed");
                chrome.window.alert("Unable to initialize video driver", &e.to_string());
                return Err(e);
            }
        };
        if !self.visual.is_viable() {
            let e = TetherError::ContextCreation("renderer cannot run on this context".into());
            error!(error = %e, "renderer rejected the context");
            chrome.window.alert("Unable to initialize video driver", &e.to_string());
            context.destroy();
            return Err(e);
        }
        self.visual.activate();
        context.set_use_vsync(desired.use_vsync);

        self.dispatcher = Some(Dispatcher::with_watch(Arc::clone(&self.watch)));
        if let Err(e) = self.visual.init() {
            let e = match e {
                TetherError::VisualInit(_) => e,
                other => TetherError::VisualInit(other.to_string()),
            };
            error!(error = %e, "visual subsystem failed to start");
            self.dispatcher = None;
            context.destroy();
            return Err(e);
        }

        if let Err(e) = chrome.window.show() {
            warn!(error = %e, "window could not be shown");
        }

        self.video_driver = video_driver;
        self.audio_driver = audio_driver;
        self.live = Some(Live { chrome, context });
        self.state = PlatformState::Initialized;
        info!("platform initialized");
        Ok(())
    }

    /// Tear down in reverse order of creation: render-side consumers, visual
    /// subsystem, input, then the rendering context.
    pub fn finalize(&mut self) {
        if matches!(
            self.state,
            PlatformState::Uninitialized | PlatformState::Finalized
        ) {
            return;
        }
        info!("finalizing platform");

        if let Some(midi) = self.midi.as_mut() {
            midi.close();
        }
        self.host.listener = None;

        self.visual.finish();
        self.dispatcher = None;

        if let Some(mut live) = self.live.take() {
            live.context.destroy();
        }
        self.state = PlatformState::Finalized;
    }

    // ── Message loop ──────────────────────────────────────────────────────────

    /// Route one native notification.
    pub fn dispatch(&mut self, msg: &NativeMessage) -> Dispatch {
        match (self.live.as_mut(), self.dispatcher.as_mut()) {
            (Some(live), Some(dispatcher)) => {
                dispatcher.dispatch(msg, &mut live.chrome.session, &mut self.host)
            }
            _ => {
                trace!(what = ?msg.what, "no window bound, notification left to the toolkit");
                Dispatch::Default
            }
        }
    }

    /// Dispatch a batch in delivery order.  Returns `true` if a quit request
    /// was accepted.
    pub fn iterate<I>(&mut self, messages: I) -> bool
    where
        I: IntoIterator<Item = NativeMessage>,
    {
        if self.state == PlatformState::Initialized {
            self.state = PlatformState::Running;
        }
        let mut quit = false;
        for msg in messages {
            quit |= self.dispatch(&msg) == Dispatch::QuitAccepted;
        }
        quit
    }

    pub fn set_listener(&mut self, listener: Box<dyn LifecycleListener + Send>) {
        self.host.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.host.listener = None;
    }

    // ── Rendering context ─────────────────────────────────────────────────────

    pub fn make_rendering_thread(&mut self) -> Result<()> {
        self.context_mut("make_rendering_thread")?.make_current()
    }

    pub fn release_rendering_thread(&mut self) -> Result<()> {
        self.context_mut("release_rendering_thread")?.release_current()
    }

    pub fn swap_buffers(&mut self) -> Result<()> {
        self.context_mut("swap_buffers")?.swap_buffers()
    }

    pub fn set_use_vsync(&mut self, enabled: bool) {
        if let Some(live) = self.live.as_mut() {
            live.context.set_use_vsync(enabled);
            live.chrome.session.mode.use_vsync = enabled;
        }
    }

    pub fn is_vsync_enabled(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.context.is_using_vsync())
    }

    fn context_mut(&mut self, operation: &'static str) -> Result<&mut RenderContext> {
        let state = self.state.name();
        self.live
            .as_mut()
            .map(|l| &mut l.context)
            .ok_or(TetherError::InvalidState { operation, state })
    }

    // ── Window flags ──────────────────────────────────────────────────────────

    pub fn set_window_fullscreen(&mut self, enabled: bool) {
        self.toggle(WindowFlag::Fullscreen, enabled);
    }

    pub fn is_window_fullscreen(&self) -> bool {
        self.mode().fullscreen
    }

    pub fn set_window_resizable(&mut self, enabled: bool) {
        self.toggle(WindowFlag::Resizable, enabled);
    }

    pub fn is_window_resizable(&self) -> bool {
        self.mode().resizable
    }

    pub fn set_window_always_on_top(&mut self, enabled: bool) {
        self.toggle(WindowFlag::AlwaysOnTop, enabled);
    }

    pub fn is_window_always_on_top(&self) -> bool {
        self.mode().always_on_top
    }

    pub fn set_borderless_window(&mut self, enabled: bool) {
        self.toggle(WindowFlag::Borderless, enabled);
    }

    pub fn get_borderless_window(&self) -> bool {
        self.mode().borderless
    }

    pub fn set_window_maximized(&mut self, enabled: bool) {
        if let Some(chrome) = self.chrome_mut("set_window_maximized") {
            chrome.set_maximized(enabled);
        }
    }

    pub fn is_window_maximized(&self) -> bool {
        self.mode().maximized
    }

    pub fn set_window_minimized(&mut self, enabled: bool) {
        if let Some(chrome) = self.chrome_mut("set_window_minimized") {
            chrome.set_minimized(enabled);
        }
    }

    pub fn is_window_minimized(&self) -> bool {
        self.window().is_some_and(|w| w.is_minimized())
    }

    /// The current logical video mode, or the defaults before initialization.
    pub fn video_mode(&self) -> VideoMode {
        self.mode()
    }

    fn mode(&self) -> VideoMode {
        self.session()
            .map(|s| *s.mode())
            .unwrap_or_else(|| VideoMode::default().baseline())
    }

    fn toggle(&mut self, flag: WindowFlag, enabled: bool) {
        if let Some(chrome) = self.chrome_mut("window flag") {
            chrome.toggle(flag, enabled);
        }
    }

    fn chrome_mut(&mut self, operation: &'static str) -> Option<&mut Chrome<T::Window>> {
        let chrome = self.live.as_mut().map(|l| &mut l.chrome);
        if chrome.is_none() {
            debug!(operation, "no window yet, ignored");
        }
        chrome
    }

    // ── Window geometry and title ─────────────────────────────────────────────

    pub fn set_window_title(&mut self, title: &str) {
        if let Some(chrome) = self.chrome_mut("set_window_title") {
            if let Err(e) = chrome.window.set_title(title) {
                warn!(error = %e, "title change refused");
                return;
            }
        }
        self.title = title.to_owned();
    }

    pub fn window_title(&self) -> &str {
        &self.title
    }

    pub fn set_window_position(&mut self, position: PointI) {
        if let Some(chrome) = self.chrome_mut("set_window_position") {
            match chrome.window.move_to(position) {
                Ok(()) => chrome.session.position = position,
                Err(e) => warn!(error = %e, "move refused"),
            }
        }
    }

    pub fn get_window_position(&self) -> PointI {
        self.window().map(|w| w.frame().origin).unwrap_or_default()
    }

    pub fn set_window_size(&mut self, size: Size) {
        if let Some(chrome) = self.chrome_mut("set_window_size") {
            match chrome.window.resize_to(size) {
                Ok(()) => chrome.session.resized(size.width, size.height),
                Err(e) => warn!(error = %e, "resize refused"),
            }
        }
    }

    pub fn get_window_size(&self) -> Size {
        self.mode().size()
    }

    /// `Size::ZERO` removes the limit.
    pub fn set_min_window_size(&mut self, size: Size) {
        let Some(chrome) = self.chrome_mut("set_min_window_size") else {
            return;
        };
        let max = chrome.session.max_size;
        if !min_size_allowed(size, max) {
            error!(?size, ?max, "minimum window size can't be larger than maximum window size");
            return;
        }
        match chrome.window.set_size_limits(size, max) {
            Ok(()) => chrome.session.min_size = size,
            Err(e) => warn!(error = %e, "size limits refused"),
        }
    }

    pub fn get_min_window_size(&self) -> Size {
        self.session().map(|s| s.min_size()).unwrap_or_default()
    }

    /// `Size::ZERO` removes the limit.
    pub fn set_max_window_size(&mut self, size: Size) {
        let Some(chrome) = self.chrome_mut("set_max_window_size") else {
            return;
        };
        let min = chrome.session.min_size;
        if !max_size_allowed(min, size) {
            error!(?size, ?min, "maximum window size can't be smaller than minimum window size");
            return;
        }
        match chrome.window.set_size_limits(min, size) {
            Ok(()) => chrome.session.max_size = size,
            Err(e) => warn!(error = %e, "size limits refused"),
        }
    }

    pub fn get_max_window_size(&self) -> Size {
        self.session().map(|s| s.max_size()).unwrap_or_default()
    }

    pub fn is_window_focused(&self) -> bool {
        self.session().is_some_and(|s| s.is_focused())
    }

    pub fn move_window_to_foreground(&mut self) {
        if let Some(chrome) = self.chrome_mut("move_window_to_foreground") {
            if let Err(e) = chrome.window.activate() {
                warn!(error = %e, "activation refused");
            }
        }
    }

    /// Drawing is pointless while the window is minimized.
    pub fn can_draw(&self) -> bool {
        !self.is_window_minimized()
    }

    // ── Screens ───────────────────────────────────────────────────────────────

    pub fn get_screen_count(&self) -> usize {
        1
    }

    pub fn get_current_screen(&self) -> usize {
        0
    }

    pub fn get_screen_position(&self, screen: usize) -> PointI {
        self.screen_frame(screen).origin
    }

    pub fn get_screen_size(&self, screen: usize) -> Size {
        self.screen_frame(screen).size
    }

    fn screen_frame(&self, screen: usize) -> Rect {
        if screen > 0 {
            warn!(screen, "only one screen is supported, reporting screen 0");
        }
        self.window().map(|w| w.screen_frame()).unwrap_or_default()
    }

    // ── Cursor and pointer ────────────────────────────────────────────────────

    pub fn set_cursor_shape(&mut self, shape: CursorShape) {
        if shape == self.cursor_shape {
            return;
        }
        if let Some(chrome) = self.chrome_mut("set_cursor_shape") {
            if let Err(e) = chrome.window.set_cursor(shape.native()) {
                warn!(?shape, error = %e, "cursor change refused");
                return;
            }
        }
        self.cursor_shape = shape;
    }

    pub fn get_cursor_shape(&self) -> CursorShape {
        self.cursor_shape
    }

    /// Custom cursor images are not available; the current cursor stays.
    pub fn set_custom_mouse_cursor(&mut self, shape: CursorShape) -> Result<()> {
        error!(?shape, "custom cursor images are not supported");
        Err(TetherError::Unsupported("custom cursor images"))
    }

    pub fn set_mouse_mode(&mut self, mode: MouseMode) {
        if mode == self.mouse_mode {
            return;
        }
        if let Some(chrome) = self.chrome_mut("set_mouse_mode") {
            chrome.window.show_cursor(mode.shows_cursor());
            chrome.session.cursor_grabbed = mode.grabs_cursor();
        }
        debug!(?mode, "mouse mode changed");
        self.mouse_mode = mode;
    }

    pub fn get_mouse_mode(&self) -> MouseMode {
        self.mouse_mode
    }

    /// Move the pointer to a window-relative position.  A captured pointer
    /// only has its tracked position replaced.
    pub fn warp_mouse_position(&mut self, position: PointI) {
        if self.mouse_mode == MouseMode::Captured {
            match self.dispatcher.as_mut() {
                Some(dispatcher) => dispatcher.set_last_position(position),
                None => debug!("no dispatcher bound, warp ignored"),
            }
            return;
        }
        if let Some(chrome) = self.chrome_mut("warp_mouse_position") {
            let screen = chrome.window.convert_to_screen(position);
            if let Err(e) = chrome.window.set_pointer_position(screen) {
                warn!(error = %e, "pointer warp refused");
            }
        }
    }

    pub fn get_mouse_position(&self) -> PointI {
        self.watch.position()
    }

    pub fn get_mouse_button_state(&self) -> ButtonMask {
        self.watch.button_mask()
    }

    /// Lock-free pointer view for the render thread.
    pub fn pointer_watch(&self) -> Arc<PointerWatch> {
        Arc::clone(&self.watch)
    }

    // ── Misc OS services ──────────────────────────────────────────────────────

    pub fn alert(&mut self, text: &str, title: &str) {
        match self.live.as_mut() {
            Some(live) => live.chrome.window.alert(title, text),
            None => error!(title, text, "alert"),
        }
    }

    pub fn get_power_state(&self) -> PowerState {
        warn!("power state reporting is not implemented");
        PowerState::Unknown
    }

    pub fn get_power_seconds_left(&self) -> i32 {
        warn!("power state reporting is not implemented");
        -1
    }

    pub fn get_power_percent_left(&self) -> i32 {
        warn!("power state reporting is not implemented");
        -1
    }

    pub fn video_driver(&self) -> usize {
        self.video_driver
    }

    pub fn audio_driver(&self) -> usize {
        self.audio_driver
    }

    /// Open `uri` with the desktop's default handler.
    pub fn shell_open(&self, uri: &str) -> Result<()> {
        let launcher = self.launcher.as_ref().ok_or_else(|| {
            warn!(uri, "no launcher attached");
            TetherError::Unsupported("opening a uri")
        })?;
        launcher.shell_open(uri)
    }

    pub fn set_clipboard(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .as_mut()
            .ok_or(TetherError::Unsupported("clipboard"))?
            .set_text(text)
    }

    pub fn get_clipboard(&mut self) -> Result<String> {
        self.clipboard
            .as_mut()
            .ok_or(TetherError::Unsupported("clipboard"))?
            .get_text()
    }

    pub fn open_midi_inputs(&mut self) -> Result<()> {
        self.midi
            .as_mut()
            .ok_or(TetherError::Unsupported("MIDI input"))?
            .open()
    }

    pub fn close_midi_inputs(&mut self) {
        if let Some(midi) = self.midi.as_mut() {
            midi.close();
        }
    }

    pub fn get_connected_midi_inputs(&self) -> Vec<String> {
        self.midi
            .as_ref()
            .map(|m| m.connected_input_names())
            .unwrap_or_default()
    }
}

impl<T: Toolkit> Drop for Platform<T> {
    fn drop(&mut self) {
        self.finalize();
    }
}

fn create_context<W: NativeWindow>(window: &mut W) -> Result<RenderContext> {
    let surface = window
        .create_surface()
        .map_err(|e| TetherError::ContextCreation(e.to_string()))?;
    let mut context = RenderContext::new(surface);
    context.initialize()?;
    Ok(context)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
