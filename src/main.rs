// ── Safety policy ────────────────────────────────────────────────────────────
// All FFI lives in the library's `platform::win32` module.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::Path;

use tracing::{error, info};

use tether::config::{self, Settings};
use tether::replay;

fn main() {
    let settings = config::load().unwrap_or_default();
    tether::logging::init(settings.debug_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.as_slice() {
        [cmd, path] if cmd == "replay" => run_replay(Path::new(path), &settings),
        [] => native::run(settings),
        _ => {
            eprintln!("usage: tether [replay <notifications.json>]");
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        error!(error = %e, "tether stopped");
        native::report_fatal(&e.to_string());
        std::process::exit(1);
    }
}

fn run_replay(path: &Path, settings: &Settings) -> tether::Result<()> {
    let stdout = std::io::stdout();
    let written = replay::replay_file(path, &settings.video, &mut stdout.lock())?;
    info!(written, "replay complete");
    Ok(())
}

#[cfg(windows)]
mod native {
    use std::time::Duration;

    use tracing::{info, trace, warn};

    use tether::collab::SystemLauncher;
    use tether::config::{self, Settings};
    use tether::host::{EventSink, HostLink, NullVisual};
    use tether::input::InputEvent;
    use tether::platform::win32::{self, Win32Toolkit};
    use tether::Platform;

    /// Input goes to the log until a host engine is attached.
    struct TraceSink;

    impl EventSink for TraceSink {
        fn push(&mut self, event: InputEvent) {
            trace!(?event, "input");
        }
    }

    pub(super) fn run(mut settings: Settings) -> tether::Result<()> {
        let mut platform = Platform::new(
            Win32Toolkit::new(),
            HostLink::new(Box::new(TraceSink)),
            Box::new(NullVisual::default()),
            settings.title.clone(),
        )
        .with_launcher(Box::new(SystemLauncher));
        platform.initialize(&settings.video, settings.video_driver, settings.audio_driver)?;
        if let Some(position) = settings.position {
            platform.set_window_position(position);
        }

        loop {
            if platform.iterate(win32::pump()) {
                break;
            }
            if platform.can_draw() {
                platform.swap_buffers()?;
            } else {
                std::thread::sleep(Duration::from_millis(16));
            }
        }

        let mode = platform.video_mode();
        if !mode.fullscreen && !mode.maximized {
            settings.position = Some(platform.get_window_position());
            settings.video.width = mode.width;
            settings.video.height = mode.height;
        }
        platform.finalize();

        if let Err(e) = config::save(&settings) {
            warn!(error = %e, "settings not saved");
        }
        info!("window closed");
        Ok(())
    }

    pub(super) fn report_fatal(message: &str) {
        win32::show_error_dialog(message);
    }
}

#[cfg(not(windows))]
mod native {
    use tether::config::Settings;
    use tether::TetherError;

    pub(super) fn run(_settings: Settings) -> tether::Result<()> {
        Err(TetherError::Unsupported("a native window"))
    }

    pub(super) fn report_fatal(message: &str) {
        eprintln!("tether: {message}");
    }
}
