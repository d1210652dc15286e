// ── External collaborators ────────────────────────────────────────────────────
//
// Thin OS services the window core talks to but does not own: volume roots,
// clipboard, trash, threads, the MIDI roster and the desktop's URI handler.
// Only the interfaces matter to the core; `StdThreads`, `StdRoots` and
// `SystemLauncher` are the stock implementations.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, warn};

use crate::error::{Result, TetherError};

// ── Interfaces ────────────────────────────────────────────────────────────────

/// Mounted volume roots and their filesystem types.
pub trait RootLister {
    /// Sorted, duplicate-free list of roots.
    fn list_available_roots(&self) -> Vec<PathBuf>;
    fn filesystem_type(&self, path: &Path) -> Option<String>;
}

/// Text clipboard.  Both calls fail when the clipboard cannot be locked.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
    fn get_text(&mut self) -> Result<String>;
}

pub trait Trash {
    fn move_to_trash(&self, path: &Path) -> Result<()>;
}

/// Hands a URI or path to the desktop's default handler.
pub trait Launcher {
    fn shell_open(&self, uri: &str) -> Result<()>;
}

/// MIDI input roster.
pub trait MidiRoster {
    fn open(&mut self) -> Result<()>;
    fn close(&mut self);
    fn connected_input_names(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Worker-thread wrapper.
pub trait ThreadSpawner {
    type Handle;

    fn spawn(
        &self,
        callback: Box<dyn FnOnce() + Send + 'static>,
        priority: ThreadPriority,
    ) -> Result<Self::Handle>;
    fn join(&self, handle: Self::Handle);
    fn current_id(&self) -> ThreadId;
    /// Rename the calling thread.
    fn set_name(&self, name: &str) -> Result<()>;
}

// ── std threads ───────────────────────────────────────────────────────────────

/// Threads from `std::thread`.  Priorities are advisory only.
#[derive(Debug, Clone, Default)]
pub struct StdThreads {
    name: Option<String>,
}

impl StdThreads {
    /// Name given to every thread spawned through this wrapper.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl ThreadSpawner for StdThreads {
    type Handle = JoinHandle<()>;

    fn spawn(
        &self,
        callback: Box<dyn FnOnce() + Send + 'static>,
        priority: ThreadPriority,
    ) -> Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if priority != ThreadPriority::Normal {
            debug!(?priority, "thread priority is advisory on this platform");
        }
        Ok(builder.spawn(callback)?)
    }

    fn join(&self, handle: JoinHandle<()>) {
        if handle.join().is_err() {
            warn!("worker thread panicked");
        }
    }

    fn current_id(&self) -> ThreadId {
        thread::current().id()
    }

    fn set_name(&self, _name: &str) -> Result<()> {
        // std only names threads at spawn time.
        Err(TetherError::Unsupported("renaming a running thread"))
    }
}

// ── System launcher ───────────────────────────────────────────────────────────

/// Opens URIs with whatever the desktop associates with them.
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn shell_open(&self, uri: &str) -> Result<()> {
        debug!(uri, "opening with the desktop handler");
        open::that_detached(uri)?;
        Ok(())
    }
}

// ── std roots ─────────────────────────────────────────────────────────────────

/// Volume roots from the OS mount table plus the home directory.
#[derive(Debug, Clone, Default)]
pub struct StdRoots;

impl RootLister for StdRoots {
    fn list_available_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = mounts().into_iter().map(|m| m.point).collect();
        if let Some(home) = dirs::home_dir() {
            roots.push(home);
        }
        roots.sort();
        roots.dedup();
        roots
    }

    fn filesystem_type(&self, path: &Path) -> Option<String> {
        mounts()
            .into_iter()
            .filter(|m| path.starts_with(&m.point))
            .max_by_key(|m| m.point.components().count())
            .map(|m| m.fs_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Mount {
    point: PathBuf,
    fs_type: String,
}

#[cfg(target_os = "linux")]
fn mounts() -> Vec<Mount> {
    match std::fs::read_to_string("/proc/mounts") {
        Ok(table) => parse_mounts(&table),
        Err(e) => {
            debug!(error = %e, "mount table unavailable");
            vec![Mount {
                point: PathBuf::from("/"),
                fs_type: String::new(),
            }]
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn mounts() -> Vec<Mount> {
    #[cfg(windows)]
    let candidates: Vec<PathBuf> = (b'A'..=b'Z')
        .map(|d| PathBuf::from(format!("{}:\\", d as char)))
        .filter(|p| p.exists())
        .collect();
    #[cfg(not(windows))]
    let candidates = vec![PathBuf::from("/")];

    candidates
        .into_iter()
        .map(|point| Mount {
            point,
            fs_type: String::new(),
        })
        .collect()
}

/// Keep real block-device mounts (and `/`) from a `/proc/mounts` table.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_mounts(table: &str) -> Vec<Mount> {
    table
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let source = cols.next()?;
            let point = cols.next()?;
            let fs_type = cols.next()?;
            (source.starts_with("/dev/") || point == "/").then(|| Mount {
                point: PathBuf::from(point.replace("\\040", " ")),
                fs_type: fs_type.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn spawned_callback_runs_and_joins() {
        let threads = StdThreads::named("tether-test");
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handle = threads
            .spawn(
                Box::new(move || {
                    assert_eq!(thread::current().name(), Some("tether-test"));
                    h.fetch_add(1, Ordering::SeqCst);
                }),
                ThreadPriority::High,
            )
            .unwrap();
        threads.join(handle);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn current_id_matches_std() {
        assert_eq!(StdThreads::default().current_id(), thread::current().id());
    }

    #[test]
    fn renaming_running_thread_is_unsupported() {
        assert!(matches!(
            StdThreads::default().set_name("x"),
            Err(TetherError::Unsupported(_))
        ));
    }

    #[test]
    fn mount_table_keeps_devices_and_root() {
        let table = "\
rootfs / rootfs rw 0 0
/dev/sda1 /boot ext4 rw 0 0
proc /proc proc rw 0 0
/dev/sdb1 /media/usb\\040stick vfat rw 0 0
";
        let mounts = parse_mounts(table);
        assert_eq!(
            mounts,
            vec![
                Mount { point: PathBuf::from("/"), fs_type: "rootfs".into() },
                Mount { point: PathBuf::from("/boot"), fs_type: "ext4".into() },
                Mount { point: PathBuf::from("/media/usb stick"), fs_type: "vfat".into() },
            ]
        );
    }

    #[test]
    fn roots_are_sorted_and_unique() {
        let roots = StdRoots.list_available_roots();
        let mut sorted = roots.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(roots, sorted);
    }
}
