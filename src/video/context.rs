// ── Rendering context ─────────────────────────────────────────────────────────
//
// Binds the window's drawable surface to the graphics API.  The context is
// current on at most one thread; `make_current` and `release_current` are the
// only transitions, and every call checks the calling thread against the
// recorded owner.

use std::thread::{self, ThreadId};

use tracing::{debug, warn};

use crate::error::{Result, TetherError};
use crate::platform::RenderSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    /// Current on the given thread.
    Active(ThreadId),
    Released,
    Destroyed,
}

impl ContextState {
    fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active(_) => "active",
            Self::Released => "released",
            Self::Destroyed => "destroyed",
        }
    }
}

pub struct RenderContext {
    surface: Box<dyn RenderSurface + Send>,
    state: ContextState,
    use_vsync: bool,
}

impl RenderContext {
    pub fn new(surface: Box<dyn RenderSurface + Send>) -> Self {
        Self {
            surface,
            state: ContextState::Uninitialized,
            use_vsync: false,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Attach the surface to the window and make it current on this thread.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != ContextState::Uninitialized {
            return Err(self.invalid("initialize"));
        }
        self.surface
            .attach()
            .map_err(|e| TetherError::ContextCreation(e.to_string()))?;
        self.surface
            .lock()
            .map_err(|e| TetherError::ContextCreation(e.to_string()))?;
        self.state = ContextState::Active(thread::current().id());
        debug!("rendering context created and current");
        Ok(())
    }

    pub fn make_current(&mut self) -> Result<()> {
        let me = thread::current().id();
        match self.state {
            ContextState::Active(owner) if owner == me => Ok(()),
            ContextState::Active(_) => Err(TetherError::WrongThread),
            ContextState::Released => {
                self.surface.lock()?;
                self.state = ContextState::Active(me);
                debug!(thread = ?me, "context made current");
                Ok(())
            }
            _ => Err(self.invalid("make_current")),
        }
    }

    pub fn release_current(&mut self) -> Result<()> {
        let me = thread::current().id();
        match self.state {
            ContextState::Active(owner) if owner == me => {
                self.surface.unlock()?;
                self.state = ContextState::Released;
                debug!(thread = ?me, "context released");
                Ok(())
            }
            ContextState::Active(_) => Err(TetherError::WrongThread),
            ContextState::Released => Err(TetherError::ContextNotCurrent),
            _ => Err(self.invalid("release_current")),
        }
    }

    pub fn swap_buffers(&mut self) -> Result<()> {
        match self.state {
            ContextState::Active(owner) if owner == thread::current().id() => {
                self.surface.swap(self.use_vsync)
            }
            ContextState::Active(_) => Err(TetherError::WrongThread),
            _ => Err(TetherError::ContextNotCurrent),
        }
    }

    pub fn set_use_vsync(&mut self, use_vsync: bool) {
        self.use_vsync = use_vsync;
    }

    pub fn is_using_vsync(&self) -> bool {
        self.use_vsync
    }

    /// Release (if current here) and destroy the surface binding.
    pub fn destroy(&mut self) {
        match self.state {
            ContextState::Destroyed => return,
            ContextState::Active(owner) if owner == thread::current().id() => {
                if let Err(e) = self.surface.unlock() {
                    warn!(error = %e, "failed to release context before destroy");
                }
            }
            ContextState::Active(owner) => {
                warn!(owner = ?owner, "destroying a context current on another thread");
            }
            _ => {}
        }
        self.surface.destroy();
        self.state = ContextState::Destroyed;
        debug!("rendering context destroyed");
    }

    fn invalid(&self, operation: &'static str) -> TetherError {
        TetherError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        if self.state != ContextState::Destroyed && self.state != ContextState::Uninitialized {
            self.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessSurface, SurfaceCall};

    fn context() -> (RenderContext, crate::platform::headless::Journal<SurfaceCall>) {
        let surface = HeadlessSurface::new();
        let journal = surface.journal();
        (RenderContext::new(Box::new(surface)), journal)
    }

    #[test]
    fn initialize_attaches_and_locks() {
        let (mut ctx, journal) = context();
        ctx.initialize().unwrap();
        assert!(matches!(ctx.state(), ContextState::Active(_)));
        assert_eq!(journal.take(), vec![SurfaceCall::Attach, SurfaceCall::Lock]);
    }

    #[test]
    fn release_then_make_current_round_trip() {
        let (mut ctx, journal) = context();
        ctx.initialize().unwrap();
        journal.take();

        ctx.release_current().unwrap();
        assert_eq!(ctx.state(), ContextState::Released);
        assert!(matches!(ctx.swap_buffers(), Err(TetherError::ContextNotCurrent)));
        assert!(matches!(ctx.release_current(), Err(TetherError::ContextNotCurrent)));

        ctx.make_current().unwrap();
        ctx.set_use_vsync(true);
        ctx.swap_buffers().unwrap();
        assert_eq!(
            journal.take(),
            vec![SurfaceCall::Unlock, SurfaceCall::Lock, SurfaceCall::Swap { vsync: true }]
        );
    }

    #[test]
    fn other_threads_cannot_use_a_current_context() {
        let (mut ctx, _journal) = context();
        ctx.initialize().unwrap();
        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(matches!(ctx.swap_buffers(), Err(TetherError::WrongThread)));
                assert!(matches!(ctx.release_current(), Err(TetherError::WrongThread)));
                assert!(matches!(ctx.make_current(), Err(TetherError::WrongThread)));
            });
        });
    }

    #[test]
    fn handoff_to_render_thread() {
        let (mut ctx, _journal) = context();
        ctx.initialize().unwrap();
        ctx.release_current().unwrap();
        std::thread::scope(|s| {
            s.spawn(|| {
                ctx.make_current().unwrap();
                ctx.swap_buffers().unwrap();
                ctx.release_current().unwrap();
            });
        });
        ctx.make_current().unwrap();
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let (mut ctx, _journal) = context();
        ctx.initialize().unwrap();
        assert!(matches!(ctx.initialize(), Err(TetherError::InvalidState { .. })));
    }

    #[test]
    fn attach_failure_is_a_creation_error() {
        let mut surface = HeadlessSurface::new();
        surface.fail_attach();
        let mut ctx = RenderContext::new(Box::new(surface));
        assert!(matches!(ctx.initialize(), Err(TetherError::ContextCreation(_))));
        assert_eq!(ctx.state(), ContextState::Uninitialized);
    }

    #[test]
    fn destroy_releases_first() {
        let (mut ctx, journal) = context();
        ctx.initialize().unwrap();
        journal.take();
        ctx.destroy();
        assert_eq!(journal.take(), vec![SurfaceCall::Unlock, SurfaceCall::Destroy]);
        assert_eq!(ctx.state(), ContextState::Destroyed);
    }
}
