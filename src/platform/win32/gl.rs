// ── WGL rendering surface ─────────────────────────────────────────────────────
//
// An OpenGL context on the window's device context.  `RenderContext` decides
// which thread may hold it; this type only performs the WGL calls.

#![allow(unsafe_code)]

use windows::{
    core::s,
    Win32::{
        Foundation::{BOOL, HWND},
        Graphics::{
            Gdi::{GetDC, ReleaseDC, HDC},
            OpenGL::{
                wglCreateContext, wglDeleteContext, wglGetProcAddress, wglMakeCurrent,
                ChoosePixelFormat, SetPixelFormat, SwapBuffers, HGLRC, PFD_DOUBLEBUFFER,
                PFD_DRAW_TO_WINDOW, PFD_MAIN_PLANE, PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA,
                PIXELFORMATDESCRIPTOR,
            },
        },
    },
};

use tracing::{debug, warn};

use crate::error::Result;
use crate::platform::RenderSurface;

use super::window::last_error;

type SwapIntervalFn = unsafe extern "system" fn(i32) -> BOOL;

pub(crate) struct WglSurface {
    hwnd: HWND,
    hdc: HDC,
    hglrc: HGLRC,
    swap_interval: Option<SwapIntervalFn>,
    interval: Option<bool>,
}

// SAFETY: a WGL context may be made current on any thread as long as it is
// current on at most one at a time.  `RenderContext` enforces that; the raw
// handles themselves carry no thread affinity.
unsafe impl Send for WglSurface {}

impl WglSurface {
    pub(crate) fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            hdc: HDC::default(),
            hglrc: HGLRC::default(),
            swap_interval: None,
            interval: None,
        }
    }
}

impl RenderSurface for WglSurface {
    fn attach(&mut self) -> Result<()> {
        // SAFETY: hwnd is the live window that owns this surface.
        let hdc = unsafe { GetDC(self.hwnd) };
        if hdc.is_invalid() {
            return Err(last_error("GetDC"));
        }
        self.hdc = hdc;

        let pfd = PIXELFORMATDESCRIPTOR {
            // PIXELFORMATDESCRIPTOR is 40 bytes; the casts are lossless.
            nSize: std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16,
            nVersion: 1,
            dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
            iPixelType: PFD_TYPE_RGBA,
            cColorBits: 32,
            cDepthBits: 24,
            cStencilBits: 8,
            iLayerType: PFD_MAIN_PLANE.0 as u8,
            ..Default::default()
        };

        // SAFETY: hdc was just obtained for this window; pfd is fully
        // initialised and outlives both calls.
        unsafe {
            let format = ChoosePixelFormat(self.hdc, &pfd);
            if format == 0 {
                return Err(last_error("ChoosePixelFormat"));
            }
            SetPixelFormat(self.hdc, format, &pfd)?;
            self.hglrc = wglCreateContext(self.hdc)?;
        }
        debug!("WGL context created");
        Ok(())
    }

    fn lock(&mut self) -> Result<()> {
        // SAFETY: hdc and hglrc were created in `attach` and are still alive.
        unsafe { wglMakeCurrent(self.hdc, self.hglrc)? };

        if self.swap_interval.is_none() {
            // SAFETY: a context is current, which wglGetProcAddress requires.
            // The extension's documented signature is BOOL(int).
            self.swap_interval = unsafe {
                wglGetProcAddress(s!("wglSwapIntervalEXT"))
                    .map(|f| std::mem::transmute::<_, SwapIntervalFn>(f))
            };
            if self.swap_interval.is_none() {
                debug!("wglSwapIntervalEXT unavailable, vsync follows the driver");
            }
        }
        Ok(())
    }

    fn unlock(&mut self) -> Result<()> {
        // SAFETY: clearing the current context is valid on any thread.
        unsafe { wglMakeCurrent(HDC::default(), HGLRC::default())? };
        Ok(())
    }

    fn swap(&mut self, vsync: bool) -> Result<()> {
        if self.interval != Some(vsync) {
            if let Some(set_interval) = self.swap_interval {
                // SAFETY: the context is current on this thread (checked by
                // RenderContext) and the pointer came from wglGetProcAddress.
                unsafe { set_interval(i32::from(vsync)) };
            }
            self.interval = Some(vsync);
        }
        // SAFETY: hdc belongs to this window and has a pixel format set.
        unsafe { SwapBuffers(self.hdc)? };
        Ok(())
    }

    fn destroy(&mut self) {
        // SAFETY: the handles were created in `attach`; each is released
        // exactly once and then reset to null.
        unsafe {
            if !self.hglrc.is_invalid() {
                if let Err(e) = wglDeleteContext(self.hglrc) {
                    warn!(error = %e, "wglDeleteContext failed");
                }
                self.hglrc = HGLRC::default();
            }
            if !self.hdc.is_invalid() {
                ReleaseDC(self.hwnd, self.hdc);
                self.hdc = HDC::default();
            }
        }
    }
}
