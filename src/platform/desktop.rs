//! Desktop setup: EGL on a host window
//!
//! The host window handle doubles as the EGL native window. The native
//! display comes from the window system (a device context under ANGLE,
//! EGL_DEFAULT_DISPLAY elsewhere).

use khronos_egl as egl;
use log::info;

use super::{Capabilities, Platform};
use crate::config::DisplaySettings;
use crate::constants::EGL_POST_SUB_BUFFER_SUPPORTED_NV;
use crate::egl::{Attributes, NativeDisplay, NativeWindow};
use crate::error::Result;

const CONFIG_ATTRIBUTES: Attributes = &[
    egl::RED_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::BLUE_SIZE,
    8,
    egl::ALPHA_SIZE,
    8,
    egl::DEPTH_SIZE,
    24,
    egl::STENCIL_SIZE,
    8,
    egl::SAMPLE_BUFFERS,
    egl::DONT_CARE,
    egl::SAMPLES,
    4, // 4x MSAA
    egl::NONE,
];

const SURFACE_ATTRIBUTES: Attributes = &[
    EGL_POST_SUB_BUFFER_SUPPORTED_NV,
    egl::TRUE as egl::Int,
    egl::NONE,
    egl::NONE,
];

/// Source of the native display for a host window
pub trait WindowSystem {
    fn acquire_display(&self, window: NativeWindow) -> Result<NativeDisplay>;
    fn release_display(&self, window: NativeWindow, display: NativeDisplay);
}

/// EGL_DEFAULT_DISPLAY for every window, nothing to release
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWindowSystem;

impl WindowSystem for DefaultWindowSystem {
    fn acquire_display(&self, _window: NativeWindow) -> Result<NativeDisplay> {
        Ok(egl::DEFAULT_DISPLAY)
    }

    fn release_display(&self, _window: NativeWindow, _display: NativeDisplay) {}
}

/// Desktop platform
pub struct DesktopPlatform<W: WindowSystem> {
    windows: W,
    window: NativeWindow,
    display: Option<NativeDisplay>,
}

impl<W: WindowSystem> DesktopPlatform<W> {
    pub fn new(windows: W) -> Self {
        Self {
            windows,
            window: std::ptr::null_mut(),
            display: None,
        }
    }
}

impl<W: WindowSystem> Platform for DesktopPlatform<W> {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn prepare(&mut self, settings: &DisplaySettings) -> Result<NativeDisplay> {
        self.window = settings
            .window
            .map_or(std::ptr::null_mut(), |w| w.as_ptr());
        let display = self.windows.acquire_display(self.window)?;
        self.display = Some(display);
        info!("Desktop window {:p}", self.window);
        Ok(display)
    }

    fn create_window(&mut self, _settings: &DisplaySettings) -> Result<NativeWindow> {
        Ok(self.window)
    }

    fn config_attributes(&self) -> Attributes {
        CONFIG_ATTRIBUTES
    }

    fn surface_attributes(&self) -> Attributes {
        SURFACE_ATTRIBUTES
    }

    fn release(&mut self, _window: Option<NativeWindow>) {
        if let Some(display) = self.display.take() {
            self.windows.release_display(self.window, display);
        }
    }

    fn capabilities(&self) -> Capabilities {
        // Desktop GLES drivers ship their compiler
        Capabilities {
            shader_compiler: true,
        }
    }
}
