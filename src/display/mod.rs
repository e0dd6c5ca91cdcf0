//! Display context
//!
//! Owns one EGL display/surface/context triple and the platform window it
//! renders into. Construction either yields a fully initialized context or
//! an error with everything acquired so far released again.

use khronos_egl as egl;
use log::{debug, info, warn};

use crate::config::DisplaySettings;
use crate::egl::{Egl, NativeWindow, CONTEXT_ATTRIBUTES};
use crate::error::{Error, Result};
use crate::platform::{Capabilities, Platform};

/// Native resources of a prepared platform; drop releases whatever is
/// held, surface → context → display → platform window
struct Resources<E: Egl> {
    egl: E,
    platform: Box<dyn Platform>,
    display: Option<E::Display>,
    window: Option<NativeWindow>,
    surface: Option<E::Surface>,
    context: Option<E::Context>,
}

impl<E: Egl> Resources<E> {
    fn new(egl: E, platform: Box<dyn Platform>) -> Self {
        Self {
            egl,
            platform,
            display: None,
            window: None,
            surface: None,
            context: None,
        }
    }
}

impl<E: Egl> Drop for Resources<E> {
    fn drop(&mut self) {
        if let Some(display) = self.display.take() {
            if let Some(surface) = self.surface.take() {
                if let Err(e) = self.egl.destroy_surface(display, surface) {
                    debug!("eglDestroySurface: {}", e);
                }
            }
            if let Some(context) = self.context.take() {
                if let Err(e) = self.egl.destroy_context(display, context) {
                    debug!("eglDestroyContext: {}", e);
                }
            }
            if let Err(e) = self.egl.terminate(display) {
                debug!("eglTerminate: {}", e);
            }
        }
        self.platform.release(self.window.take());
    }
}

/// EGL display context
///
/// Dropping the context releases it; `dispose` does the same explicitly.
pub struct DisplayContext<E: Egl> {
    resources: Resources<E>,
    display: E::Display,
    surface: E::Surface,
    width: u32,
    height: u32,
    version: (egl::Int, egl::Int),
    capabilities: Capabilities,
}

impl<E: Egl> DisplayContext<E> {
    /// Run platform setup, then bring up EGL on the platform window
    pub fn new(egl: E, platform: Box<dyn Platform>, settings: &DisplaySettings) -> Result<Self> {
        Self::with_loader(platform, settings, move || Ok(egl))
    }

    /// Like `new`, but EGL is loaded only once platform setup succeeded.
    /// Needed where the EGL library is a module that setup itself loads.
    pub fn with_loader<F>(
        mut platform: Box<dyn Platform>,
        settings: &DisplaySettings,
        load_egl: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<E>,
    {
        settings.validate()?;
        info!(
            "Initializing {} display {}x{}",
            platform.name(),
            settings.width,
            settings.height
        );

        let native_display = platform.prepare(settings)?;
        let egl = match load_egl() {
            Ok(egl) => egl,
            Err(e) => {
                platform.release(None);
                return Err(e);
            }
        };

        let mut res = Resources::new(egl, platform);

        let display = res
            .egl
            .get_display(native_display)
            .ok_or(Error::NoDisplay)?;
        res.display = Some(display);

        let version = res
            .egl
            .initialize(display)
            .map_err(Error::egl("eglInitialize"))?;
        res.egl
            .bind_api(egl::OPENGL_ES_API)
            .map_err(Error::egl("eglBindAPI"))?;

        let window = res.platform.create_window(settings)?;
        res.window = Some(window);

        let config = res
            .egl
            .choose_config(display, res.platform.config_attributes())
            .map_err(Error::egl("eglChooseConfig"))?
            .ok_or(Error::NoConfig)?;

        let surface = res
            .egl
            .create_window_surface(display, config, window, res.platform.surface_attributes())
            .map_err(Error::egl("eglCreateWindowSurface"))?;
        res.surface = Some(surface);

        let context = res
            .egl
            .create_context(display, config, CONTEXT_ATTRIBUTES)
            .map_err(Error::egl("eglCreateContext"))?;
        res.context = Some(context);

        res.egl
            .make_current(display, surface, context)
            .map_err(Error::egl("eglMakeCurrent"))?;

        // vsync off; drivers without swap control still render
        if let Err(e) = res.egl.swap_interval(display, 0) {
            warn!("eglSwapInterval(0) failed: {}", e);
        }

        let capabilities = res.platform.capabilities();
        info!(
            "EGL {}.{} context created (shader compiler: {})",
            version.0, version.1, capabilities.shader_compiler
        );

        Ok(Self {
            resources: res,
            display,
            surface,
            width: settings.width,
            height: settings.height,
            version,
            capabilities,
        })
    }

    /// Present the back buffer
    pub fn swap_buffers(&self) -> Result<()> {
        self.resources
            .egl
            .swap_buffers(self.display, self.surface)
            .map_err(Error::egl("eglSwapBuffers"))
    }

    /// Release surface, context, display and window, in that order
    pub fn dispose(self) {
        info!("Disposing {} display", self.resources.platform.name());
        drop(self);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// EGL (major, minor)
    pub fn egl_version(&self) -> (egl::Int, egl::Int) {
        self.version
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}
