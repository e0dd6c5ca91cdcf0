//! Dynamically loaded EGL
//!
//! Opens the EGL library at runtime through libloading so the same binary
//! runs against Mesa, ANGLE or the Piglet module.

use khronos_egl as egl;
use log::{debug, info};

use super::{Egl, NativeDisplay, NativeWindow};
use crate::error::{Error, Result};

/// EGL instance type (dynamic loading)
type EglInstance = egl::Instance<egl::Dynamic<libloading::Library, egl::EGL1_4>>;

/// EGL backed by a dynamically loaded library
pub struct DynamicEgl {
    instance: EglInstance,
}

impl DynamicEgl {
    /// Load the first library in `candidates` that opens and exports EGL 1.4
    pub fn load(candidates: &[&str]) -> Result<Self> {
        let mut last_error = None;
        for name in candidates {
            match Self::load_from(name) {
                Ok(egl) => return Ok(egl),
                Err(e) => {
                    debug!("EGL candidate {} rejected: {}", name, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Library {
            name: "EGL".to_string(),
            reason: "no candidate libraries".to_string(),
        }))
    }

    fn load_from(name: &str) -> Result<Self> {
        let lib = unsafe { libloading::Library::new(name) }.map_err(|e| Error::Library {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let instance: EglInstance = unsafe {
            egl::DynamicInstance::<egl::EGL1_4>::load_required_from(lib).map_err(|e| {
                Error::Library {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            })?
        };

        info!("EGL loaded from {}", name);
        Ok(Self { instance })
    }

    /// Vendor/version strings, for logging
    pub fn describe(&self, display: egl::Display) -> Option<String> {
        let vendor = self.instance.query_string(Some(display), egl::VENDOR).ok()?;
        let version = self.instance.query_string(Some(display), egl::VERSION).ok()?;
        Some(format!(
            "{} {}",
            vendor.to_string_lossy(),
            version.to_string_lossy()
        ))
    }
}

impl Egl for DynamicEgl {
    type Display = egl::Display;
    type Config = egl::Config;
    type Surface = egl::Surface;
    type Context = egl::Context;

    fn get_display(&self, native: NativeDisplay) -> Option<egl::Display> {
        unsafe { self.instance.get_display(native) }
    }

    fn initialize(&self, display: egl::Display) -> std::result::Result<(egl::Int, egl::Int), egl::Error> {
        let version = self.instance.initialize(display)?;
        if let Some(description) = self.describe(display) {
            info!("EGL: {}", description);
        }
        Ok(version)
    }

    fn bind_api(&self, api: egl::Enum) -> std::result::Result<(), egl::Error> {
        self.instance.bind_api(api)
    }

    fn choose_config(
        &self,
        display: egl::Display,
        attributes: &[egl::Int],
    ) -> std::result::Result<Option<egl::Config>, egl::Error> {
        self.instance.choose_first_config(display, attributes)
    }

    fn create_window_surface(
        &self,
        display: egl::Display,
        config: egl::Config,
        window: NativeWindow,
        attributes: &[egl::Int],
    ) -> std::result::Result<egl::Surface, egl::Error> {
        unsafe {
            self.instance
                .create_window_surface(display, config, window, Some(attributes))
        }
    }

    fn create_context(
        &self,
        display: egl::Display,
        config: egl::Config,
        attributes: &[egl::Int],
    ) -> std::result::Result<egl::Context, egl::Error> {
        self.instance.create_context(display, config, None, attributes)
    }

    fn make_current(
        &self,
        display: egl::Display,
        surface: egl::Surface,
        context: egl::Context,
    ) -> std::result::Result<(), egl::Error> {
        self.instance
            .make_current(display, Some(surface), Some(surface), Some(context))
    }

    fn swap_interval(&self, display: egl::Display, interval: egl::Int) -> std::result::Result<(), egl::Error> {
        self.instance.swap_interval(display, interval)
    }

    fn swap_buffers(&self, display: egl::Display, surface: egl::Surface) -> std::result::Result<(), egl::Error> {
        self.instance.swap_buffers(display, surface)
    }

    fn destroy_surface(&self, display: egl::Display, surface: egl::Surface) -> std::result::Result<(), egl::Error> {
        self.instance.destroy_surface(display, surface)
    }

    fn destroy_context(&self, display: egl::Display, context: egl::Context) -> std::result::Result<(), egl::Error> {
        self.instance.destroy_context(display, context)
    }

    fn terminate(&self, display: egl::Display) -> std::result::Result<(), egl::Error> {
        self.instance.terminate(display)
    }
}
