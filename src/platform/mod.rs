//! Platform setup paths
//!
//! Handles:
//! - Desktop: EGL bound to a host window
//! - Orbis: Piglet module load, compositor memory budget, runtime
//!   configuration and the optional shader compiler patch
//!
//! Both implement `Platform`; `DisplayContext` drives whichever one it is
//! given and never branches on the platform itself.

pub mod desktop;
pub mod orbis;

pub use desktop::{DefaultWindowSystem, DesktopPlatform, WindowSystem};
pub use orbis::{OrbisPlatform, OrbisServices};

use crate::config::DisplaySettings;
use crate::egl::{Attributes, NativeDisplay, NativeWindow};
use crate::error::Result;

/// Features negotiated during setup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// glShaderSource/glCompileShader work at runtime
    pub shader_compiler: bool,
}

/// Platform-specific half of display setup
///
/// Call order: `prepare`, then (after eglInitialize and eglBindAPI)
/// `create_window`, then `release` exactly once on teardown.
pub trait Platform {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Work that must happen before EGL is touched.
    /// Returns the native display id for eglGetDisplay.
    fn prepare(&mut self, settings: &DisplaySettings) -> Result<NativeDisplay>;

    /// Window handle the EGL surface is created on
    fn create_window(&mut self, settings: &DisplaySettings) -> Result<NativeWindow>;

    /// eglChooseConfig attributes
    fn config_attributes(&self) -> Attributes;

    /// eglCreateWindowSurface attributes
    fn surface_attributes(&self) -> Attributes;

    /// Release what `prepare` and `create_window` acquired.
    /// `window` is None when setup failed before `create_window`.
    fn release(&mut self, window: Option<NativeWindow>);

    fn capabilities(&self) -> Capabilities;
}
