//! EGL entry points used by display setup
//!
//! `Egl` is the slice of the EGL API that `DisplayContext` drives.
//! `DynamicEgl` backs it with a dynamically loaded libEGL (or Piglet);
//! tests back it with a recording fake.

mod dynamic;

pub use dynamic::DynamicEgl;

use khronos_egl as egl;
use std::fmt::Debug;

/// Native display id passed to eglGetDisplay
pub type NativeDisplay = egl::NativeDisplayType;

/// Native window passed to eglCreateWindowSurface
pub type NativeWindow = egl::NativeWindowType;

/// Attribute list terminated by EGL_NONE
pub type Attributes = &'static [egl::Int];

/// EGL display/config/surface/context operations
///
/// Handle types are associated so fakes can use plain integers.
pub trait Egl {
    type Display: Copy + Debug;
    type Config: Copy + Debug;
    type Surface: Copy + Debug;
    type Context: Copy + Debug;

    fn get_display(&self, native: NativeDisplay) -> Option<Self::Display>;

    /// Returns (major, minor)
    fn initialize(&self, display: Self::Display) -> Result<(egl::Int, egl::Int), egl::Error>;

    fn bind_api(&self, api: egl::Enum) -> Result<(), egl::Error>;

    /// First config matching `attributes`, if any
    fn choose_config(
        &self,
        display: Self::Display,
        attributes: &[egl::Int],
    ) -> Result<Option<Self::Config>, egl::Error>;

    fn create_window_surface(
        &self,
        display: Self::Display,
        config: Self::Config,
        window: NativeWindow,
        attributes: &[egl::Int],
    ) -> Result<Self::Surface, egl::Error>;

    fn create_context(
        &self,
        display: Self::Display,
        config: Self::Config,
        attributes: &[egl::Int],
    ) -> Result<Self::Context, egl::Error>;

    fn make_current(
        &self,
        display: Self::Display,
        surface: Self::Surface,
        context: Self::Context,
    ) -> Result<(), egl::Error>;

    fn swap_interval(&self, display: Self::Display, interval: egl::Int) -> Result<(), egl::Error>;

    fn swap_buffers(&self, display: Self::Display, surface: Self::Surface) -> Result<(), egl::Error>;

    fn destroy_surface(&self, display: Self::Display, surface: Self::Surface) -> Result<(), egl::Error>;

    fn destroy_context(&self, display: Self::Display, context: Self::Context) -> Result<(), egl::Error>;

    fn terminate(&self, display: Self::Display) -> Result<(), egl::Error>;
}

/// OpenGL ES 2 context
pub const CONTEXT_ATTRIBUTES: Attributes = &[egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];
