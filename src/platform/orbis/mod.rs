//! Orbis setup: Piglet runtime
//!
//! Before EGL can be used, Piglet has to be loaded and configured:
//! 1. load the Piglet module
//! 2. reserve compositor memory when a private video budget is requested
//! 3. hand Piglet its configuration record
//! 4. optionally patch the runtime shader compiler in
//!
//! The native window is a `PglWindow` descriptor owned by the platform.

pub mod compositor;
pub mod kernel;
pub mod patch;
pub mod piglet;
pub mod sys;

use khronos_egl as egl;
use log::info;

use super::{Capabilities, Platform};
use crate::config::DisplaySettings;
use crate::constants::PIGLET_MODULE;
use crate::egl::{Attributes, NativeDisplay, NativeWindow};
use crate::error::{Error, Result};
use compositor::Compositor;
use kernel::{ModuleLoader, Privilege, ProcessMemory};
use patch::{PatchTable, PIGLET_474_DEVKIT};
use piglet::{PglConfig, PglWindow, PigletRuntime};

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
    0,
    egl::STENCIL_SIZE,
    0,
    egl::SAMPLE_BUFFERS,
    0,
    egl::SAMPLES,
    4, // 4x MSAA
    egl::RENDERABLE_TYPE,
    egl::OPENGL_ES2_BIT,
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::NONE,
];

const SURFACE_ATTRIBUTES: Attributes = &[
    egl::RENDER_BUFFER,
    egl::BACK_BUFFER,
    egl::NONE,
    egl::NONE,
];

/// Native services the Orbis setup path calls into
pub struct OrbisServices {
    pub loader: Box<dyn ModuleLoader>,
    pub memory: Box<dyn ProcessMemory>,
    pub privilege: Box<dyn Privilege>,
    pub compositor: Box<dyn Compositor>,
    pub piglet: Box<dyn PigletRuntime>,
}

impl OrbisServices {
    /// Services backed by the system libraries, elevating through `privilege`
    pub fn system(privilege: Box<dyn Privilege>) -> Result<Self> {
        let kernel = sys::SysKernel::open()?;
        Ok(Self {
            loader: Box::new(kernel.clone()),
            memory: Box::new(kernel),
            privilege,
            compositor: Box::new(sys::SysCompositor::open()?),
            piglet: Box::new(sys::SysPiglet),
        })
    }
}

/// Orbis platform
pub struct OrbisPlatform {
    services: OrbisServices,
    patch_table: &'static PatchTable,
    capabilities: Capabilities,
    window: Option<Box<PglWindow>>,
}

impl OrbisPlatform {
    pub fn new(services: OrbisServices) -> Self {
        Self {
            services,
            patch_table: &PIGLET_474_DEVKIT,
            capabilities: Capabilities::default(),
            window: None,
        }
    }

    /// Start from capabilities negotiated by an earlier context in this
    /// process, so Piglet is not patched twice
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Patch table for a different Piglet build
    pub fn with_patch_table(mut self, table: &'static PatchTable) -> Self {
        self.patch_table = table;
        self
    }

    /// Load Piglet, reserve compositor memory and configure the runtime
    fn initialize_piglet(&self, settings: &DisplaySettings) -> Result<()> {
        let module = self.services.loader.load_start_module(PIGLET_MODULE)?;
        if module.is_error() {
            return Err(Error::ModuleNotFound {
                module: PIGLET_MODULE,
                code: module.code(),
            });
        }
        info!("Piglet loaded: 0x{:08X}", module.code());

        if settings.memory.video_private > 0 {
            compositor::configure_memory(self.services.compositor.as_ref(), &settings.memory)?;
        }

        let config = PglConfig::new(settings.width, settings.height, &settings.memory);
        piglet::apply_configuration(self.services.piglet.as_ref(), &config)
    }
}

impl Platform for OrbisPlatform {
    fn name(&self) -> &'static str {
        "orbis"
    }

    fn prepare(&mut self, settings: &DisplaySettings) -> Result<NativeDisplay> {
        self.initialize_piglet(settings)?;
        patch::enable_shader_compiler(
            &self.services,
            self.patch_table,
            settings.force_shader_compiler,
            &mut self.capabilities,
        );
        Ok(egl::DEFAULT_DISPLAY)
    }

    fn create_window(&mut self, settings: &DisplaySettings) -> Result<NativeWindow> {
        let window = self
            .window
            .insert(Box::new(PglWindow::new(settings.width, settings.height)));
        Ok(window.as_mut() as *mut PglWindow as NativeWindow)
    }

    fn config_attributes(&self) -> Attributes {
        CONFIG_ATTRIBUTES
    }

    fn surface_attributes(&self) -> Attributes {
        SURFACE_ATTRIBUTES
    }

    fn release(&mut self, _window: Option<NativeWindow>) {
        self.window = None;
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}
