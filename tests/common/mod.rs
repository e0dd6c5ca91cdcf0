//! Fakes for the native layer
//!
//! Every fake appends to a shared journal so tests can assert on call order.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use khronos_egl as egl;

use eglboot::config::DisplaySettings;
use eglboot::egl::{Attributes, Egl, NativeDisplay, NativeWindow};
use eglboot::error::{Error, Result};
use eglboot::platform::orbis::compositor::Compositor;
use eglboot::platform::orbis::kernel::{
    ModuleHandle, ModuleLoader, ModuleRegion, Privilege, ProcessMemory, Protection,
};
use eglboot::platform::orbis::piglet::{PglConfig, PigletRuntime};
use eglboot::platform::{Capabilities, OrbisServices, Platform, WindowSystem};

/// Shared, ordered call log
#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Entries starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        !self.matching(prefix).is_empty()
    }

    /// Entries after the last one equal to `marker`
    pub fn after(&self, marker: &str) -> Vec<String> {
        let entries = self.0.borrow();
        match entries.iter().rposition(|e| e == marker) {
            Some(i) => entries[i + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ============================================================================
// EGL
// ============================================================================

/// EGL fake with integer handles
pub struct FakeEgl {
    pub journal: Journal,
    /// Call name that reports failure
    pub fail: Option<&'static str>,
    /// Last eglChooseConfig attribute list
    pub config_attributes: Rc<RefCell<Vec<egl::Int>>>,
    /// Window passed to eglCreateWindowSurface
    pub window: Rc<Cell<NativeWindow>>,
}

impl FakeEgl {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail: None,
            config_attributes: Rc::default(),
            window: Rc::new(Cell::new(std::ptr::null_mut())),
        }
    }

    pub fn failing(journal: &Journal, call: &'static str) -> Self {
        Self {
            fail: Some(call),
            ..Self::new(journal)
        }
    }

    fn call(&self, name: &'static str) -> std::result::Result<(), egl::Error> {
        self.journal.push(name);
        if self.fail == Some(name) {
            Err(egl::Error::BadAlloc)
        } else {
            Ok(())
        }
    }
}

impl Egl for FakeEgl {
    type Display = u32;
    type Config = u32;
    type Surface = u32;
    type Context = u32;

    fn get_display(&self, _native: NativeDisplay) -> Option<u32> {
        self.call("eglGetDisplay").ok().map(|_| 1)
    }

    fn initialize(&self, display: u32) -> std::result::Result<(egl::Int, egl::Int), egl::Error> {
        assert_eq!(display, 1);
        self.call("eglInitialize").map(|_| (1, 4))
    }

    fn bind_api(&self, api: egl::Enum) -> std::result::Result<(), egl::Error> {
        assert_eq!(api, egl::OPENGL_ES_API);
        self.call("eglBindAPI")
    }

    fn choose_config(
        &self,
        _display: u32,
        attributes: &[egl::Int],
    ) -> std::result::Result<Option<u32>, egl::Error> {
        *self.config_attributes.borrow_mut() = attributes.to_vec();
        self.journal.push("eglChooseConfig");
        match self.fail {
            Some("eglChooseConfig") => Err(egl::Error::BadAttribute),
            Some("no config") => Ok(None),
            _ => Ok(Some(7)),
        }
    }

    fn create_window_surface(
        &self,
        _display: u32,
        config: u32,
        window: NativeWindow,
        _attributes: &[egl::Int],
    ) -> std::result::Result<u32, egl::Error> {
        assert_eq!(config, 7);
        self.window.set(window);
        self.call("eglCreateWindowSurface").map(|_| 2)
    }

    fn create_context(
        &self,
        _display: u32,
        config: u32,
        attributes: &[egl::Int],
    ) -> std::result::Result<u32, egl::Error> {
        assert_eq!(config, 7);
        assert_eq!(attributes, &[egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE]);
        self.call("eglCreateContext").map(|_| 3)
    }

    fn make_current(&self, _display: u32, surface: u32, context: u32) -> std::result::Result<(), egl::Error> {
        assert_eq!((surface, context), (2, 3));
        self.call("eglMakeCurrent")
    }

    fn swap_interval(&self, _display: u32, interval: egl::Int) -> std::result::Result<(), egl::Error> {
        assert_eq!(interval, 0);
        self.call("eglSwapInterval")
    }

    fn swap_buffers(&self, _display: u32, surface: u32) -> std::result::Result<(), egl::Error> {
        assert_eq!(surface, 2);
        self.call("eglSwapBuffers")
    }

    fn destroy_surface(&self, _display: u32, surface: u32) -> std::result::Result<(), egl::Error> {
        assert_eq!(surface, 2);
        self.call("eglDestroySurface")
    }

    fn destroy_context(&self, _display: u32, context: u32) -> std::result::Result<(), egl::Error> {
        assert_eq!(context, 3);
        self.call("eglDestroyContext")
    }

    fn terminate(&self, _display: u32) -> std::result::Result<(), egl::Error> {
        self.call("eglTerminate")
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// Window system journaling device context traffic
pub struct FakeWindows {
    pub journal: Journal,
}

impl WindowSystem for FakeWindows {
    fn acquire_display(&self, _window: NativeWindow) -> Result<NativeDisplay> {
        self.journal.push("GetDC");
        Ok(0x44usize as NativeDisplay)
    }

    fn release_display(&self, _window: NativeWindow, _display: NativeDisplay) {
        self.journal.push("ReleaseDC");
    }
}

/// Forwards to `P` and journals `release`
pub struct RecordingPlatform<P: Platform> {
    pub inner: P,
    pub journal: Journal,
}

impl<P: Platform> Platform for RecordingPlatform<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn prepare(&mut self, settings: &DisplaySettings) -> Result<NativeDisplay> {
        self.inner.prepare(settings)
    }

    fn create_window(&mut self, settings: &DisplaySettings) -> Result<NativeWindow> {
        let window = self.inner.create_window(settings)?;
        self.journal.push("create window");
        Ok(window)
    }

    fn config_attributes(&self) -> Attributes {
        self.inner.config_attributes()
    }

    fn surface_attributes(&self) -> Attributes {
        self.inner.surface_attributes()
    }

    fn release(&mut self, window: Option<NativeWindow>) {
        self.journal.push(match window {
            Some(_) => "release window",
            None => "release",
        });
        self.inner.release(window);
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }
}

// ============================================================================
// Orbis services
// ============================================================================

pub const PIGLET_BASE: usize = 0x2000_0000;
pub const PIGLET_SIZE: usize = 0xC0000;
pub const FILL: u8 = 0xCC;
pub const PIGLET_HANDLE: i32 = 0x21;
pub const COMPILER_HANDLE: i32 = 0x0012_3456;

/// Knobs and observation points for the Orbis fakes
pub struct OrbisFakes {
    pub journal: Journal,
    pub piglet_handle: i32,
    pub compiler_handle: i32,
    pub region: Option<ModuleRegion>,
    pub elevated: bool,
    pub allow_elevation: bool,
    pub compositor_result: u32,
    pub accept_config: bool,
    /// Module offset whose mprotect fails
    pub fail_protect_at: Option<usize>,
    pub image: Rc<RefCell<Vec<u8>>>,
    pub configs: Rc<RefCell<Vec<PglConfig>>>,
}

impl OrbisFakes {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            piglet_handle: PIGLET_HANDLE,
            compiler_handle: COMPILER_HANDLE,
            region: Some(ModuleRegion {
                base: PIGLET_BASE,
                size: PIGLET_SIZE,
            }),
            elevated: false,
            allow_elevation: true,
            compositor_result: 0,
            accept_config: true,
            fail_protect_at: None,
            image: Rc::new(RefCell::new(vec![FILL; PIGLET_SIZE])),
            configs: Rc::default(),
        }
    }

    pub fn services(&self) -> OrbisServices {
        OrbisServices {
            loader: Box::new(FakeLoader {
                journal: self.journal.clone(),
                piglet: self.piglet_handle,
                compiler: self.compiler_handle,
                region: self.region,
            }),
            memory: Box::new(FakeMemory {
                journal: self.journal.clone(),
                image: self.image.clone(),
                fail_protect_at: self.fail_protect_at,
            }),
            privilege: Box::new(FakePrivilege {
                journal: self.journal.clone(),
                elevated: Cell::new(self.elevated),
                allow: self.allow_elevation,
            }),
            compositor: Box::new(FakeCompositor {
                journal: self.journal.clone(),
                result: self.compositor_result,
            }),
            piglet: Box::new(FakePiglet {
                journal: self.journal.clone(),
                configs: self.configs.clone(),
                accept: self.accept_config,
            }),
        }
    }

    /// Bytes of the fake Piglet image at `offset`
    pub fn bytes_at(&self, offset: usize, len: usize) -> Vec<u8> {
        self.image.borrow()[offset..offset + len].to_vec()
    }

    /// Offsets that differ from the initial fill
    pub fn touched(&self) -> Vec<usize> {
        self.image
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, &b)| b != FILL)
            .map(|(i, _)| i)
            .collect()
    }
}

struct FakeLoader {
    journal: Journal,
    piglet: i32,
    compiler: i32,
    region: Option<ModuleRegion>,
}

impl ModuleLoader for FakeLoader {
    fn load_start_module(&self, name: &str) -> Result<ModuleHandle> {
        self.journal.push(format!("load {}", name));
        Ok(match name {
            "libScePigletv2VSH.sprx" => ModuleHandle(self.piglet),
            "libSceShaccVSH.sprx" => ModuleHandle(self.compiler),
            _ => ModuleHandle(0x8002_0001u32 as i32),
        })
    }

    fn module_region(&self, name: &str) -> Option<ModuleRegion> {
        self.journal.push(format!("region {}", name));
        self.region
    }
}

struct FakeMemory {
    journal: Journal,
    image: Rc<RefCell<Vec<u8>>>,
    fail_protect_at: Option<usize>,
}

impl ProcessMemory for FakeMemory {
    fn protect(&self, addr: usize, len: usize, prot: Protection) -> Result<()> {
        let offset = addr - PIGLET_BASE;
        assert_eq!(prot, Protection::READ | Protection::WRITE | Protection::EXEC);
        self.journal.push(format!("protect 0x{:X} {}", offset, len));
        if self.fail_protect_at == Some(offset) {
            return Err(Error::Protect {
                addr,
                len,
                code: 0x8002_0016,
            });
        }
        Ok(())
    }

    unsafe fn write(&self, addr: usize, bytes: &[u8]) -> Result<()> {
        let offset = addr - PIGLET_BASE;
        self.journal
            .push(format!("write 0x{:X} {}", offset, bytes.len()));
        self.image.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

struct FakePrivilege {
    journal: Journal,
    elevated: Cell<bool>,
    allow: bool,
}

impl Privilege for FakePrivilege {
    fn is_elevated(&self) -> bool {
        self.elevated.get()
    }

    fn elevate(&self) -> Result<()> {
        self.journal.push("elevate");
        if !self.allow {
            return Err(Error::Library {
                name: "privilege".to_string(),
                reason: "denied".to_string(),
            });
        }
        self.elevated.set(true);
        Ok(())
    }

    fn restore(&self) {
        self.journal.push("restore");
        self.elevated.set(false);
    }
}

struct FakeCompositor {
    journal: Journal,
    result: u32,
}

impl Compositor for FakeCompositor {
    fn load_extension(&self) -> Result<()> {
        self.journal.push("compositor load");
        Ok(())
    }

    fn init_with_process_order(
        &self,
        system_shared: u64,
        video_shared: u64,
        video_private: u64,
        process_order: u64,
    ) -> Result<u32> {
        self.journal.push(format!(
            "compositor init {} {} {} {}",
            system_shared, video_shared, video_private, process_order
        ));
        Ok(self.result)
    }
}

struct FakePiglet {
    journal: Journal,
    configs: Rc<RefCell<Vec<PglConfig>>>,
    accept: bool,
}

impl PigletRuntime for FakePiglet {
    fn set_configuration(&self, config: &PglConfig) -> Result<bool> {
        self.journal.push("piglet configure");
        self.configs.borrow_mut().push(*config);
        Ok(self.accept)
    }
}
