//! Kernel services used by the Orbis setup path
//!
//! Module loading, page protection and privilege elevation, each behind a
//! trait so the setup logic runs against fakes in tests.

use bitflags::bitflags;
use log::{debug, warn};

use crate::constants::MODULE_ERROR_BIT;
use crate::error::{Error, Result};

/// Result of sceKernelLoadStartModule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleHandle(pub i32);

impl ModuleHandle {
    /// Loader failures come back as negative handles (bit 31 set)
    pub fn is_error(self) -> bool {
        self.code() & MODULE_ERROR_BIT != 0
    }

    /// Raw value as an unsigned result code
    pub fn code(self) -> u32 {
        self.0 as u32
    }
}

/// Address range of a loaded module's first segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRegion {
    pub base: usize,
    pub size: usize,
}

impl ModuleRegion {
    /// Check that `offset..offset + len` lies inside the module
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .map_or(false, |end| end <= self.size)
    }
}

/// Module loader
pub trait ModuleLoader {
    /// Load and start a module by file name.
    /// `Err` means the loader itself is unusable; a refused load is an
    /// error-coded handle.
    fn load_start_module(&self, name: &str) -> Result<ModuleHandle>;

    /// Locate an already loaded module
    fn module_region(&self, name: &str) -> Option<ModuleRegion>;
}

bitflags! {
    /// Page protection bits (BSD values)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Protection: i32 {
        const READ = 0x1;
        const WRITE = 0x2;
        const EXEC = 0x4;
    }
}

/// Process memory access
pub trait ProcessMemory {
    fn protect(&self, addr: usize, len: usize, prot: Protection) -> Result<()>;

    /// Copy `bytes` to `addr`.
    ///
    /// # Safety
    /// `addr..addr + bytes.len()` must be mapped and writable in this
    /// process, and nothing else may be executing or reading it.
    unsafe fn write(&self, addr: usize, bytes: &[u8]) -> Result<()>;
}

/// Privilege elevation (jailbreak) control
pub trait Privilege {
    fn is_elevated(&self) -> bool;
    fn elevate(&self) -> Result<()>;
    fn restore(&self);
}

/// Privilege state fixed at startup by whoever launched the process
#[derive(Debug, Clone, Copy)]
pub struct StaticPrivilege {
    pub elevated: bool,
}

impl Privilege for StaticPrivilege {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn elevate(&self) -> Result<()> {
        if self.elevated {
            Ok(())
        } else {
            Err(Error::Library {
                name: "privilege".to_string(),
                reason: "no elevation facility available".to_string(),
            })
        }
    }

    fn restore(&self) {}
}

/// Scoped elevation: restores the previous privilege level on drop
pub struct Elevation<'a> {
    privilege: &'a dyn Privilege,
    elevated_here: bool,
}

impl<'a> Elevation<'a> {
    /// Elevate unless already elevated
    pub fn acquire(privilege: &'a dyn Privilege) -> Result<Self> {
        let elevated_here = if privilege.is_elevated() {
            false
        } else {
            privilege.elevate()?;
            debug!("Privileges elevated");
            true
        };
        Ok(Self {
            privilege,
            elevated_here,
        })
    }
}

impl Drop for Elevation<'_> {
    fn drop(&mut self) {
        if self.elevated_here {
            self.privilege.restore();
            debug!("Privileges restored");
        }
    }
}

/// Load a module, mapping loader trouble and error handles to one warning.
/// Used for optional modules.
pub fn load_optional(loader: &dyn ModuleLoader, name: &str) -> Option<ModuleHandle> {
    match loader.load_start_module(name) {
        Ok(handle) if !handle.is_error() => Some(handle),
        Ok(handle) => {
            debug!("LoadStartModule({}) result 0x{:08X}", name, handle.code());
            None
        }
        Err(e) => {
            warn!("LoadStartModule({}) unavailable: {}", name, e);
            None
        }
    }
}
