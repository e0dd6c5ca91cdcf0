//! Runtime shader compiler patch
//!
//! Piglet ships with its shader compiler path disabled. With the compiler
//! module loaded, a few bytes in the Piglet image turn the path back on and
//! hand it the compiler's module handle. Offsets are only valid for the
//! Piglet build a table was made for; other builds need their own table.

use log::{info, warn};

use super::kernel::{
    load_optional, Elevation, ModuleHandle, ModuleLoader, ModuleRegion, Privilege,
    ProcessMemory, Protection,
};
use super::OrbisServices;
use crate::constants::{PIGLET_MODULE, SHADER_COMPILER_MODULE};
use crate::error::Result;
use crate::platform::Capabilities;

/// Bytes written at an offset from the module base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite {
    pub offset: usize,
    pub bytes: &'static [u8],
}

/// Patch sites for one Piglet build
#[derive(Debug)]
pub struct PatchTable {
    /// Build the offsets were taken from
    pub build: &'static str,
    pub sites: &'static [PatchSite],
    /// Where the compiler module handle goes (i32, little endian)
    pub handle_slot: usize,
}

/// Piglet from the 4.74 devkit firmware
pub static PIGLET_474_DEVKIT: PatchTable = PatchTable {
    build: "4.74 devkit",
    sites: &[
        // xor eax, eax; inc eax; nop
        PatchSite {
            offset: 0x5451F,
            bytes: &[0x31, 0xC0, 0xFF, 0xC0, 0x90],
        },
        // runtime compiler present
        PatchSite {
            offset: 0xB2DEC,
            bytes: &[0x00, 0x00, 0x01],
        },
        PatchSite {
            offset: 0xB2E21,
            bytes: &[0x01],
        },
    ],
    handle_slot: 0xB2E24,
};

const HANDLE_LEN: usize = std::mem::size_of::<i32>();

impl PatchTable {
    /// Check that every write lands inside `region`
    pub fn fits(&self, region: &ModuleRegion) -> bool {
        self.sites
            .iter()
            .all(|site| region.contains(site.offset, site.bytes.len()))
            && region.contains(self.handle_slot, HANDLE_LEN)
    }

    /// Write every site and the compiler handle into `region`.
    /// The caller holds whatever privileges mprotect needs.
    ///
    /// Every range is made writable before the first byte is written, so a
    /// refused mprotect leaves the image untouched.
    pub fn apply(
        &self,
        memory: &dyn ProcessMemory,
        region: &ModuleRegion,
        compiler: ModuleHandle,
    ) -> Result<()> {
        let handle = compiler.0.to_le_bytes();
        let mut writes: Vec<(usize, &[u8])> = Vec::with_capacity(self.sites.len() + 1);
        for site in self.sites {
            writes.push((site.offset, site.bytes));
        }
        writes.push((self.handle_slot, &handle));

        for &(offset, bytes) in &writes {
            memory.protect(
                region.base + offset,
                bytes.len(),
                Protection::READ | Protection::WRITE | Protection::EXEC,
            )?;
        }

        for &(offset, bytes) in &writes {
            // SAFETY: `PatchTable::fits` placed the range inside the loaded
            // Piglet image, which is writable now; nothing renders before
            // EGL init.
            unsafe { memory.write(region.base + offset, bytes)? };
        }
        Ok(())
    }
}

/// Load the shader compiler and patch it into Piglet
///
/// Every failure here is logged and leaves the compiler disabled.
pub fn enable_shader_compiler(
    services: &OrbisServices,
    table: &PatchTable,
    force: bool,
    capabilities: &mut Capabilities,
) {
    if capabilities.shader_compiler {
        return;
    }

    let privilege: &dyn Privilege = services.privilege.as_ref();
    if !force && !privilege.is_elevated() {
        info!("OpenGL Shader Compiler skipped (process not privileged)");
        return;
    }

    // Elevate before anything is loaded; a forced request that cannot be
    // honoured stops here.
    let _elevation = match Elevation::acquire(privilege) {
        Ok(elevation) => elevation,
        Err(e) => {
            warn!("OpenGL Shader Compiler Unavailable - {}", e);
            return;
        }
    };

    let loader: &dyn ModuleLoader = services.loader.as_ref();
    let Some(compiler) = load_optional(loader, SHADER_COMPILER_MODULE) else {
        info!("OpenGL Shader Compiler Unavailable");
        return;
    };

    info!("OpenGL Shader Compiler Found - Applying Patches...");
    let Some(region) = loader.module_region(PIGLET_MODULE) else {
        warn!("OpenGL Shader Compiler Unavailable - Failed to find the Piglet Base Address");
        return;
    };

    if !table.fits(&region) {
        warn!(
            "OpenGL Shader Compiler Unavailable - Piglet image (0x{:X} bytes) does not match the {} patch table",
            region.size, table.build
        );
        return;
    }

    let patched = table.apply(services.memory.as_ref(), &region, compiler);

    match patched {
        Ok(()) => {
            capabilities.shader_compiler = true;
            info!("OpenGL Shader Compiler Enabled");
        }
        Err(e) => warn!("OpenGL Shader Compiler Unavailable - {}", e),
    }
}
