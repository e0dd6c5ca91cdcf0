//! System implementations of the Orbis service traits
//!
//! Entry points are resolved by name at runtime so the crate builds on
//! hosts without the vendor SDK.

use libc::{c_char, c_int, c_void, size_t};
use libloading::Library;
use log::debug;
use std::ffi::CString;
use std::rc::Rc;

use super::compositor::Compositor;
use super::kernel::{ModuleHandle, ModuleLoader, ModuleRegion, ProcessMemory, Protection};
use super::piglet::{PglConfig, PigletRuntime};
use crate::constants::{
    COMPOSITE_EXT_LIBRARY, COMPOSITE_EXT_MODULE, KERNEL_MODULE, PIGLET_MODULE, SYSCORE_MODULE,
    SYSMODULE_MODULE,
};
use crate::error::{Error, Result};

type LoadStartModuleFn = unsafe extern "C" fn(
    name: *const c_char,
    argc: size_t,
    argv: *const c_void,
    flags: u32,
    opt: *const c_void,
    result: *mut c_int,
) -> c_int;
type GetModuleListFn =
    unsafe extern "C" fn(handles: *mut c_int, capacity: size_t, count: *mut size_t) -> c_int;
type GetModuleInfoFn = unsafe extern "C" fn(handle: c_int, info: *mut ModuleInfo) -> c_int;
type MprotectFn = unsafe extern "C" fn(addr: *const c_void, len: size_t, prot: c_int) -> c_int;
type SysmoduleLoadByNameFn =
    unsafe extern "C" fn(name: *const c_char, a: u64, b: u64, c: u64, d: u64) -> u32;
type ApplicationInitializeFn = unsafe extern "C" fn(name: *const c_char);
type CompositorInitFn = unsafe extern "C" fn(
    system_shared: u64,
    video_shared: u64,
    video_private: u64,
    process_order: u64,
) -> u32;
type SetConfigurationFn = unsafe extern "C" fn(config: *const PglConfig) -> bool;

/// Upper bound on modules enumerated when searching by name
const MAX_MODULES: usize = 256;

#[repr(C)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
struct ModuleSegment {
    address: *mut c_void,
    size: u32,
    prot: i32,
}

/// SceKernelModuleInfo
#[repr(C)]
#[allow(dead_code)]
struct ModuleInfo {
    size: size_t,
    name: [c_char; 256],
    segments: [ModuleSegment; 4],
    segment_count: u32,
    fingerprint: [u8; 20],
}

fn open(name: &'static str) -> Result<Library> {
    unsafe { Library::new(name) }.map_err(|e| Error::Library {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve `symbol` (NUL terminated) from `lib`
fn symbol<T: Copy>(lib: &Library, library: &'static str, symbol: &'static str) -> Result<T> {
    unsafe { lib.get::<T>(symbol.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|_| Error::Symbol {
            library,
            symbol: symbol.trim_end_matches('\0'),
        })
}

fn c_string(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::Library {
        name: name.to_string(),
        reason: "name contains a NUL byte".to_string(),
    })
}

/// libkernel: module loader and mprotect
#[derive(Clone)]
pub struct SysKernel {
    lib: Rc<Library>,
}

impl SysKernel {
    pub fn open() -> Result<Self> {
        Ok(Self {
            lib: Rc::new(open(KERNEL_MODULE)?),
        })
    }

    fn symbol<T: Copy>(&self, name: &'static str) -> Result<T> {
        symbol(&self.lib, KERNEL_MODULE, name)
    }

    fn module_info(&self, handle: c_int) -> Option<ModuleInfo> {
        let get_info: GetModuleInfoFn = self.symbol("sceKernelGetModuleInfo\0").ok()?;
        let mut info: ModuleInfo = unsafe { std::mem::zeroed() };
        info.size = std::mem::size_of::<ModuleInfo>();
        let ret = unsafe { get_info(handle, &mut info) };
        (ret == 0).then_some(info)
    }
}

/// Module names come back with or without the .sprx suffix
fn same_module(reported: &str, wanted: &str) -> bool {
    reported == wanted || Some(reported) == wanted.strip_suffix(".sprx")
}

impl ModuleLoader for SysKernel {
    fn load_start_module(&self, name: &str) -> Result<ModuleHandle> {
        let load: LoadStartModuleFn = self.symbol("sceKernelLoadStartModule\0")?;
        let path = c_string(name)?;
        let handle = unsafe {
            load(
                path.as_ptr(),
                0,
                std::ptr::null(),
                0,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        debug!("LoadStartModule({}) = 0x{:08X}", name, handle as u32);
        Ok(ModuleHandle(handle))
    }

    fn module_region(&self, name: &str) -> Option<ModuleRegion> {
        let list: GetModuleListFn = self.symbol("sceKernelGetModuleList\0").ok()?;
        let mut handles = [0 as c_int; MAX_MODULES];
        let mut count: size_t = 0;
        if unsafe { list(handles.as_mut_ptr(), handles.len(), &mut count) } != 0 {
            return None;
        }

        handles[..count.min(MAX_MODULES)]
            .iter()
            .filter_map(|&handle| self.module_info(handle))
            .find(|info| {
                let reported = unsafe { std::ffi::CStr::from_ptr(info.name.as_ptr()) };
                same_module(&reported.to_string_lossy(), name)
            })
            .filter(|info| info.segment_count > 0)
            .map(|info| ModuleRegion {
                base: info.segments[0].address as usize,
                size: info.segments[0].size as usize,
            })
    }
}

impl ProcessMemory for SysKernel {
    fn protect(&self, addr: usize, len: usize, prot: Protection) -> Result<()> {
        let mprotect: MprotectFn = self.symbol("sceKernelMprotect\0")?;
        let ret = unsafe { mprotect(addr as *const c_void, len, prot.bits()) };
        if ret != 0 {
            return Err(Error::Protect {
                addr,
                len,
                code: ret as u32,
            });
        }
        Ok(())
    }

    unsafe fn write(&self, addr: usize, bytes: &[u8]) -> Result<()> {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr as *mut u8, bytes.len());
        Ok(())
    }
}

/// Compositor through libSceSysmodule, libSceSysCore and libSceCompositeExt
pub struct SysCompositor {
    sysmodule: Library,
    syscore: Library,
}

impl SysCompositor {
    pub fn open() -> Result<Self> {
        Ok(Self {
            sysmodule: open(SYSMODULE_MODULE)?,
            syscore: open(SYSCORE_MODULE)?,
        })
    }
}

impl Compositor for SysCompositor {
    fn load_extension(&self) -> Result<()> {
        let load: SysmoduleLoadByNameFn = symbol(
            &self.sysmodule,
            SYSMODULE_MODULE,
            "sceSysmoduleLoadModuleByNameInternal\0",
        )?;
        let init: ApplicationInitializeFn =
            symbol(&self.syscore, SYSCORE_MODULE, "sceApplicationInitialize\0")?;

        let name = c_string(COMPOSITE_EXT_MODULE)?;
        let ret = unsafe { load(name.as_ptr(), 0, 0, 0, 0) };
        debug!("sceSysmoduleLoadModuleByNameInternal = 0x{:08X}", ret);
        unsafe { init(name.as_ptr()) };
        Ok(())
    }

    fn init_with_process_order(
        &self,
        system_shared: u64,
        video_shared: u64,
        video_private: u64,
        process_order: u64,
    ) -> Result<u32> {
        // only loadable once load_extension ran
        let lib = open(COMPOSITE_EXT_LIBRARY)?;
        let init: CompositorInitFn = symbol(
            &lib,
            COMPOSITE_EXT_LIBRARY,
            "sceCompositorInitWithProcessOrder\0",
        )?;
        Ok(unsafe { init(system_shared, video_shared, video_private, process_order) })
    }
}

/// Piglet configuration entry point
///
/// Resolved on use: Piglet is only mapped once the module loader started it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysPiglet;

impl PigletRuntime for SysPiglet {
    fn set_configuration(&self, config: &PglConfig) -> Result<bool> {
        let lib = open(PIGLET_MODULE)?;
        let set: SetConfigurationFn =
            symbol(&lib, PIGLET_MODULE, "scePigletSetConfigurationVSH\0")?;
        Ok(unsafe { set(config) })
    }
}
