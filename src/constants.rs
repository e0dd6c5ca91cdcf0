//! Global constants for eglboot
//!
//! Consolidates memory sizes, vendor module names and result codes
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Size Units
// ============================================================================

pub const KB: u64 = 1024;
pub const MB: u64 = KB * 1024;
pub const GB: u64 = MB * 1024;

// ============================================================================
// Vendor Modules
// ============================================================================

/// Piglet: the EGL/GLES runtime on Orbis
pub const PIGLET_MODULE: &str = "libScePigletv2VSH.sprx";

/// Runtime shader compiler loaded next to Piglet
pub const SHADER_COMPILER_MODULE: &str = "libSceShaccVSH.sprx";

/// Compositor extension system module
pub const COMPOSITE_EXT_MODULE: &str = "libSceCompositeExt";

/// Kernel library exporting the module loader and mprotect
pub const KERNEL_MODULE: &str = "libkernel.sprx";

/// System module loader
pub const SYSMODULE_MODULE: &str = "libSceSysmodule.sprx";

/// System core (application initialization)
pub const SYSCORE_MODULE: &str = "libSceSysCore.sprx";

/// Compositor extension library
pub const COMPOSITE_EXT_LIBRARY: &str = "libSceCompositeExt.sprx";

/// Desktop EGL library candidates, tried in order
pub const DESKTOP_EGL_LIBRARIES: &[&str] = &["libEGL.so.1", "libEGL.so", "libEGL.dll"];

// ============================================================================
// Module Loader
// ============================================================================

/// Bit set in a module handle when loading failed
pub const MODULE_ERROR_BIT: u32 = 0x8000_0000;

// ============================================================================
// Compositor
// ============================================================================

/// sceCompositorInitWithProcessOrder result when another caller got there first
pub const COMPOSITOR_ALREADY_INITIALIZED: u32 = 0x80D4_0003;

/// Process order passed to the compositor and to Piglet
pub const PROCESS_ORDER: u32 = 1;

/// Upper bound for video shared + video private memory
pub const MAX_VIDEO_SHARED_MEMORY: u64 = 512 * MB;

// ============================================================================
// Piglet Configuration
// ============================================================================

/// Draw command buffer handed to Piglet
pub const DRAW_COMMAND_BUFFER_SIZE: u32 = 3 * MB as u32;

/// LCUE resource buffer handed to Piglet
pub const LCUE_RESOURCE_BUFFER_SIZE: u32 = 3 * MB as u32;

// ============================================================================
// EGL Extensions
// ============================================================================

/// EGL_NV_post_sub_buffer surface attribute
pub const EGL_POST_SUB_BUFFER_SUPPORTED_NV: i32 = 0x30BE;
