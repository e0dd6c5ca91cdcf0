//! Piglet runtime configuration
//!
//! `PglConfig` mirrors the record scePigletSetConfigurationVSH reads. Field
//! offsets are fixed by the runtime; unnamed fields stay zero.

use bitflags::bitflags;
use log::info;

use crate::config::MemoryBudget;
use crate::constants::{DRAW_COMMAND_BUFFER_SIZE, LCUE_RESOURCE_BUFFER_SIZE, PROCESS_ORDER};
use crate::error::{Error, Result};

bitflags! {
    /// PglConfig::flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PglFlags: u32 {
        const USE_FLEXIBLE_MEMORY = 0x04;
        const USE_COMPOSITE_EXT = 0x10;
        const UNK_20 = 0x20;
        const UNK_40 = 0x40;
    }
}

/// Runtime configuration record (0x80 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PglConfig {
    pub size: u32,
    pub flags: u32,
    pub process_order: u8,
    pub unk_0x0c: u32,
    pub unk_0x10: u32,
    pub unk_0x14: u32,
    pub system_shared_memory_size: u64,
    pub unk_0x20: u32,
    pub unk_0x24: u32,
    pub video_shared_memory_size: u64,
    pub max_mapped_flexible_memory: u64,
    pub min_flexible_memory_chunk_size: u64,
    pub dbg_pos_cmd_0x40: u32,
    pub dbg_pos_cmd_0x44: u32,
    pub dbg_pos_cmd_0x48: u32,
    pub dbg_pos_cmd_0x4c: u32,
    pub dbg_pos_cmd_0x50: u8,
    pub draw_command_buffer_size: u32,
    pub lcue_resource_buffer_size: u32,
    pub unk_0x5c: u32,
    pub unk_0x60: u64,
    pub unk_0x68: u64,
    pub unk_0x70: u64,
    pub unk_0x78: u64,
}

impl PglConfig {
    /// Configuration for a `width` x `height` display with `budget`
    pub fn new(width: u32, height: u32, budget: &MemoryBudget) -> Self {
        Self {
            size: std::mem::size_of::<Self>() as u32,
            flags: (PglFlags::USE_COMPOSITE_EXT
                | PglFlags::USE_FLEXIBLE_MEMORY
                | PglFlags::UNK_20
                | PglFlags::UNK_40)
                .bits(),
            process_order: PROCESS_ORDER as u8,
            system_shared_memory_size: budget.system_shared,
            video_shared_memory_size: budget.video_shared,
            max_mapped_flexible_memory: budget.flexible,
            draw_command_buffer_size: DRAW_COMMAND_BUFFER_SIZE,
            lcue_resource_buffer_size: LCUE_RESOURCE_BUFFER_SIZE,
            dbg_pos_cmd_0x40: width,
            dbg_pos_cmd_0x44: height,
            dbg_pos_cmd_0x48: 0,
            dbg_pos_cmd_0x4c: 0,
            unk_0x5c: 2,
            ..Self::default()
        }
    }
}

/// Window descriptor used as the EGL native window
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PglWindow {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

impl PglWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: 0,
            width,
            height,
        }
    }
}

/// Piglet entry points needed before EGL
pub trait PigletRuntime {
    /// scePigletSetConfigurationVSH; false when the runtime rejects it
    fn set_configuration(&self, config: &PglConfig) -> Result<bool>;
}

/// Hand `config` to the runtime
pub fn apply_configuration(piglet: &dyn PigletRuntime, config: &PglConfig) -> Result<()> {
    if !piglet.set_configuration(config)? {
        return Err(Error::Configuration);
    }
    info!(
        "Piglet configured: {}x{}, flags 0x{:X}",
        config.dbg_pos_cmd_0x40, config.dbg_pos_cmd_0x44, config.flags
    );
    Ok(())
}
