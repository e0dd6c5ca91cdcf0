//! Compositor memory budget
//!
//! The compositor splits video memory between processes. Asking for a
//! private budget means initializing it ourselves, unless someone else in
//! the process already did.

use log::{info, warn};

use crate::config::MemoryBudget;
use crate::constants::{COMPOSITOR_ALREADY_INITIALIZED, MAX_VIDEO_SHARED_MEMORY, PROCESS_ORDER};
use crate::error::{Error, Result};

/// Compositor service
pub trait Compositor {
    /// Load the compositor extension module and run its application init
    fn load_extension(&self) -> Result<()>;

    /// sceCompositorInitWithProcessOrder; returns the raw result code
    fn init_with_process_order(
        &self,
        system_shared: u64,
        video_shared: u64,
        video_private: u64,
        process_order: u64,
    ) -> Result<u32>;
}

/// Reserve the compositor memory described by `budget`
///
/// The video ceiling is checked before the compositor is touched.
pub fn configure_memory(compositor: &dyn Compositor, budget: &MemoryBudget) -> Result<()> {
    let requested = budget
        .video_shared
        .checked_add(budget.video_private)
        .unwrap_or(u64::MAX);
    if requested > MAX_VIDEO_SHARED_MEMORY {
        return Err(Error::OutOfResources {
            requested,
            limit: MAX_VIDEO_SHARED_MEMORY,
        });
    }

    compositor.load_extension()?;

    let code = compositor.init_with_process_order(
        budget.system_shared,
        budget.video_shared,
        budget.video_private,
        u64::from(PROCESS_ORDER),
    )?;

    match code {
        0 => {
            info!(
                "Compositor initialized: system {} / video shared {} / video private {}",
                budget.system_shared, budget.video_shared, budget.video_private
            );
            Ok(())
        }
        COMPOSITOR_ALREADY_INITIALIZED => {
            warn!("Compositor already initialized, keeping existing budget");
            Ok(())
        }
        code => Err(Error::Compositor(code)),
    }
}
