//! eglboot - EGL display bootstrap
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             DisplayContext               │
//! ├──────────────────────────────────────────┤
//! │  Platform::prepare                       │
//! │    desktop: native display of window     │
//! │    orbis:   Piglet load → compositor     │
//! │             → config → compiler patch    │
//! │                    ↓                     │
//! │  EGL: display → init → config            │
//! │       → surface → context → current      │
//! └──────────────────────────────────────────┘
//! ```

pub mod config;
pub mod constants;
pub mod display;
pub mod egl;
pub mod error;
pub mod platform;

pub use config::{DisplaySettings, MemoryBudget, PlatformKind};
pub use display::DisplayContext;
pub use egl::{DynamicEgl, Egl};
pub use error::{Error, Result};
pub use platform::{Capabilities, Platform};

use constants::{DESKTOP_EGL_LIBRARIES, PIGLET_MODULE};
use platform::orbis::kernel::{Privilege, StaticPrivilege};
use platform::{DefaultWindowSystem, DesktopPlatform, OrbisPlatform, OrbisServices};

/// Open a display with the system EGL and the platform named in `settings`
///
/// `elevated` is only consulted on Orbis and states whether the process was
/// launched with elevated privileges. No elevation is attempted beyond that;
/// use `open_with_privilege` to supply a backend that can elevate.
pub fn open(settings: &DisplaySettings, elevated: bool) -> Result<DisplayContext<DynamicEgl>> {
    open_with_privilege(settings, Box::new(StaticPrivilege { elevated }))
}

/// Like `open`, with the privilege backend the Orbis shader compiler patch
/// elevates through
pub fn open_with_privilege(
    settings: &DisplaySettings,
    privilege: Box<dyn Privilege>,
) -> Result<DisplayContext<DynamicEgl>> {
    match settings.platform {
        PlatformKind::Desktop => {
            let egl = DynamicEgl::load(DESKTOP_EGL_LIBRARIES)?;
            let platform = DesktopPlatform::new(DefaultWindowSystem);
            DisplayContext::new(egl, Box::new(platform), settings)
        }
        PlatformKind::Orbis => {
            let platform = OrbisPlatform::new(OrbisServices::system(privilege)?);
            // Piglet exports EGL once the platform has loaded it
            DisplayContext::with_loader(Box::new(platform), settings, || {
                DynamicEgl::load(&[PIGLET_MODULE])
            })
        }
    }
}
