//! Error type for display setup
//!
//! Every fatal condition raised while bringing up a display ends up here.
//! Degraded paths (missing shader compiler, unpatchable runtime) are logged
//! instead and never surface as errors.

use khronos_egl as egl;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A native library could not be opened
    #[error("failed to load {name}: {reason}")]
    Library { name: String, reason: String },

    /// A native library is missing an entry point
    #[error("{library} does not export {symbol}")]
    Symbol {
        library: &'static str,
        symbol: &'static str,
    },

    /// eglGetDisplay returned EGL_NO_DISPLAY
    #[error("no EGL display for the native display")]
    NoDisplay,

    /// An EGL call reported failure
    #[error("{call} failed: {source}")]
    Egl {
        call: &'static str,
        #[source]
        source: egl::Error,
    },

    /// eglChooseConfig matched nothing
    #[error("no EGL config matches the requested attributes")]
    NoConfig,

    /// Module loader returned a handle with the error bit set
    #[error("LoadStartModule({module}) result 0x{code:08X}")]
    ModuleNotFound { module: &'static str, code: u32 },

    /// Video shared + private memory is above the platform ceiling
    #[error(
        "video shared + private memory ({requested} bytes) exceeds the {limit} byte limit"
    )]
    OutOfResources { requested: u64, limit: u64 },

    /// Compositor initialization returned an unexpected code
    #[error("failed to initialize the compositor: 0x{0:08X}")]
    Compositor(u32),

    /// Piglet rejected the configuration record
    #[error("Piglet rejected the runtime configuration")]
    Configuration,

    #[error("invalid display size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// Changing page protection failed
    #[error("mprotect(0x{addr:X}, {len}) failed: 0x{code:08X}")]
    Protect { addr: usize, len: usize, code: u32 },
}

impl Error {
    /// Wrap an EGL error with the name of the failing call
    pub(crate) fn egl(call: &'static str) -> impl FnOnce(egl::Error) -> Self {
        move |source| Self::Egl { call, source }
    }
}
