pub mod guard;
pub mod lookup;
#[cfg(windows)]
pub mod win32;

use anyhow::Result;

pub use guard::{ForegroundGuard, GuardDecision};
pub use lookup::{ForegroundInfo, ForegroundLookup};

/// Create the platform foreground lookup
#[cfg(windows)]
pub fn create_lookup() -> Result<Box<dyn ForegroundLookup>> {
    Ok(Box::new(win32::Win32Lookup))
}

#[cfg(not(windows))]
pub fn create_lookup() -> Result<Box<dyn ForegroundLookup>> {
    Err(anyhow::anyhow!(
        "No supported foreground lookup on this platform (Windows only)"
    ))
}
