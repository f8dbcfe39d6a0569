pub mod backend;
#[cfg(windows)]
pub mod win32;

use anyhow::Result;

pub use backend::SystemClipboard;

/// Create the platform clipboard
/// Only the Win32 clipboard exposes a sequence counter the transaction can
/// fence on, so other platforms are rejected at startup
#[cfg(windows)]
pub fn create_clipboard() -> Result<Box<dyn SystemClipboard>> {
    let backend = win32::Win32Clipboard::new()?;
    log::info!("Using {} clipboard backend", backend.name());
    Ok(Box::new(backend))
}

#[cfg(not(windows))]
pub fn create_clipboard() -> Result<Box<dyn SystemClipboard>> {
    Err(anyhow::anyhow!(
        "No supported clipboard on this platform (Windows only)"
    ))
}
