pub mod binding;
pub mod dispatcher;
#[cfg(windows)]
pub mod win32;

use anyhow::Result;

pub use binding::HotkeyBinding;
pub use dispatcher::{HotkeyBackend, HotkeyDispatcher, HotkeyId};

/// Create a dispatcher wired to the platform hotkey source
#[cfg(windows)]
pub fn create_dispatcher() -> Result<HotkeyDispatcher> {
    let (event_tx, event_rx) = std::sync::mpsc::channel();
    let backend = win32::PumpBackend::spawn(event_tx)?;
    log::info!("Hotkey pump thread running");
    Ok(HotkeyDispatcher::new(Box::new(backend), event_rx))
}

#[cfg(not(windows))]
pub fn create_dispatcher() -> Result<HotkeyDispatcher> {
    Err(anyhow::anyhow!(
        "No supported hotkey source on this platform (Windows only)"
    ))
}
