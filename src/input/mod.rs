pub mod injector;
#[cfg(windows)]
pub mod win32;

use anyhow::Result;

pub use injector::InputInjector;

/// Create the platform keystroke injector
#[cfg(windows)]
pub fn create_injector() -> Result<Box<dyn InputInjector>> {
    let injector = win32::EnigoInjector::new()?;
    log::info!("Using enigo input injector");
    Ok(Box::new(injector))
}

#[cfg(not(windows))]
pub fn create_injector() -> Result<Box<dyn InputInjector>> {
    Err(anyhow::anyhow!(
        "No supported input injector on this platform (Windows only)"
    ))
}
