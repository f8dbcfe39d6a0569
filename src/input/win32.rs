use anyhow::{Result, anyhow};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;

use super::injector::InputInjector;

/// Gap between synthetic key events so slow message pumps keep up
const KEY_GAP: Duration = Duration::from_millis(20);

/// Keystroke injector backed by enigo's SendInput path
pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("Failed to initialize input injector: {}", e))?;
        log::debug!("EnigoInjector initialized");
        Ok(EnigoInjector { enigo })
    }

    fn ctrl_chord(&mut self, ch: char) -> Result<()> {
        self.enigo
            .key(Key::Control, Direction::Press)
            .map_err(|e| anyhow!("Key press failed: {}", e))?;
        thread::sleep(KEY_GAP);
        self.enigo
            .key(Key::Unicode(ch), Direction::Click)
            .map_err(|e| anyhow!("Key click failed: {}", e))?;
        thread::sleep(KEY_GAP);
        self.enigo
            .key(Key::Control, Direction::Release)
            .map_err(|e| anyhow!("Key release failed: {}", e))?;
        Ok(())
    }
}

impl InputInjector for EnigoInjector {
    fn send_copy(&mut self) -> Result<()> {
        log::debug!("Injecting Ctrl+C");
        self.ctrl_chord('c')
    }

    fn send_select_all(&mut self) -> Result<()> {
        log::debug!("Injecting Ctrl+A");
        self.ctrl_chord('a')
    }

    fn send_paste(&mut self) -> Result<()> {
        log::debug!("Injecting Ctrl+V");
        self.ctrl_chord('v')
    }

    fn send_submit(&mut self) -> Result<()> {
        log::debug!("Injecting Enter");
        self.enigo
            .key(Key::Return, Direction::Click)
            .map_err(|e| anyhow!("Key click failed: {}", e))
    }
}
