use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, MOD_WIN, RegisterHotKey,
    UnregisterHotKey,
};
use windows::Win32::UI::WindowsAndMessaging::{MSG, PM_REMOVE, PeekMessageW, WM_HOTKEY};

use super::binding::HotkeyBinding;
use super::dispatcher::{HotkeyBackend, HotkeyId};

/// How long to wait for the pump thread to acknowledge a registration
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);
/// Pump poll spacing while no messages are queued
const PUMP_IDLE: Duration = Duration::from_millis(10);

enum PumpCommand {
    Register {
        id: HotkeyId,
        modifiers: HOT_KEY_MODIFIERS,
        vk: u32,
        reply: Sender<Result<(), String>>,
    },
    Unregister {
        id: HotkeyId,
    },
}

/// Hotkey backend that owns a message-pump thread
/// RegisterHotKey binds a hotkey to the calling thread, so registration and
/// the WM_HOTKEY pump must share one thread; commands cross over a channel
pub struct PumpBackend {
    commands: Sender<PumpCommand>,
}

impl PumpBackend {
    /// Spawn the pump thread; pressed hotkey ids are delivered on `events`
    pub fn spawn(events: Sender<HotkeyId>) -> Result<PumpBackend> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        thread::Builder::new()
            .name("hotkey-pump".to_string())
            .spawn(move || pump(cmd_rx, events))
            .context("Failed to spawn hotkey pump thread")?;
        Ok(PumpBackend { commands: cmd_tx })
    }
}

impl HotkeyBackend for PumpBackend {
    fn register(&mut self, id: HotkeyId, binding: &HotkeyBinding) -> Result<()> {
        let vk = binding
            .vk_code()
            .ok_or_else(|| anyhow!("Unknown key name: {}", binding.key))?;
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(PumpCommand::Register {
                id,
                modifiers: modifier_flags(binding),
                vk,
                reply: reply_tx,
            })
            .map_err(|_| anyhow!("Hotkey pump thread is gone"))?;

        match reply_rx.recv_timeout(REPLY_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(anyhow!(e)),
            Err(_) => Err(anyhow!(
                "Hotkey pump did not answer within {:?}",
                REPLY_TIMEOUT
            )),
        }
    }

    fn unregister(&mut self, id: HotkeyId) {
        let _ = self.commands.send(PumpCommand::Unregister { id });
    }
}

fn modifier_flags(binding: &HotkeyBinding) -> HOT_KEY_MODIFIERS {
    let mut mods = MOD_NOREPEAT;
    if binding.ctrl {
        mods |= MOD_CONTROL;
    }
    if binding.alt {
        mods |= MOD_ALT;
    }
    if binding.shift {
        mods |= MOD_SHIFT;
    }
    if binding.meta {
        mods |= MOD_WIN;
    }
    mods
}

fn pump(commands: Receiver<PumpCommand>, events: Sender<HotkeyId>) {
    log::debug!("Hotkey pump thread started");
    loop {
        loop {
            match commands.try_recv() {
                Ok(PumpCommand::Register {
                    id,
                    modifiers,
                    vk,
                    reply,
                }) => {
                    let result = unsafe { RegisterHotKey(None, id as i32, modifiers, vk) }
                        .map_err(|e| e.to_string());
                    let _ = reply.send(result);
                }
                Ok(PumpCommand::Unregister { id }) => unsafe {
                    let _ = UnregisterHotKey(None, id as i32);
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("Hotkey pump thread exiting");
                    return;
                }
            }
        }

        let mut msg = MSG::default();
        while unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE) }.as_bool() {
            if msg.message == WM_HOTKEY && events.send(msg.wParam.0 as HotkeyId).is_err() {
                log::debug!("Hotkey event channel closed, pump exiting");
                return;
            }
        }

        thread::sleep(PUMP_IDLE);
    }
}
