use anyhow::{Context, Result};
use notify::{RecommendedWatcher, Watcher};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{Config, ConfigStorage};
use crate::error::PipelineError;
use crate::focus::ForegroundGuard;
use crate::hotkey::{HotkeyBinding, HotkeyDispatcher, HotkeyId};
use crate::logging::NoticeMessage;
use crate::pipeline::{ClipboardTransaction, Outcome, ReentrancyGate, Timings};
use crate::render::TextRenderer;

/// Registration id of the paste-as-image hotkey
pub const ACTION_HOTKEY_ID: HotkeyId = 1;
/// Registration id of the enable/disable toggle
pub const TOGGLE_HOTKEY_ID: HotkeyId = 2;

/// Event loop spacing; the transaction spaces its own clipboard polling
/// by the configured poll interval on top of this
const LOOP_TICK: Duration = Duration::from_millis(10);

/// How long notices stay queued for display
const NOTICE_TTL_MS: u128 = 5000;

/// Main application state
pub struct App {
    /// Application configuration
    pub config: Config,

    /// Configuration storage, used again on hot-reload
    storage: Box<dyn ConfigStorage>,

    /// Hotkey registrations and pressed events
    dispatcher: HotkeyDispatcher,

    /// Allow-list check over the foreground window
    guard: ForegroundGuard,

    /// Single-flight gate, held for exactly one transaction at a time
    gate: ReentrancyGate,

    /// The paste-as-image state machine
    transaction: ClipboardTransaction,

    /// Whether the action hotkey currently does anything
    enabled: bool,

    /// Receiver for notice messages from the logger
    notice_rx: Option<Receiver<NoticeMessage>>,

    /// Notices queued for display
    pub notices: Vec<NoticeMessage>,

    /// File watcher for config hot-reload
    /// Kept alive to maintain the watch
    _config_watcher: Option<RecommendedWatcher>,

    /// Channel for receiving config file change notifications
    config_watch_rx: Option<Receiver<notify::Result<notify::Event>>>,
}

impl App {
    /// Create a new App instance around already-constructed components
    pub fn new(
        config: Config,
        storage: Box<dyn ConfigStorage>,
        dispatcher: HotkeyDispatcher,
        guard: ForegroundGuard,
        transaction: ClipboardTransaction,
        notice_rx: Option<Receiver<NoticeMessage>>,
    ) -> Result<Self> {
        // Watch the config directory instead of the file itself
        // This handles editors that do atomic writes (create temp, rename)
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.send(res);
        })
        .context("Failed to create config file watcher")?;

        let (config_watcher, config_watch_rx) = match storage.path().parent() {
            Some(parent_dir) => {
                use notify::RecursiveMode;
                if let Err(e) = watcher.watch(parent_dir, RecursiveMode::NonRecursive) {
                    log::warn!("Failed to watch config directory {:?}: {}", parent_dir, e);
                    (None, None)
                } else {
                    log::info!("Watching config directory: {:?}", parent_dir);
                    (Some(watcher), Some(rx))
                }
            }
            None => (None, None),
        };

        let enabled = config.enabled;
        Ok(App {
            config,
            storage,
            dispatcher,
            guard,
            gate: ReentrancyGate::new(),
            transaction,
            enabled,
            notice_rx,
            notices: Vec::new(),
            _config_watcher: config_watcher,
            config_watch_rx,
        })
    }

    /// Register both hotkeys from the current configuration
    /// A conflict on either is reported as a notice; the agent keeps
    /// running with whatever did register
    pub fn register_hotkeys(&mut self) {
        let action = HotkeyBinding::from(&self.config.action_hotkey);
        if let Err(e) = self.dispatcher.register(ACTION_HOTKEY_ID, action) {
            log::warn!("{}", e);
        }
        let toggle = HotkeyBinding::from(&self.config.toggle_hotkey);
        if let Err(e) = self.dispatcher.register(TOGGLE_HOTKEY_ID, toggle) {
            log::warn!("{}", e);
        }
    }

    /// React to a pressed hotkey
    pub fn handle_hotkey(&mut self, id: HotkeyId, now: Instant) {
        match id {
            ACTION_HOTKEY_ID => self.handle_action(now),
            TOGGLE_HOTKEY_ID => self.toggle_enabled(),
            other => log::debug!("Ignoring unknown hotkey id {}", other),
        }
    }

    fn handle_action(&mut self, now: Instant) {
        if !self.enabled {
            log::warn!("Paste-as-image is disabled (press the toggle hotkey to enable)");
            return;
        }
        // Gate first: while a transaction is in flight the trigger is
        // dropped without a single OS call
        if !self.gate.try_acquire(now) {
            log::info!("Trigger dropped: a transaction is already in flight");
            return;
        }
        let decision = self.guard.check();
        if !decision.allowed {
            log::warn!("{}", PipelineError::GuardDenied(decision.detail));
            self.gate.release();
            return;
        }
        if !self.transaction.trigger(now) {
            // The gate only opens once the machine is idle again
            log::error!("Transaction refused trigger while the gate was free");
            self.gate.release();
        }
    }

    fn toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
        if self.enabled {
            log::warn!("Paste-as-image enabled");
        } else {
            log::warn!("Paste-as-image disabled");
        }
    }

    /// Drive the transaction forward and release the gate when it closes
    pub fn advance(&mut self, now: Instant) {
        if let Some(outcome) = self.transaction.tick(now) {
            self.gate.release();
            match outcome {
                Outcome::Delivered => log::debug!("Transaction finished"),
                // The failure was already reported where it arose
                Outcome::Failed(e) => log::debug!("Transaction closed: {}", e),
            }
        }
    }

    /// Check for config file changes and hot-reload
    /// Non-blocking check using try_recv(), called from the event loop
    pub fn check_config_reload(&mut self) {
        let Some(rx) = &self.config_watch_rx else {
            return;
        };

        // Drain all pending events (multiple events can queue up)
        let mut has_changes = false;
        while let Ok(result) = rx.try_recv() {
            match result {
                Ok(event) => {
                    let is_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == self.storage.path().file_name());
                    if is_config
                        && matches!(
                            event.kind,
                            notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                        )
                    {
                        log::debug!("Config file changed: {:?}", event.paths);
                        has_changes = true;
                    }
                }
                Err(e) => {
                    log::warn!("Config watcher error: {}", e);
                }
            }
        }

        if has_changes {
            log::info!("Config file changed, reloading");
            self.reload_config();
        }
    }

    /// Reload configuration from disk
    /// Atomic swap: load, validate, apply only if parsing succeeded; a
    /// broken file keeps the running settings
    fn reload_config(&mut self) {
        match self.storage.load() {
            Ok(new_config) => {
                self.config = new_config;
                self.enabled = self.config.enabled;
                self.guard.set_allow_processes(&self.config.allow_processes);
                self.transaction.reconfigure(
                    Timings::from_config(&self.config.timings, self.config.send_delay_ms),
                    TextRenderer::new(&self.config.render),
                    self.config.render.max_width,
                );
                self.register_hotkeys();
                log::info!("Configuration reloaded");
            }
            Err(e) => {
                log::error!("Failed to reload config, keeping previous settings: {:#}", e);
            }
        }
    }

    /// Poll the notice receiver and queue messages for display
    pub fn pump_notices(&mut self) {
        if let Some(rx) = &self.notice_rx {
            while let Ok(msg) = rx.try_recv() {
                eprintln!("[shotput] {}: {}", msg.level, msg.message);
                self.notices.push(msg);
            }
        }
    }

    /// Remove expired notices
    pub fn prune_notices(&mut self) {
        if self.notices.is_empty() {
            return;
        }

        let now = Instant::now();
        self.notices
            .retain(|msg| now.duration_since(msg.timestamp).as_millis() < NOTICE_TTL_MS);
    }

    /// Run the cooperative event loop: drain pressed hotkeys, advance the
    /// transaction, pick up config changes, and surface notices
    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Agent running; action hotkey {}, toggle hotkey {}",
            HotkeyBinding::from(&self.config.action_hotkey),
            HotkeyBinding::from(&self.config.toggle_hotkey)
        );

        loop {
            let now = Instant::now();

            while let Some(id) = self.dispatcher.try_next() {
                self.handle_hotkey(id, now);
            }

            self.advance(now);
            self.check_config_reload();
            self.pump_notices();
            self.prune_notices();

            thread::sleep(LOOP_TICK);
        }
    }
}
