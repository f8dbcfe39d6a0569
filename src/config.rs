use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Main configuration structure, stored as camelCase JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Hotkey that starts a paste-as-image transaction
    #[serde(default = "default_action_hotkey")]
    pub action_hotkey: HotkeyConfig,

    /// Hotkey that toggles the agent on and off
    #[serde(default = "default_toggle_hotkey")]
    pub toggle_hotkey: HotkeyConfig,

    /// Delay between pasting the image and pressing Enter
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Whether the action hotkey is active at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Executable names the foreground window may belong to
    #[serde(default = "default_allow_processes")]
    pub allow_processes: Vec<String>,

    #[serde(default)]
    pub timings: TimingsConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            action_hotkey: default_action_hotkey(),
            toggle_hotkey: default_toggle_hotkey(),
            send_delay_ms: default_send_delay_ms(),
            enabled: default_enabled(),
            allow_processes: default_allow_processes(),
            timings: TimingsConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// A key combination: modifier flags plus a named key ("V", "F2", "SPACE", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyConfig {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

/// Retry windows and timer durations for the clipboard transaction.
///
/// These are empirically tuned against the target client's timing; they are
/// configuration rather than code so they can be adjusted without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingsConfig {
    /// How long to wait for the clipboard sequence to change after copy
    #[serde(default = "default_copy_fast_ms")]
    pub copy_fast_ms: u64,

    /// Additional window after the select-all fallback copy
    #[serde(default = "default_copy_fallback_ms")]
    pub copy_fallback_ms: u64,

    /// Escalating windows for reading text off the clipboard
    #[serde(default = "default_read_tier_ms")]
    pub read_tier_ms: Vec<u64>,

    /// Escalating windows for writing the image to the clipboard
    #[serde(default = "default_write_tier_ms")]
    pub write_tier_ms: Vec<u64>,

    /// Poll spacing inside every window above
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after submit before the next transaction may start
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        TimingsConfig {
            copy_fast_ms: default_copy_fast_ms(),
            copy_fallback_ms: default_copy_fallback_ms(),
            read_tier_ms: default_read_tier_ms(),
            write_tier_ms: default_write_tier_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Text rasterization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Maximum image width in pixels
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Glyph height in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Outline font to try first
    #[serde(default = "default_preferred_font")]
    pub preferred_font: PathBuf,

    /// Outline font to try when the preferred one is missing
    #[serde(default = "default_fallback_font")]
    pub fallback_font: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_width: default_max_width(),
            font_size: default_font_size(),
            preferred_font: default_preferred_font(),
            fallback_font: default_fallback_font(),
        }
    }
}

/// Log thresholds for the file sink and the notice channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_file_level")]
    pub file_level: String,

    #[serde(default = "default_notice_level")]
    pub notice_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file_level: default_file_level(),
            notice_level: default_notice_level(),
        }
    }
}

// Default value functions for serde
fn default_action_hotkey() -> HotkeyConfig {
    HotkeyConfig {
        key: "V".to_string(),
        ctrl: true,
        alt: true,
        shift: false,
        meta: false,
    }
}

fn default_toggle_hotkey() -> HotkeyConfig {
    HotkeyConfig {
        key: "T".to_string(),
        ctrl: true,
        alt: true,
        shift: false,
        meta: false,
    }
}

fn default_send_delay_ms() -> u64 {
    3000
}

fn default_enabled() -> bool {
    true
}

fn default_allow_processes() -> Vec<String> {
    vec!["wechat.exe".to_string(), "weixin.exe".to_string()]
}

fn default_copy_fast_ms() -> u64 {
    500
}

fn default_copy_fallback_ms() -> u64 {
    800
}

fn default_read_tier_ms() -> Vec<u64> {
    vec![300, 700, 1200]
}

fn default_write_tier_ms() -> Vec<u64> {
    vec![400, 900, 1500]
}

fn default_poll_interval_ms() -> u64 {
    30
}

fn default_settle_ms() -> u64 {
    500
}

fn default_max_width() -> u32 {
    1000
}

fn default_font_size() -> f32 {
    28.0
}

fn default_preferred_font() -> PathBuf {
    PathBuf::from("C:\\Windows\\Fonts\\msyh.ttc")
}

fn default_fallback_font() -> PathBuf {
    PathBuf::from("C:\\Windows\\Fonts\\segoeui.ttf")
}

fn default_file_level() -> String {
    "info".to_string()
}

fn default_notice_level() -> String {
    "warn".to_string()
}

/// Where the configuration file lives and how it is (re)read.
///
/// The agent only ever writes the file once, to seed a default on first
/// run; after that the user (or an external editor) owns it and the agent
/// re-reads on change.
pub trait ConfigStorage: Send + Sync {
    fn load(&self) -> Result<Config>;

    fn save(&self, config: &Config) -> Result<()>;

    /// Path of the backing file, for the reload watcher
    fn path(&self) -> &PathBuf;

    /// Write a default file so the user has something to edit
    fn create_default(&self) -> Result<()>;
}

/// Configuration held in a single JSON file
pub struct JsonConfigStorage {
    path: PathBuf,
}

impl JsonConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        JsonConfigStorage { path }
    }
}

impl ConfigStorage for JsonConfigStorage {
    fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            log::info!("No config at {:?}, seeding defaults", self.path);
            self.create_default()?;
            return Ok(Config::default());
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config file {:?}", self.path))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Config file {:?} is not valid", self.path))?;

        log::info!(
            "Configuration loaded: action hotkey {:?}, sendDelayMs {}, {} allowed processes",
            config.action_hotkey.key,
            config.send_delay_ms,
            config.allow_processes.len()
        );
        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create config directory {:?}", dir))?;
        }
        let json = serde_json::to_string_pretty(config).context("Config serialization failed")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config file {:?}", self.path))
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        self.save(&Config::default())?;
        log::info!("Wrote default configuration to {:?}", self.path);
        Ok(())
    }
}

/// Resolve and create the data (logs) and config directories.
///
/// XDG layout, falling back to USERPROFILE when HOME is absent (the usual
/// case on Windows): data under ~/.local/share/shotput, config under
/// ~/.config/shotput, each overridable through its XDG_* variable.
pub fn ensure_directories() -> Result<(PathBuf, PathBuf)> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("Neither HOME nor USERPROFILE is set")?;

    let resolve = |xdg_var: &str, home_relative: &str| -> PathBuf {
        match env::var(xdg_var) {
            Ok(base) => PathBuf::from(base).join("shotput"),
            Err(_) => PathBuf::from(&home).join(home_relative).join("shotput"),
        }
    };

    let data_dir = resolve("XDG_DATA_HOME", ".local/share");
    let config_dir = resolve("XDG_CONFIG_HOME", ".config");
    for dir in [&data_dir, &config_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create directory {:?}", dir))?;
    }

    Ok((data_dir, config_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.send_delay_ms, 3000);
        assert!(config.enabled);
        assert_eq!(config.action_hotkey.key, "V");
        assert!(config.action_hotkey.ctrl && config.action_hotkey.alt);
        assert_eq!(config.timings.read_tier_ms, vec![300, 700, 1200]);
        assert_eq!(config.timings.write_tier_ms, vec![400, 900, 1500]);
        assert_eq!(config.timings.settle_ms, 500);
        assert_eq!(config.render.max_width, 1000);
        assert_eq!(config.allow_processes.len(), 2);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{ "sendDelayMs": 0, "enabled": false }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.send_delay_ms, 0);
        assert!(!config.enabled);
        // Everything else comes from the default functions
        assert_eq!(config.action_hotkey.key, "V");
        assert_eq!(config.timings.copy_fast_ms, 500);
        assert_eq!(config.logging.notice_level, "warn");
    }

    #[test]
    fn test_camel_case_field_names() {
        let json = r#"{
            "actionHotkey": { "key": "F2", "ctrl": true },
            "toggleHotkey": { "key": "F3", "alt": true },
            "allowProcesses": ["telegram.exe"],
            "timings": { "copyFastMs": 250, "readTierMs": [100, 200] }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.action_hotkey.key, "F2");
        assert!(config.action_hotkey.ctrl);
        assert!(!config.action_hotkey.shift);
        assert!(config.toggle_hotkey.alt);
        assert_eq!(config.allow_processes, vec!["telegram.exe"]);
        assert_eq!(config.timings.copy_fast_ms, 250);
        assert_eq!(config.timings.read_tier_ms, vec![100, 200]);
        // Omitted timing fields still default
        assert_eq!(config.timings.write_tier_ms, vec![400, 900, 1500]);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let mut config = Config::default();
        config.send_delay_ms = 1500;
        config.allow_processes = vec!["slack.exe".to_string()];

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("sendDelayMs"));
        assert!(json.contains("allowProcesses"));

        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.send_delay_ms, 1500);
        assert_eq!(back.allow_processes, vec!["slack.exe"]);
    }
}
