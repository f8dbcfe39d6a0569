use std::fmt;

use crate::config::HotkeyConfig;

/// A key combination resolvable to an OS registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// Key name, normalized to uppercase ("V", "F2", "SPACE")
    pub key: String,
}

impl From<&HotkeyConfig> for HotkeyBinding {
    fn from(config: &HotkeyConfig) -> Self {
        HotkeyBinding {
            ctrl: config.ctrl,
            alt: config.alt,
            shift: config.shift,
            meta: config.meta,
            key: config.key.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.meta {
            write!(f, "Win+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl HotkeyBinding {
    /// Win32 virtual-key code for the named key, or None when the name is
    /// not recognized
    pub fn vk_code(&self) -> Option<u32> {
        let key = self.key.as_str();

        // Letters and digits map directly to their ASCII codes
        if key.len() == 1 {
            let ch = key.chars().next()?;
            if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
                return Some(ch as u32);
            }
            return None;
        }

        // Function keys F1..F24 (VK_F1 = 0x70)
        if let Some(n) = key.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
            if (1..=24).contains(&n) {
                return Some(0x70 + n - 1);
            }
        }

        match key {
            "SPACE" => Some(0x20),
            "ENTER" | "RETURN" => Some(0x0D),
            "TAB" => Some(0x09),
            "ESC" | "ESCAPE" => Some(0x1B),
            "BACKSPACE" => Some(0x08),
            "DELETE" => Some(0x2E),
            "INSERT" => Some(0x2D),
            "HOME" => Some(0x24),
            "END" => Some(0x23),
            "PAGEUP" => Some(0x21),
            "PAGEDOWN" => Some(0x22),
            "LEFT" => Some(0x25),
            "UP" => Some(0x26),
            "RIGHT" => Some(0x27),
            "DOWN" => Some(0x28),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_alt(key: &str) -> HotkeyBinding {
        HotkeyBinding {
            ctrl: true,
            alt: true,
            shift: false,
            meta: false,
            key: key.to_string(),
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ctrl_alt("V").to_string(), "Ctrl+Alt+V");
        let all = HotkeyBinding {
            ctrl: true,
            alt: true,
            shift: true,
            meta: true,
            key: "F2".to_string(),
        };
        assert_eq!(all.to_string(), "Ctrl+Alt+Shift+Win+F2");
    }

    #[test]
    fn test_letter_and_digit_codes() {
        assert_eq!(ctrl_alt("V").vk_code(), Some(0x56));
        assert_eq!(ctrl_alt("A").vk_code(), Some(0x41));
        assert_eq!(ctrl_alt("0").vk_code(), Some(0x30));
        assert_eq!(ctrl_alt("9").vk_code(), Some(0x39));
    }

    #[test]
    fn test_function_key_codes() {
        assert_eq!(ctrl_alt("F1").vk_code(), Some(0x70));
        assert_eq!(ctrl_alt("F12").vk_code(), Some(0x7B));
        assert_eq!(ctrl_alt("F24").vk_code(), Some(0x87));
        assert_eq!(ctrl_alt("F25").vk_code(), None);
    }

    #[test]
    fn test_named_key_codes() {
        assert_eq!(ctrl_alt("SPACE").vk_code(), Some(0x20));
        assert_eq!(ctrl_alt("ENTER").vk_code(), Some(0x0D));
        assert_eq!(ctrl_alt("RETURN").vk_code(), Some(0x0D));
        assert_eq!(ctrl_alt("PAGEDOWN").vk_code(), Some(0x22));
    }

    #[test]
    fn test_unknown_key_is_none() {
        assert_eq!(ctrl_alt("BOGUS").vk_code(), None);
        assert_eq!(ctrl_alt("?").vk_code(), None);
    }

    #[test]
    fn test_from_config_normalizes_case() {
        let config = HotkeyConfig {
            key: " v ".to_string(),
            ctrl: true,
            alt: false,
            shift: false,
            meta: false,
        };
        let binding = HotkeyBinding::from(&config);
        assert_eq!(binding.key, "V");
        assert_eq!(binding.vk_code(), Some(0x56));
        assert_eq!(binding.to_string(), "Ctrl+V");
    }
}
