use anyhow::{Result, anyhow};
use clipboard_win::{formats, get_clipboard_string, is_format_avail, set_clipboard};
use windows::Win32::System::DataExchange::GetClipboardSequenceNumber;

use super::backend::SystemClipboard;

/// Windows clipboard backed by the Win32 clipboard API
/// Every call is a single attempt; retry policy lives in the transaction
pub struct Win32Clipboard;

impl Win32Clipboard {
    pub fn new() -> Result<Self> {
        let seq = unsafe { GetClipboardSequenceNumber() };
        log::debug!("Win32Clipboard initialized, sequence {}", seq);
        Ok(Win32Clipboard)
    }
}

impl SystemClipboard for Win32Clipboard {
    fn sequence(&self) -> u64 {
        u64::from(unsafe { GetClipboardSequenceNumber() })
    }

    fn read_text(&self) -> Result<Option<String>> {
        if !is_format_avail(formats::CF_UNICODETEXT) {
            return Ok(None);
        }
        match get_clipboard_string() {
            Ok(text) => Ok(Some(text)),
            Err(e) => Err(anyhow!("Clipboard read failed: {}", e)),
        }
    }

    fn write_image(&self, bmp: &[u8]) -> Result<()> {
        set_clipboard(formats::Bitmap, bmp)
            .map_err(|e| anyhow!("Clipboard write failed: {}", e))?;
        log::debug!("Wrote {} bytes image to clipboard", bmp.len());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Win32"
    }
}
