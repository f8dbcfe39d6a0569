use anyhow::Result;

/// Trait for system clipboard access
/// The transaction layer polls `sequence` to detect ownership changes and
/// only trusts `read_text` once the sequence has moved past its snapshot
pub trait SystemClipboard: Send + Sync {
    /// Current clipboard sequence number, bumped by the OS on every
    /// clipboard update regardless of which process wrote it
    fn sequence(&self) -> u64;

    /// Read clipboard text
    /// Ok(None) means the clipboard holds no text format; Err means the
    /// clipboard could not be opened and the caller may retry
    fn read_text(&self) -> Result<Option<String>>;

    /// Write BMP image bytes to the clipboard, replacing its contents
    fn write_image(&self, bmp: &[u8]) -> Result<()>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}
