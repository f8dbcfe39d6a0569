use anyhow::Result;

/// Trait for synthetic keystroke injection
/// Keystrokes land in whichever window has focus, so the foreground guard
/// runs before any of these are called
pub trait InputInjector: Send {
    /// Send the copy chord (Ctrl+C)
    fn send_copy(&mut self) -> Result<()>;

    /// Send the select-all chord (Ctrl+A)
    fn send_select_all(&mut self) -> Result<()>;

    /// Send the paste chord (Ctrl+V)
    fn send_paste(&mut self) -> Result<()>;

    /// Send the submit key (Enter)
    fn send_submit(&mut self) -> Result<()>;
}
