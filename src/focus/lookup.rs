/// What the platform reported as the foreground owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForegroundInfo {
    /// Executable file name of the owning process, e.g. "wechat.exe"
    Process(String),
    /// No window has focus (desktop transition, lock screen)
    NoWindow,
    /// A window exists but its owning process could not be identified
    NoProcess,
}

/// Trait for foreground window ownership lookup
pub trait ForegroundLookup: Send + Sync {
    fn foreground(&self) -> ForegroundInfo;
}
