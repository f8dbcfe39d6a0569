use thiserror::Error;

/// Failure taxonomy for the paste-as-image pipeline.
///
/// Every variant is recovered where it arises: the transaction turns it into
/// a transient notice and a transition to the releasing phase, and the
/// registration/guard variants are reported without stopping the agent.
/// Nothing here terminates the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The requested combination is already registered by another process.
    #[error("hotkey {0} is already in use by another process")]
    RegistrationConflict(String),

    /// A configured key name did not resolve to a virtual-key code.
    #[error("hotkey {0} names an unknown key")]
    InvalidHotkey(String),

    /// The foreground window does not belong to an allowed process.
    #[error("target client not in foreground: {0}")]
    GuardDenied(String),

    /// The clipboard sequence number never changed after the copy commands.
    #[error("nothing copied: clipboard unchanged after {0} ms (is text selected?)")]
    CopyTimeout(u64),

    /// Every read tier drained without producing usable text.
    #[error("clipboard held no text after {0} read attempts")]
    ReadEmpty(u32),

    /// Every write tier drained while the clipboard stayed busy.
    #[error("could not write image: clipboard stayed busy for {0} ms")]
    WriteContention(u64),

    /// Rasterizing or encoding the image failed.
    #[error("could not render text to an image: {0}")]
    RenderFailure(String),
}
