use crate::models::FormatId;

/// Outcome of one clipboard event or one input line that produced no clipboard effect
///
/// Every variant is recoverable: the caller logs it and moves on to the next event.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Clipboard is empty or unowned")]
    ClipboardEmpty,

    #[error("No preferred format available, clipboard offers: {}", .available.join(", "))]
    NoMatchingFormat { available: Vec<String> },

    #[error("None of the negotiated formats yielded data")]
    EmptySnapshot,

    #[error("Malformed snapshot line: {0}")]
    MalformedSnapshot(String),

    #[error("No valid content to set on the clipboard")]
    EmptyProviderSet,

    #[error("Writer has stopped accepting lines")]
    WriterStopped,

    #[error("Clipboard backend failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("Failed to write snapshot: {0}")]
    Output(#[from] std::io::Error),
}

impl SnapshotError {
    /// Check if the output channel is gone and the read side should stop
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, SnapshotError::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Reason a single element of a snapshot line was skipped
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("item must have 2 elements, found {0}")]
    NotAPair(usize),

    #[error("item must be an array of two strings")]
    NotStrings,

    #[error("invalid base64 payload for {format}: {source}")]
    InvalidBase64 {
        format: FormatId,
        #[source]
        source: base64::DecodeError,
    },

    #[error("format {0} appears more than once")]
    DuplicateFormat(FormatId),

    #[error("{format} payload is not valid UTF-8: {source}")]
    InvalidUtf8 {
        format: FormatId,
        #[source]
        source: std::string::FromUtf8Error,
    },
}
