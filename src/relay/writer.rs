use crate::clipboard::ClipboardBackend;
use crate::models::{Representation, Snapshot};
use crate::protocol::{ItemError, SnapshotError, decode_line};

/// Where the writer is in handling its input
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Idle between lines
    #[default]
    WaitingForLine,
    /// Parsing and validating a line
    Decoding,
    /// Publishing the decoded representations
    Applying,
    /// Input ended or the process was interrupted; terminal
    Stopped,
}

/// Applies decoded snapshots to the clipboard as a single union claim
pub struct ClipboardWriter<'a> {
    backend: &'a dyn ClipboardBackend,
    state: WriterState,
}

impl<'a> ClipboardWriter<'a> {
    pub fn new(backend: &'a dyn ClipboardBackend) -> Self {
        ClipboardWriter {
            backend,
            state: WriterState::WaitingForLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Decode one input line and apply it
    /// Returns the snapshot that was published; on any error the clipboard is untouched
    pub fn handle_line(&mut self, line: &str) -> Result<Snapshot, SnapshotError> {
        if self.state == WriterState::Stopped {
            return Err(SnapshotError::WriterStopped);
        }

        let result = self.decode_and_apply(line);
        self.transition(WriterState::WaitingForLine);
        result
    }

    fn decode_and_apply(&mut self, line: &str) -> Result<Snapshot, SnapshotError> {
        self.transition(WriterState::Decoding);
        let decoded = decode_line(line)?;

        for rejected in &decoded.rejected {
            log::warn!("Skipping item {}: {}", rejected.index, rejected.reason);
        }

        if decoded.snapshot.is_empty() {
            return Err(SnapshotError::EmptyProviderSet);
        }

        self.transition(WriterState::Applying);
        self.apply(&decoded.snapshot)?;
        Ok(decoded.snapshot)
    }

    /// Publish every usable item of `snapshot` in one claim
    pub fn apply(&self, snapshot: &Snapshot) -> Result<usize, SnapshotError> {
        let (representations, skipped) = build_representations(snapshot);
        for reason in &skipped {
            log::warn!("Skipping item: {}", reason);
        }

        if representations.is_empty() {
            return Err(SnapshotError::EmptyProviderSet);
        }

        let count = representations.len();
        let formats: Vec<&str> = representations.iter().map(|r| r.format()).collect();
        log::debug!("Applying union claim: {}", formats.join(", "));

        self.backend
            .set_union(representations)
            .map_err(SnapshotError::Backend)?;

        log::info!("Clipboard set with {} representations", count);
        Ok(count)
    }

    /// Enter the terminal state
    /// Only possible between lines; returns whether the writer is now stopped
    pub fn stop(&mut self) -> bool {
        match self.state {
            WriterState::WaitingForLine => {
                self.transition(WriterState::Stopped);
                true
            }
            WriterState::Stopped => true,
            state => {
                log::warn!("Cannot stop writer while {:?}", state);
                false
            }
        }
    }

    fn transition(&mut self, next: WriterState) {
        if self.state != next {
            log::trace!("Writer {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

/// Turn snapshot items into clipboard representations
///
/// Plain text becomes a text representation and must be UTF-8; anything else
/// is published as opaque bytes under its own format. Only the first plain
/// text item is used.
pub fn build_representations(snapshot: &Snapshot) -> (Vec<Representation>, Vec<ItemError>) {
    let mut representations = Vec::with_capacity(snapshot.len());
    let mut skipped = Vec::new();
    let mut has_text = false;

    for item in snapshot.items() {
        if !item.format.is_plain_text() {
            representations.push(Representation::Binary {
                format: item.format.clone(),
                bytes: item.payload.clone(),
            });
            continue;
        }

        if has_text {
            skipped.push(ItemError::DuplicateFormat(item.format.clone()));
            continue;
        }

        match String::from_utf8(item.payload.clone()) {
            Ok(text) => {
                has_text = true;
                representations.push(Representation::Text(text));
            }
            Err(source) => skipped.push(ItemError::InvalidUtf8 {
                format: item.format.clone(),
                source,
            }),
        }
    }

    (representations, skipped)
}
