use std::io::Write;

use crate::clipboard::ClipboardBackend;
use crate::models::Snapshot;
use crate::protocol::{SnapshotEncoder, SnapshotError, negotiate};

/// Read side: turns the current clipboard into one snapshot per change
pub struct ClipboardMonitor<'a> {
    backend: &'a dyn ClipboardBackend,
    encoder: SnapshotEncoder,
}

impl<'a> ClipboardMonitor<'a> {
    pub fn new(backend: &'a dyn ClipboardBackend, encoder: SnapshotEncoder) -> Self {
        ClipboardMonitor { backend, encoder }
    }

    /// Negotiate and read the clipboard's current content
    pub fn capture(&self) -> Result<Snapshot, SnapshotError> {
        let available = self
            .backend
            .list_available_formats()
            .map_err(SnapshotError::Backend)?;

        if available.is_empty() {
            return Err(SnapshotError::ClipboardEmpty);
        }

        let selected = negotiate(&available)?;
        log::debug!(
            "Negotiated {} of {} advertised formats",
            selected.len(),
            available.len()
        );

        let snapshot = self.encoder.capture(self.backend, &selected);
        if snapshot.is_empty() {
            return Err(SnapshotError::EmptySnapshot);
        }
        Ok(snapshot)
    }

    /// Encode `snapshot` and write it as one line
    pub fn emit<W: Write>(&self, snapshot: &Snapshot, out: &mut W) -> Result<(), SnapshotError> {
        let line = SnapshotEncoder::encode(snapshot)?;
        SnapshotEncoder::emit(&line, out)?;

        log::info!(
            "Sent clipboard snapshot ({} formats, {} bytes)",
            snapshot.len(),
            snapshot.total_bytes()
        );
        Ok(())
    }

    /// One full pass for a single ownership change: capture, then emit
    pub fn on_change<W: Write>(&self, out: &mut W) -> Result<Snapshot, SnapshotError> {
        let snapshot = self.capture()?;
        self.emit(&snapshot, out)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;

    fn monitor(clipboard: &MemoryClipboard) -> ClipboardMonitor<'_> {
        ClipboardMonitor::new(clipboard, SnapshotEncoder::new(1024))
    }

    #[test]
    fn test_on_change_emits_priority_ordered_line() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[
            ("UTF8_STRING", b"hi"),
            ("TARGETS", b"x"),
            ("image/png", &[1, 2, 3]),
        ]);

        let mut out = Vec::new();
        monitor(&clipboard).on_change(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[[\"image/png\",\"AQID\"],[\"text/plain\",\"aGk=\"]]\n"
        );
    }

    #[test]
    fn test_empty_clipboard_emits_nothing() {
        let clipboard = MemoryClipboard::new();
        let mut out = Vec::new();

        let err = monitor(&clipboard).on_change(&mut out).unwrap_err();

        assert!(matches!(err, SnapshotError::ClipboardEmpty));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unmatched_formats_emit_nothing() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[("application/x-secret", b"data")]);
        let mut out = Vec::new();

        let err = monitor(&clipboard).on_change(&mut out).unwrap_err();

        assert!(matches!(err, SnapshotError::NoMatchingFormat { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_all_reads_empty_emits_nothing() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[("text/plain", b""), ("image/png", b"")]);
        let mut out = Vec::new();

        let err = monitor(&clipboard).on_change(&mut out).unwrap_err();

        assert!(matches!(err, SnapshotError::EmptySnapshot));
        assert!(out.is_empty());
    }
}
