use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::{self, Write};

use super::error::SnapshotError;
use super::negotiator::NegotiatedFormat;
use crate::clipboard::ClipboardBackend;
use crate::models::Snapshot;

/// Reads negotiated formats from the clipboard and turns them into wire lines
pub struct SnapshotEncoder {
    max_payload_bytes: u64,
}

impl SnapshotEncoder {
    /// Create an encoder that omits payloads larger than `max_payload_bytes`
    pub fn new(max_payload_bytes: u64) -> Self {
        SnapshotEncoder { max_payload_bytes }
    }

    /// Read every negotiated format from the clipboard
    ///
    /// Each format's sources are tried in order and the first one that yields
    /// data wins. Formats with no data are left out; the snapshot may be empty.
    pub fn capture(
        &self,
        backend: &dyn ClipboardBackend,
        selected: &[NegotiatedFormat],
    ) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for negotiated in selected {
            let Some(payload) = self.read_first(backend, negotiated) else {
                log::debug!("No data for {}, omitting", negotiated.format);
                continue;
            };

            if payload.len() as u64 > self.max_payload_bytes {
                log::warn!(
                    "Skipping {}: {} bytes exceeds limit of {} bytes",
                    negotiated.format,
                    payload.len(),
                    self.max_payload_bytes
                );
                continue;
            }

            snapshot.push(negotiated.format.clone(), payload);
        }

        snapshot
    }

    fn read_first(
        &self,
        backend: &dyn ClipboardBackend,
        negotiated: &NegotiatedFormat,
    ) -> Option<Vec<u8>> {
        negotiated.sources.iter().find_map(|source| {
            match backend.read_bytes(source) {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("Failed to read {} from clipboard: {:#}", source, e);
                    None
                }
            }
        })
    }

    /// Serialize a snapshot to one JSON line (without the trailing newline)
    pub fn encode(snapshot: &Snapshot) -> Result<String, SnapshotError> {
        if snapshot.is_empty() {
            return Err(SnapshotError::EmptySnapshot);
        }

        let pairs: Vec<(&str, String)> = snapshot
            .items()
            .iter()
            .map(|item| (item.format.as_str(), STANDARD.encode(&item.payload)))
            .collect();

        serde_json::to_string(&pairs).map_err(|e| SnapshotError::Output(io::Error::from(e)))
    }

    /// Write one line and flush it
    /// The line and its newline go out in a single write so a reader never
    /// sees a partial snapshot followed by another one
    pub fn emit<W: Write>(line: &str, out: &mut W) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        out.write_all(buf.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::protocol::negotiator::negotiate;

    fn capture_all(clipboard: &MemoryClipboard, encoder: &SnapshotEncoder) -> Snapshot {
        let available = clipboard.list_available_formats().unwrap();
        let selected = negotiate(&available).unwrap();
        encoder.capture(clipboard, &selected)
    }

    #[test]
    fn test_encode_text_snapshot() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer_text("hello");

        let snapshot = capture_all(&clipboard, &SnapshotEncoder::new(1024));
        let line = SnapshotEncoder::encode(&snapshot).unwrap();

        assert_eq!(line, r#"[["text/plain","aGVsbG8="]]"#);
    }

    #[test]
    fn test_payload_round_trips_through_base64() {
        let payload: Vec<u8> = (0..=255).collect();
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[("image/png", &payload)]);

        let snapshot = capture_all(&clipboard, &SnapshotEncoder::new(1024));
        let line = SnapshotEncoder::encode(&snapshot).unwrap();

        let parsed: Vec<(String, String)> = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "image/png");
        assert_eq!(STANDARD.decode(&parsed[0].1).unwrap(), payload);
    }

    #[test]
    fn test_missing_format_is_omitted() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[
            ("image/png", b""),
            ("text/uri-list", b"file:///tmp/a.png"),
        ]);

        let snapshot = capture_all(&clipboard, &SnapshotEncoder::new(1024));

        let formats: Vec<&str> = snapshot.formats().map(|f| f.as_str()).collect();
        assert_eq!(formats, vec!["text/uri-list"]);
    }

    #[test]
    fn test_alias_fallback_when_canonical_empty() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[("text/plain", b""), ("UTF8_STRING", b"fallback")]);

        let snapshot = capture_all(&clipboard, &SnapshotEncoder::new(1024));

        assert_eq!(snapshot.get("text/plain"), Some(&b"fallback"[..]));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_oversized_payload_is_omitted() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer(&[("image/png", &[0u8; 64]), ("text/plain", b"small")]);

        let snapshot = capture_all(&clipboard, &SnapshotEncoder::new(16));

        assert!(!snapshot.contains("image/png"));
        assert!(snapshot.contains("text/plain"));
    }

    #[test]
    fn test_empty_snapshot_is_not_encoded() {
        assert!(matches!(
            SnapshotEncoder::encode(&Snapshot::new()),
            Err(SnapshotError::EmptySnapshot)
        ));
    }

    #[test]
    fn test_emit_writes_one_terminated_line() {
        let mut out = Vec::new();
        SnapshotEncoder::emit(r#"[["text/plain","aGk="]]"#, &mut out).unwrap();
        SnapshotEncoder::emit(r#"[["text/plain","eW8="]]"#, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![r#"[["text/plain","aGk="]]"#, r#"[["text/plain","eW8="]]"#]
        );
        assert!(text.ends_with('\n'));
    }
}
