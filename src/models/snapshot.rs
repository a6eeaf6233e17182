use super::format::{FormatId, TEXT_PLAIN};

/// One clipboard representation inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotItem {
    pub format: FormatId,
    pub payload: Vec<u8>,
}

/// Ordered set of (format, bytes) pairs captured for one clipboard change
/// or decoded from one input line
///
/// A format appears at most once. Order is insertion order, which is the
/// negotiator's priority order on the read side and line order on the write side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    items: Vec<SnapshotItem>,
}

impl Snapshot {
    pub fn new() -> Self {
        Snapshot { items: Vec::new() }
    }

    /// Append a payload for `format`
    /// Returns false (and keeps the existing entry) if the format is already present
    pub fn push(&mut self, format: FormatId, payload: Vec<u8>) -> bool {
        if self.contains(format.as_str()) {
            return false;
        }
        self.items.push(SnapshotItem { format, payload });
        true
    }

    pub fn contains(&self, format: &str) -> bool {
        self.items.iter().any(|item| item.format.as_str() == format)
    }

    /// Get the payload stored for `format`
    pub fn get(&self, format: &str) -> Option<&[u8]> {
        self.items
            .iter()
            .find(|item| item.format.as_str() == format)
            .map(|item| item.payload.as_slice())
    }

    pub fn items(&self) -> &[SnapshotItem] {
        &self.items
    }

    pub fn formats(&self) -> impl Iterator<Item = &FormatId> {
        self.items.iter().map(|item| &item.format)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of raw payload sizes (before base64)
    pub fn total_bytes(&self) -> usize {
        self.items.iter().map(|item| item.payload.len()).sum()
    }

    /// Check that every entry of this snapshot appears, byte for byte, in `other`
    /// An empty snapshot is never covered
    pub fn is_covered_by(&self, other: &Snapshot) -> bool {
        !self.is_empty()
            && self
                .items
                .iter()
                .all(|item| other.get(item.format.as_str()) == Some(item.payload.as_slice()))
    }
}

impl IntoIterator for Snapshot {
    type Item = SnapshotItem;
    type IntoIter = std::vec::IntoIter<SnapshotItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Content handed to the clipboard as part of a union claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// Plain text; the platform advertises its own text targets for it
    Text(String),
    /// Opaque bytes published under an explicit format
    Binary { format: FormatId, bytes: Vec<u8> },
}

impl Representation {
    /// Format name this representation is published under
    pub fn format(&self) -> &str {
        match self {
            Representation::Text(_) => TEXT_PLAIN,
            Representation::Binary { format, .. } => format.as_str(),
        }
    }
}
