use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::error::{ItemError, SnapshotError};
use crate::models::{FormatId, Snapshot};

/// An element of the input line that was skipped
#[derive(Debug)]
pub struct RejectedItem {
    /// Position of the element in the JSON array
    pub index: usize,
    pub reason: ItemError,
}

/// Result of decoding one line: the valid items plus the ones that were skipped
#[derive(Debug, Default)]
pub struct DecodedLine {
    pub snapshot: Snapshot,
    pub rejected: Vec<RejectedItem>,
}

/// Parse one wire line into a snapshot
///
/// A line that is not a JSON array fails as a whole. Individual elements that
/// are not `[format, base64]` string pairs are skipped and reported in
/// `rejected`; decoding continues with the next element.
pub fn decode_line(line: &str) -> Result<DecodedLine, SnapshotError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Err(SnapshotError::MalformedSnapshot("empty line".to_string()));
    }

    let value: Value = serde_json::from_str(line)
        .map_err(|e| SnapshotError::MalformedSnapshot(format!("invalid JSON: {}", e)))?;

    let Value::Array(elements) = value else {
        return Err(SnapshotError::MalformedSnapshot(
            "top-level value is not an array".to_string(),
        ));
    };

    let mut decoded = DecodedLine::default();

    for (index, element) in elements.iter().enumerate() {
        match decode_item(element) {
            Ok((format, payload)) => {
                if decoded.snapshot.contains(format.as_str()) {
                    decoded.rejected.push(RejectedItem {
                        index,
                        reason: ItemError::DuplicateFormat(format),
                    });
                    continue;
                }
                decoded.snapshot.push(format, payload);
            }
            Err(reason) => decoded.rejected.push(RejectedItem { index, reason }),
        }
    }

    Ok(decoded)
}

fn decode_item(element: &Value) -> Result<(FormatId, Vec<u8>), ItemError> {
    let pair = element.as_array().ok_or(ItemError::NotStrings)?;
    if pair.len() != 2 {
        return Err(ItemError::NotAPair(pair.len()));
    }

    let (Some(format), Some(encoded)) = (pair[0].as_str(), pair[1].as_str()) else {
        return Err(ItemError::NotStrings);
    };

    let format = FormatId::from(format);
    let payload = STANDARD
        .decode(encoded)
        .map_err(|source| ItemError::InvalidBase64 {
            format: format.clone(),
            source,
        })?;

    Ok((format, payload))
}
