//! Snapshot wire protocol
//!
//! One snapshot per line: a JSON array of `[format, base64]` pairs.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod negotiator;

pub use decoder::{DecodedLine, RejectedItem, decode_line};
pub use encoder::SnapshotEncoder;
pub use error::{ItemError, SnapshotError};
pub use negotiator::{NegotiatedFormat, negotiate};
