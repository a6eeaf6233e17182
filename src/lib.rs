//! Clipline - relay clipboard snapshots over a line-oriented channel
//!
//! One side turns every clipboard change into a single JSON line of
//! `[format, base64]` pairs; the other applies such lines back to a clipboard
//! as one multi-format claim.

pub mod clipboard;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod relay;
pub mod storage;
