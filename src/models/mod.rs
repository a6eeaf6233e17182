pub mod format;
pub mod snapshot;

pub use format::{FormatId, IMAGE_PNG, PRIORITY_LIST, TEXT_PLAIN, TEXT_URI_LIST};
pub use snapshot::{Representation, Snapshot, SnapshotItem};
