use anyhow::Result;

use super::watch::Subscription;
use crate::models::Representation;

/// Callback invoked on every clipboard ownership change
pub type ChangeCallback = Box<dyn FnMut() + Send + 'static>;

/// Trait for clipboard backend abstraction
/// The relay only needs this narrow surface; the platform clipboard and the
/// in-memory clipboard used in tests both implement it
pub trait ClipboardBackend: Send + Sync {
    /// Names of all formats the current clipboard owner advertises
    /// Empty when the clipboard is unowned
    fn list_available_formats(&self) -> Result<Vec<String>>;

    /// Raw bytes for one advertised format, or None if the owner provides nothing
    fn read_bytes(&self, format: &str) -> Result<Option<Vec<u8>>>;

    /// Claim the clipboard with all representations at once
    /// Observers must never see a subset of them
    fn set_union(&self, representations: Vec<Representation>) -> Result<()>;

    /// Register a callback fired on every ownership change
    /// Notifications stop when the returned subscription is dropped
    fn subscribe_ownership_change(&self, callback: ChangeCallback) -> Result<Subscription>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}
