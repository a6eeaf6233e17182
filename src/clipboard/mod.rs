pub mod backend;
pub mod memory;
pub mod native;
pub mod system;
pub mod watch;

use anyhow::{Result, anyhow};
use std::env;

pub use backend::{ChangeCallback, ClipboardBackend};
pub use memory::MemoryClipboard;
pub use system::SystemClipboard;
pub use watch::Subscription;

/// Create the platform clipboard backend
/// On Linux the platform clipboard is reached through X11 (XWayland under
/// Wayland sessions), so DISPLAY must be set
pub fn create_backend() -> Result<Box<dyn ClipboardBackend>> {
    if cfg!(target_os = "linux") && env::var("DISPLAY").is_err() {
        if env::var("WAYLAND_DISPLAY").is_ok() {
            return Err(anyhow!(
                "Wayland session without DISPLAY. Enable XWayland and set DISPLAY"
            ));
        }
        return Err(anyhow!(
            "No supported display server detected. Set DISPLAY for X11"
        ));
    }

    let backend = SystemClipboard::new()?;
    log::info!("Using {} clipboard backend", backend.name());
    Ok(Box::new(backend))
}
