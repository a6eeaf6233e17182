use anyhow::{Result, anyhow};
use clipboard_rs::{Clipboard, ClipboardContent, ClipboardContext, ContentFormat};
use std::sync::{Mutex, MutexGuard};

use super::backend::{ChangeCallback, ClipboardBackend};
use super::native::{self, TypeTable};
use super::watch::{self, Subscription};
use crate::models::{Representation, TEXT_PLAIN, TEXT_URI_LIST};

/// X11 targets carry text and file lists as raw MIME bytes. Elsewhere they
/// only exist behind the typed text and file APIs.
const TYPED_TEXT_AND_FILES: bool = !cfg!(target_os = "linux");

/// Platform clipboard backend built on clipboard-rs
/// (X11 selections on Linux, NSPasteboard on macOS, Win32 clipboard on Windows)
///
/// Platform type names are translated to wire formats on the way in and back
/// on the way out.
pub struct SystemClipboard {
    ctx: Mutex<ClipboardContext>,
    types: TypeTable,
}

impl SystemClipboard {
    /// Open the platform clipboard
    pub fn new() -> Result<Self> {
        let ctx = ClipboardContext::new().map_err(|e| anyhow!("Failed to open clipboard: {}", e))?;

        log::debug!("SystemClipboard initialized successfully");
        Ok(SystemClipboard {
            ctx: Mutex::new(ctx),
            types: native::platform_types(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClipboardContext>> {
        self.ctx
            .lock()
            .map_err(|_| anyhow!("Clipboard context lock poisoned"))
    }
}

impl ClipboardBackend for SystemClipboard {
    fn list_available_formats(&self) -> Result<Vec<String>> {
        let ctx = self.lock()?;
        let advertised = ctx
            .available_formats()
            .map_err(|e| anyhow!("Failed to list clipboard formats: {}", e))?;

        let mut formats: Vec<String> = Vec::with_capacity(advertised.len());
        for name in &advertised {
            let wire = native::to_wire(self.types, name);
            if !formats.iter().any(|f| f == wire) {
                formats.push(wire.to_string());
            }
        }

        if TYPED_TEXT_AND_FILES {
            for (content, wire) in [
                (ContentFormat::Text, TEXT_PLAIN),
                (ContentFormat::Files, TEXT_URI_LIST),
            ] {
                if ctx.has(content) && !formats.iter().any(|f| f == wire) {
                    formats.push(wire.to_string());
                }
            }
        }

        Ok(formats)
    }

    fn read_bytes(&self, format: &str) -> Result<Option<Vec<u8>>> {
        let ctx = self.lock()?;

        let data = match format {
            TEXT_PLAIN if TYPED_TEXT_AND_FILES => ctx.get_text().map(String::into_bytes),
            TEXT_URI_LIST if TYPED_TEXT_AND_FILES => ctx
                .get_files()
                .map(|files| native::uri_list_from_files(&files).into_bytes()),
            _ => ctx.get_buffer(native::to_native(self.types, format)),
        };

        match data {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => Ok(None),
            Err(e) => {
                // clipboard-rs reports "owner has no such target" as an error too
                log::debug!("No data for {}: {}", format, e);
                Ok(None)
            }
        }
    }

    fn set_union(&self, representations: Vec<Representation>) -> Result<()> {
        let contents: Vec<ClipboardContent> = representations
            .into_iter()
            .filter_map(|rep| match rep {
                Representation::Text(text) => Some(ClipboardContent::Text(text)),
                Representation::Binary { format, bytes }
                    if TYPED_TEXT_AND_FILES && format.as_str() == TEXT_URI_LIST =>
                {
                    let files = native::files_from_uri_list(&String::from_utf8_lossy(&bytes));
                    if files.is_empty() {
                        log::warn!("No local files in {}, not publishing it", TEXT_URI_LIST);
                        return None;
                    }
                    Some(ClipboardContent::Files(files))
                }
                Representation::Binary { format, bytes } => Some(ClipboardContent::Other(
                    native::to_native(self.types, format.as_str()).to_string(),
                    bytes,
                )),
            })
            .collect();

        if contents.is_empty() {
            return Err(anyhow!("No representation can be published on this platform"));
        }

        let count = contents.len();
        let ctx = self.lock()?;
        ctx.set(contents)
            .map_err(|e| anyhow!("Failed to set clipboard contents: {}", e))?;

        log::debug!("Claimed clipboard with {} representations", count);
        Ok(())
    }

    fn subscribe_ownership_change(&self, callback: ChangeCallback) -> Result<Subscription> {
        watch::start_system_watcher(callback)
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
