use anyhow::{Context, Result, anyhow};
use clipboard_rs::{ClipboardHandler, ClipboardWatcher, ClipboardWatcherContext};
use std::thread;

use super::backend::ChangeCallback;

/// Live registration for ownership-change notifications
/// Dropping it (or calling `cancel`) stops further callbacks
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when it ends
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// End the subscription now
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Adapts a boxed callback to the platform watcher's handler trait
struct ChangeForwarder {
    callback: ChangeCallback,
}

impl ClipboardHandler for ChangeForwarder {
    fn on_clipboard_change(&mut self) {
        log::trace!("Clipboard ownership changed");
        (self.callback)();
    }
}

/// Start watching the platform clipboard for ownership changes
/// The watch loop blocks, so it runs on its own thread; the callback only
/// forwards the notification and never touches the clipboard itself
pub fn start_system_watcher(callback: ChangeCallback) -> Result<Subscription> {
    log::info!("Starting clipboard ownership watcher");

    let mut watcher = ClipboardWatcherContext::new()
        .map_err(|e| anyhow!("Failed to create watcher context: {}", e))?;

    let shutdown = watcher
        .add_handler(ChangeForwarder { callback })
        .get_shutdown_channel();

    thread::Builder::new()
        .name("clipboard-watch".to_string())
        .spawn(move || {
            log::debug!("Clipboard watch loop started");
            watcher.start_watch();
            log::debug!("Clipboard watch loop stopped");
        })
        .context("Failed to spawn clipboard watcher thread")?;

    Ok(Subscription::new(move || {
        log::debug!("Stopping clipboard ownership watcher");
        shutdown.stop();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_cancels_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.cancel();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_cancels_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
