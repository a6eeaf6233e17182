use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::backend::{ChangeCallback, ClipboardBackend};
use super::watch::Subscription;
use crate::models::{Representation, TEXT_PLAIN};

/// Text targets advertised for a text claim, like an X11 owner would
const TEXT_TARGETS: [&str; 2] = [TEXT_PLAIN, "UTF8_STRING"];

type Listeners = Arc<Mutex<Vec<(u64, ChangeCallback)>>>;

#[derive(Default)]
struct MemoryState {
    offers: Vec<(String, Vec<u8>)>,
    claims: u64,
}

/// In-process clipboard
/// Every claim replaces all offers under one lock and then notifies subscribers,
/// mirroring how a platform owner change behaves
#[derive(Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
    listeners: Listeners,
    next_listener: AtomicU64,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another application claiming the clipboard with raw offers
    pub fn offer(&self, offers: &[(&str, &[u8])]) {
        let offers = offers
            .iter()
            .map(|(format, bytes)| (format.to_string(), bytes.to_vec()))
            .collect();
        self.claim(offers);
    }

    /// Simulate another application copying text
    pub fn offer_text(&self, text: &str) {
        let offers = TEXT_TARGETS
            .iter()
            .map(|target| (target.to_string(), text.as_bytes().to_vec()))
            .collect();
        self.claim(offers);
    }

    /// Drop ownership without notifying, leaving the clipboard empty
    pub fn clear(&self) {
        relock(&self.state).offers.clear();
    }

    /// Current plain text content, if any
    pub fn text(&self) -> Option<String> {
        self.bytes(TEXT_PLAIN)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Current bytes for one format
    pub fn bytes(&self, format: &str) -> Option<Vec<u8>> {
        relock(&self.state)
            .offers
            .iter()
            .find(|(name, _)| name == format)
            .map(|(_, bytes)| bytes.clone())
    }

    /// Everything currently offered, in offer order
    pub fn contents(&self) -> Vec<(String, Vec<u8>)> {
        relock(&self.state).offers.clone()
    }

    /// Number of ownership claims made so far
    pub fn claims(&self) -> u64 {
        relock(&self.state).claims
    }

    fn claim(&self, offers: Vec<(String, Vec<u8>)>) {
        {
            let mut state = relock(&self.state);
            state.offers = offers;
            state.claims += 1;
        }
        self.notify();
    }

    fn notify(&self) {
        let mut listeners = relock(&self.listeners);
        for (_, callback) in listeners.iter_mut() {
            callback();
        }
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn list_available_formats(&self) -> Result<Vec<String>> {
        Ok(relock(&self.state)
            .offers
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn read_bytes(&self, format: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.bytes(format).filter(|bytes| !bytes.is_empty()))
    }

    fn set_union(&self, representations: Vec<Representation>) -> Result<()> {
        let mut offers = Vec::new();
        for rep in representations {
            match rep {
                Representation::Text(text) => {
                    for target in TEXT_TARGETS {
                        offers.push((target.to_string(), text.clone().into_bytes()));
                    }
                }
                Representation::Binary { format, bytes } => {
                    offers.push((format.as_str().to_string(), bytes));
                }
            }
        }
        self.claim(offers);
        Ok(())
    }

    fn subscribe_ownership_change(&self, callback: ChangeCallback) -> Result<Subscription> {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        relock(&self.listeners).push((id, callback));

        let listeners = self.listeners.clone();
        Ok(Subscription::new(move || {
            relock(&listeners).retain(|(listener, _)| *listener != id);
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
