use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::session::Relay;
use crate::clipboard::{ClipboardBackend, Subscription};

/// Something the relay loop has to react to
#[derive(Debug)]
pub enum RelayEvent {
    /// The clipboard got a new owner
    ClipboardChanged,
    /// One line of input, without its terminator
    Line(String),
    /// Input reached end of file
    InputClosed,
    /// Reading input failed; treated like end of input
    InputFailed(io::Error),
    /// The process received an interrupt
    Interrupted,
}

/// Why the relay loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InputClosed,
    OutputClosed,
    Interrupted,
    /// Every event source went away
    SourcesGone,
}

/// Owns the event channel and the sources feeding it
///
/// Sources (platform watcher, input reader, interrupt handler) only post
/// events. `run` consumes them one at a time on the calling thread, so
/// clipboard reads and writes never overlap and keep arrival order.
pub struct Dispatcher {
    tx: Sender<RelayEvent>,
    rx: Receiver<RelayEvent>,
    subscription: Option<Subscription>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Dispatcher {
            tx,
            rx,
            subscription: None,
        }
    }

    /// Handle for posting events from elsewhere
    pub fn sender(&self) -> Sender<RelayEvent> {
        self.tx.clone()
    }

    /// Forward clipboard ownership changes into the loop
    pub fn subscribe(&mut self, backend: &dyn ClipboardBackend) -> Result<()> {
        let tx = self.tx.clone();
        let subscription = backend
            .subscribe_ownership_change(Box::new(move || {
                let _ = tx.send(RelayEvent::ClipboardChanged);
            }))
            .with_context(|| format!("Failed to watch {} clipboard", backend.name()))?;

        self.subscription = Some(subscription);
        Ok(())
    }

    /// Read lines from `input` on a background thread and post them in order
    pub fn watch_input<R: BufRead + Send + 'static>(&self, input: R) -> Result<()> {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name("input-watch".to_string())
            .spawn(move || read_lines(input, tx))
            .context("Failed to spawn input reader thread")?;
        Ok(())
    }

    /// Deliver Ctrl-C as an `Interrupted` event
    /// Can only be installed once per process
    pub fn handle_interrupts(&self) -> Result<()> {
        let tx = self.tx.clone();
        ctrlc::set_handler(move || {
            let _ = tx.send(RelayEvent::Interrupted);
        })
        .context("Failed to install interrupt handler")
    }

    /// Run until the relay asks to stop or every source is gone
    /// The clipboard subscription ends when this returns
    pub fn run<W: Write>(self, relay: &mut Relay<'_, W>) -> StopReason {
        let Dispatcher {
            tx,
            rx,
            subscription,
        } = self;
        drop(tx);

        log::debug!("Relay loop started");
        let reason = loop {
            match rx.recv() {
                Ok(event) => {
                    if let Some(reason) = relay.handle(event) {
                        break reason;
                    }
                }
                Err(_) => break StopReason::SourcesGone,
            }
        };

        drop(subscription);

        let stats = relay.stats();
        log::info!(
            "Relay stopped ({:?}): {} sent, {} suppressed, {} skipped, {} applied, {} rejected",
            reason,
            stats.emitted,
            stats.suppressed,
            stats.skipped_events,
            stats.applied,
            stats.rejected_lines
        );
        reason
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn read_lines<R: BufRead>(mut input: R, tx: Sender<RelayEvent>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => {
                let _ = tx.send(RelayEvent::InputClosed);
                return;
            }
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = match String::from_utf8(std::mem::take(&mut buf)) {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("Input line is not valid UTF-8");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                if tx.send(RelayEvent::Line(line)).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(RelayEvent::InputFailed(e));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::protocol::SnapshotEncoder;
    use crate::relay::{ClipboardMonitor, ClipboardWriter, EchoGuard, WriterState};
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_writer_applies_lines_in_order_then_stops_on_eof() {
        let clipboard = MemoryClipboard::new();
        let mut relay = Relay::new(Vec::new()).with_writer(ClipboardWriter::new(&clipboard));

        let dispatcher = Dispatcher::new();
        let input = "[[\"text/plain\",\"Zmlyc3Q=\"]]\nnot json\n[]\n[[\"text/plain\",\"c2Vjb25k\"]]\n";
        dispatcher.watch_input(Cursor::new(input)).unwrap();

        let reason = dispatcher.run(&mut relay);

        assert_eq!(reason, StopReason::InputClosed);
        assert_eq!(clipboard.text(), Some("second".to_string()));
        assert_eq!(clipboard.claims(), 2);
        assert_eq!(relay.stats().applied, 2);
        assert_eq!(relay.stats().rejected_lines, 2);
        assert_eq!(relay.writer().map(|w| w.state()), Some(WriterState::Stopped));
    }

    #[test]
    fn test_interrupt_stops_writer() {
        let clipboard = MemoryClipboard::new();
        let mut relay = Relay::new(Vec::new()).with_writer(ClipboardWriter::new(&clipboard));

        let dispatcher = Dispatcher::new();
        let tx = dispatcher.sender();
        tx.send(RelayEvent::Line(r#"[["text/plain","aGk="]]"#.to_string()))
            .unwrap();
        tx.send(RelayEvent::Interrupted).unwrap();
        tx.send(RelayEvent::Line(r#"[["text/plain","bGF0ZQ=="]]"#.to_string()))
            .unwrap();

        let reason = dispatcher.run(&mut relay);

        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(relay.writer().map(|w| w.state()), Some(WriterState::Stopped));
        assert_eq!(clipboard.text(), Some("hi".to_string()));
        assert_eq!(relay.stats().applied, 1);
    }

    #[test]
    fn test_initial_pass_sends_current_clipboard_first() {
        let clipboard = MemoryClipboard::new();
        clipboard.offer_text("already there");
        let monitor = ClipboardMonitor::new(&clipboard, SnapshotEncoder::new(1024));
        let mut relay = Relay::new(Vec::new()).with_monitor(monitor);

        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe(&clipboard).unwrap();
        assert!(relay.send_current().is_none());

        clipboard.offer_text("next");
        dispatcher.sender().send(RelayEvent::Interrupted).unwrap();

        assert_eq!(dispatcher.run(&mut relay), StopReason::Interrupted);
        let output = String::from_utf8(relay.into_output()).unwrap();
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![
                r#"[["text/plain","YWxyZWFkeSB0aGVyZQ=="]]"#,
                r#"[["text/plain","bmV4dA=="]]"#
            ]
        );
    }

    #[test]
    fn test_initial_pass_on_empty_clipboard_emits_nothing() {
        let clipboard = MemoryClipboard::new();
        let monitor = ClipboardMonitor::new(&clipboard, SnapshotEncoder::new(1024));
        let mut relay = Relay::new(Vec::new()).with_monitor(monitor);

        assert!(relay.send_current().is_none());
        assert_eq!(relay.stats().skipped_events, 1);
        assert!(relay.into_output().is_empty());
    }

    fn drain<W: Write>(dispatcher: &Dispatcher, relay: &mut Relay<'_, W>) {
        while let Ok(event) = dispatcher.rx.try_recv() {
            assert!(relay.handle(event).is_none());
        }
    }

    #[test]
    fn test_monitor_emits_one_line_per_change() {
        let clipboard = MemoryClipboard::new();
        let monitor = ClipboardMonitor::new(&clipboard, SnapshotEncoder::new(1024));
        let mut relay = Relay::new(Vec::new()).with_monitor(monitor);

        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe(&clipboard).unwrap();
        let tx = dispatcher.sender();

        clipboard.offer_text("one");
        drain(&dispatcher, &mut relay);
        clipboard.offer(&[("application/x-unknown", b"skip me")]);
        drain(&dispatcher, &mut relay);
        clipboard.offer_text("two");
        tx.send(RelayEvent::Interrupted).unwrap();

        let reason = dispatcher.run(&mut relay);
        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(relay.stats().emitted, 2);
        assert_eq!(relay.stats().skipped_events, 1);

        let output = String::from_utf8(relay.into_output()).unwrap();
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![r#"[["text/plain","b25l"]]"#, r#"[["text/plain","dHdv"]]"#]
        );
    }

    #[test]
    fn test_bridge_suppresses_own_writes() {
        let clipboard = MemoryClipboard::new();
        let monitor = ClipboardMonitor::new(&clipboard, SnapshotEncoder::new(1024));
        let mut relay = Relay::new(Vec::new())
            .with_monitor(monitor)
            .with_writer(ClipboardWriter::new(&clipboard))
            .with_echo_guard(EchoGuard::new(Duration::from_secs(60)));

        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe(&clipboard).unwrap();
        let tx = dispatcher.sender();

        // Applying the line fires a change notification of our own
        tx.send(RelayEvent::Line(r#"[["text/plain","aGVsbG8="]]"#.to_string()))
            .unwrap();
        drain(&dispatcher, &mut relay);

        clipboard.offer_text("from someone else");
        drain(&dispatcher, &mut relay);

        assert_eq!(relay.stats().applied, 1);
        assert_eq!(relay.stats().suppressed, 1);
        assert_eq!(relay.stats().emitted, 1);

        let output = String::from_utf8(relay.into_output()).unwrap();
        assert_eq!(output, "[[\"text/plain\",\"ZnJvbSBzb21lb25lIGVsc2U=\"]]\n");
    }

    #[test]
    fn test_input_lines_strip_terminators() {
        let (tx, rx) = mpsc::channel();
        read_lines(Cursor::new("a\r\nb\n\nc"), tx);

        let events: Vec<RelayEvent> = rx.iter().collect();
        let lines: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RelayEvent::Line(line) => Some(line.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(lines, vec!["a", "b", "", "c"]);
        assert!(matches!(events.last(), Some(RelayEvent::InputClosed)));
    }

    #[test]
    fn test_sources_gone_ends_loop() {
        let clipboard = MemoryClipboard::new();
        let mut relay = Relay::new(Vec::new()).with_writer(ClipboardWriter::new(&clipboard));

        let dispatcher = Dispatcher::new();
        let tx = dispatcher.sender();
        tx.send(RelayEvent::Line(r#"[["text/plain","aGk="]]"#.to_string()))
            .unwrap();
        drop(tx);

        assert_eq!(dispatcher.run(&mut relay), StopReason::SourcesGone);
        assert_eq!(clipboard.text(), Some("hi".to_string()));
    }
}
