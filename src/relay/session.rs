use std::io::Write;

use super::dispatcher::{RelayEvent, StopReason};
use super::echo::EchoGuard;
use super::monitor::ClipboardMonitor;
use super::writer::ClipboardWriter;
use crate::protocol::SnapshotError;

/// Counters reported when the relay stops
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelayStats {
    /// Snapshots written to the output
    pub emitted: u64,
    /// Clipboard changes recognized as our own writes
    pub suppressed: u64,
    /// Clipboard changes that produced no snapshot
    pub skipped_events: u64,
    /// Input lines applied to the clipboard
    pub applied: u64,
    /// Input lines that left the clipboard untouched
    pub rejected_lines: u64,
}

/// Handles dispatcher events for the read side, the write side, or both
///
/// All clipboard access happens here, one event at a time.
pub struct Relay<'a, W: Write> {
    monitor: Option<ClipboardMonitor<'a>>,
    writer: Option<ClipboardWriter<'a>>,
    output: W,
    echo: EchoGuard,
    stats: RelayStats,
}

impl<'a, W: Write> Relay<'a, W> {
    /// Create a relay that writes snapshots to `output`
    pub fn new(output: W) -> Self {
        Relay {
            monitor: None,
            writer: None,
            output,
            echo: EchoGuard::disabled(),
            stats: RelayStats::default(),
        }
    }

    pub fn with_monitor(mut self, monitor: ClipboardMonitor<'a>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_writer(mut self, writer: ClipboardWriter<'a>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_echo_guard(mut self, echo: EchoGuard) -> Self {
        self.echo = echo;
        self
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    pub fn writer(&self) -> Option<&ClipboardWriter<'a>> {
        self.writer.as_ref()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Process one event
    /// Returns a stop reason once the relay should shut down
    pub fn handle(&mut self, event: RelayEvent) -> Option<StopReason> {
        match event {
            RelayEvent::ClipboardChanged => self.on_clipboard_change(),
            RelayEvent::Line(line) => {
                self.on_line(&line);
                None
            }
            RelayEvent::InputClosed => {
                log::info!("End of input");
                self.stop_writer();
                Some(StopReason::InputClosed)
            }
            RelayEvent::InputFailed(e) => {
                log::error!("Failed to read input: {}", e);
                self.stop_writer();
                Some(StopReason::InputClosed)
            }
            RelayEvent::Interrupted => {
                log::info!("Interrupted");
                self.stop_writer();
                Some(StopReason::Interrupted)
            }
        }
    }

    /// Emit whatever the clipboard holds right now, before any change arrives
    pub fn send_current(&mut self) -> Option<StopReason> {
        self.on_clipboard_change()
    }

    fn on_clipboard_change(&mut self) -> Option<StopReason> {
        let monitor = self.monitor.as_ref()?;

        let snapshot = match monitor.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_skipped_event(&e);
                self.stats.skipped_events += 1;
                return None;
            }
        };

        if self.echo.is_echo(&snapshot) {
            log::debug!("Suppressing echo of applied snapshot");
            self.stats.suppressed += 1;
            return None;
        }

        match monitor.emit(&snapshot, &mut self.output) {
            Ok(()) => {
                self.stats.emitted += 1;
                None
            }
            Err(e) if e.is_channel_closed() => {
                log::info!("Output closed");
                self.stop_writer();
                Some(StopReason::OutputClosed)
            }
            Err(e) => {
                log::error!("{}", e);
                self.stats.skipped_events += 1;
                None
            }
        }
    }

    fn on_line(&mut self, line: &str) {
        let Some(writer) = self.writer.as_mut() else {
            log::debug!("Ignoring input line, no writer attached");
            return;
        };

        match writer.handle_line(line) {
            Ok(applied) => {
                self.stats.applied += 1;
                self.echo.record(applied);
            }
            Err(e) => {
                log::warn!("{}", e);
                self.stats.rejected_lines += 1;
            }
        }
    }

    fn stop_writer(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.stop();
        }
    }
}

fn log_skipped_event(err: &SnapshotError) {
    match err {
        SnapshotError::ClipboardEmpty => log::debug!("{}", err),
        SnapshotError::Backend(_) => log::error!("{}", err),
        _ => log::warn!("{}", err),
    }
}
