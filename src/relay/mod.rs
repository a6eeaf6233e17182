//! Read and write sides of the clipboard relay and the loop that drives them

pub mod dispatcher;
pub mod echo;
pub mod monitor;
pub mod session;
pub mod writer;

pub use dispatcher::{Dispatcher, RelayEvent, StopReason};
pub use echo::EchoGuard;
pub use monitor::ClipboardMonitor;
pub use session::{Relay, RelayStats};
pub use writer::{ClipboardWriter, WriterState, build_representations};
