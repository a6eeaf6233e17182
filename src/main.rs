use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use clipline::clipboard;
use clipline::logging;
use clipline::protocol::{SnapshotEncoder, negotiate};
use clipline::relay::{ClipboardMonitor, ClipboardWriter, Dispatcher, EchoGuard, Relay};
use clipline::storage::{self, Config};

#[derive(Parser)]
#[command(name = "clipline")]
#[command(about = "Relay clipboard snapshots over stdin/stdout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $XDG_CONFIG_HOME/clipline/clipline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Level for diagnostics on stderr (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write diagnostics to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one snapshot line on stdout for every clipboard change
    Watch {
        /// Send the current clipboard once before waiting for changes
        #[arg(long)]
        initial: bool,
    },

    /// Apply snapshot lines read from stdin to the clipboard
    Apply,

    /// Watch and apply in one process without sending our own writes back
    Bridge {
        /// Override the echo suppression window (0 disables)
        #[arg(long)]
        echo_window_ms: Option<u64>,
    },

    /// Print the current clipboard as one snapshot line and exit
    Snapshot,

    /// List the formats the clipboard advertises and which would be sent
    Formats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = storage::load_config(cli.config.as_deref())?;
    let config = loaded.config;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    logging::init_logger(level, log_file, &config.logging.file_level)?;

    if loaded.created {
        log::info!("Created default configuration at {:?}", loaded.path);
    } else {
        log::debug!("Loaded configuration from {:?}", loaded.path);
    }

    match cli.command {
        Commands::Watch { initial } => cmd_watch(&config, initial),
        Commands::Apply => cmd_apply(),
        Commands::Bridge { echo_window_ms } => cmd_bridge(&config, echo_window_ms),
        Commands::Snapshot => cmd_snapshot(&config),
        Commands::Formats => cmd_formats(),
    }
}

fn encoder(config: &Config) -> SnapshotEncoder {
    SnapshotEncoder::new(config.general.max_payload_bytes)
}

/// Read side: stream a snapshot per clipboard change
fn cmd_watch(config: &Config, initial: bool) -> Result<()> {
    let backend = clipboard::create_backend()?;
    let monitor = ClipboardMonitor::new(backend.as_ref(), encoder(config));
    let mut relay = Relay::new(io::stdout().lock()).with_monitor(monitor);

    let mut dispatcher = Dispatcher::new();
    dispatcher.subscribe(backend.as_ref())?;
    dispatcher.handle_interrupts()?;

    if initial && let Some(reason) = relay.send_current() {
        log::info!("Stopped before watching: {:?}", reason);
        return Ok(());
    }

    log::info!("Watching {} clipboard", backend.name());
    dispatcher.run(&mut relay);
    Ok(())
}

/// Write side: apply each stdin line until EOF or Ctrl-C
fn cmd_apply() -> Result<()> {
    let backend = clipboard::create_backend()?;
    let mut relay = Relay::new(io::sink()).with_writer(ClipboardWriter::new(backend.as_ref()));

    let dispatcher = Dispatcher::new();
    dispatcher.watch_input(BufReader::new(io::stdin()))?;
    dispatcher.handle_interrupts()?;

    log::info!("Applying snapshots from stdin to {} clipboard", backend.name());
    dispatcher.run(&mut relay);
    Ok(())
}

/// Both sides in one loop
fn cmd_bridge(config: &Config, echo_window_ms: Option<u64>) -> Result<()> {
    let window = echo_window_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.bridge.echo_window());

    let backend = clipboard::create_backend()?;
    let mut relay = Relay::new(io::stdout().lock())
        .with_monitor(ClipboardMonitor::new(backend.as_ref(), encoder(config)))
        .with_writer(ClipboardWriter::new(backend.as_ref()))
        .with_echo_guard(EchoGuard::new(window));

    let mut dispatcher = Dispatcher::new();
    dispatcher.subscribe(backend.as_ref())?;
    dispatcher.watch_input(BufReader::new(io::stdin()))?;
    dispatcher.handle_interrupts()?;

    log::info!(
        "Bridging {} clipboard (echo window {}ms)",
        backend.name(),
        window.as_millis()
    );
    dispatcher.run(&mut relay);
    Ok(())
}

/// Emit the current clipboard once
fn cmd_snapshot(config: &Config) -> Result<()> {
    let backend = clipboard::create_backend()?;
    let monitor = ClipboardMonitor::new(backend.as_ref(), encoder(config));

    monitor
        .on_change(&mut io::stdout().lock())
        .context("No snapshot produced")?;
    Ok(())
}

/// Show advertised formats and the negotiated selection
fn cmd_formats() -> Result<()> {
    let backend = clipboard::create_backend()?;
    let available = backend.list_available_formats()?;

    println!("Available formats for the {} clipboard:", backend.name());
    if available.is_empty() {
        println!("  (not available)");
        return Ok(());
    }
    for format in &available {
        println!("  {}", format);
    }

    match negotiate(&available) {
        Ok(selected) => {
            println!("Would send:");
            for negotiated in selected {
                println!(
                    "  {} (from {})",
                    negotiated.format,
                    negotiated.sources.join(", ")
                );
            }
        }
        Err(e) => println!("{}", e),
    }

    Ok(())
}
