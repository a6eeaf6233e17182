use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Logger that writes diagnostics to stderr and to a rotating file
/// stdout carries the wire protocol, so nothing is ever logged there
struct RelayLogger {
    file_writer: Arc<Mutex<RollingFileAppender>>,
    console_level: LevelFilter,
    file_level: LevelFilter,
}

impl Log for RelayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.console_level || metadata.level() <= self.file_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if level <= self.console_level {
            let _ = writeln!(io::stderr().lock(), "[{}] {}", level, record.args());
        }

        if level <= self.file_level {
            if let Ok(mut writer) = self.file_writer.lock() {
                let _ = writeln!(
                    writer,
                    "{} [{}] {}: {}",
                    timestamp,
                    level,
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut writer) = self.file_writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Parse log level string to LevelFilter
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info, // Default to info
    }
}

/// Create a daily rotating appender for `log_file_path`, keeping 3 files
fn file_appender(log_file_path: &Path) -> Result<RollingFileAppender> {
    let dir = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).context("Failed to create log directory")?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("clipline"),
        )
        .filename_suffix(
            log_file_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(dir)
        .context("Failed to create rotating file appender")
}

/// Initialize the global logger
///
/// Without a log file this is plain env_logger on stderr (RUST_LOG still
/// overrides the configured level). With a log file, stderr and the file get
/// their own levels.
pub fn init_logger(console_level: &str, log_file: Option<&Path>, file_level: &str) -> Result<()> {
    let console_level = parse_level(console_level);

    let Some(log_file_path) = log_file else {
        return Builder::new()
            .filter_level(console_level)
            .parse_default_env()
            .target(Target::Stderr)
            .try_init()
            .context("Failed to set global logger");
    };

    let file_level = parse_level(file_level);
    let logger = RelayLogger {
        file_writer: Arc::new(Mutex::new(file_appender(log_file_path)?)),
        console_level,
        file_level,
    };

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(console_level.max(file_level));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_file_appender_writes_into_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut appender = file_appender(&dir.path().join("logs/relay.log")).unwrap();

        writeln!(appender, "hello").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("relay"));
        assert!(names[0].ends_with("log"));
    }
}
