/*
================================================================================
                           framelabeler Logging System
================================================================================

Standard application logging built on Rust's `log` crate (debug!, info!, etc).

Components:
- `BufferLogger`: Captures log messages in a memory buffer for export
- `CompositeLogger`: Combines console output with buffer capture
- `setup_logger()`: Initializes the logging system with appropriate filters
- `setup_panic_hook()`: Handles Rust panics with detailed backtraces
- `export_debug_logs()`: Exports captured log messages to debug.log

Log levels:
- Debug builds: Shows DEBUG and above
- Release builds: Shows ERROR only (unless RUST_LOG is set)
- All logs are captured in a circular buffer (last 1000 entries)

File locations:
- macOS: ~/Library/Application Support/framelabeler/logs/
- Other: Uses dirs crate for the appropriate data directory

All shared state is protected by Mutex; the buffer is circular so memory
use stays bounded for long capture sessions.
================================================================================
*/

use std::panic;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use env_logger::fmt::Color;
use log::{LevelFilter, Metadata, Record};
use env_logger::fmt::Formatter;
use chrono::Utc;

#[allow(unused_imports)]
use log::{Level, debug, info, warn, error};

const MAX_LOG_LINES: usize = 1000;

struct BufferLogger {
    log_buffer: Arc<Mutex<VecDeque<String>>>,
}

impl BufferLogger {
    fn new() -> Self {
        Self {
            log_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    fn log_to_buffer(&self, message: &str, target: &str, line: Option<u32>) {
        if target.starts_with("framelabeler") {
            let mut buffer = self.log_buffer.lock().unwrap();
            if buffer.len() == MAX_LOG_LINES {
                buffer.pop_front();
            }

            // Format the log message to include only line number to avoid duplication
            // The module is already in the target in most cases
            let formatted_message = if let Some(line_num) = line {
                format!("{target}:{line_num} {message}")
            } else {
                format!("{target} {message}")
            };

            buffer.push_back(formatted_message);
        }
    }

    fn get_shared_buffer(&self) -> Arc<Mutex<VecDeque<String>>> {
        Arc::clone(&self.log_buffer)
    }
}

impl log::Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("framelabeler") && metadata.level() <= LevelFilter::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{:<5} {}", record.level(), record.args());
            self.log_to_buffer(&message, record.target(), record.line());
        }
    }

    fn flush(&self) {}
}

struct CompositeLogger {
    console_logger: env_logger::Logger,
    buffer_logger: BufferLogger,
}

impl log::Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_logger.enabled(metadata) || self.buffer_logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console_logger.enabled(record.metadata()) {
            self.console_logger.log(record);
        }
        if self.buffer_logger.enabled(record.metadata()) {
            self.buffer_logger.log(record);
        }
    }

    fn flush(&self) {
        self.console_logger.flush();
        self.buffer_logger.flush();
    }
}

pub fn setup_logger(_app_name: &str) -> Arc<Mutex<VecDeque<String>>> {
    let buffer_logger = BufferLogger::new();
    let shared_buffer = buffer_logger.get_shared_buffer();

    let mut builder = env_logger::Builder::new();

    // First check if RUST_LOG is set - if so, use that configuration
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        // If RUST_LOG is not set, use different defaults for debug/release builds
        if cfg!(debug_assertions) {
            // In debug mode, show debug logs and above
            builder.filter(Some("framelabeler"), LevelFilter::Debug);
        } else {
            // In release mode, only show errors by default
            builder.filter(Some("framelabeler"), LevelFilter::Error);
        }
    }

    // Filter out all other crates' logs
    builder.filter(None, LevelFilter::Off);

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        // Create the module:line part
        let module_info = if let (Some(module), Some(line)) = (record.module_path(), record.line()) {
            format!("{module}:{line}")
        } else if let Some(module) = record.module_path() {
            module.to_string()
        } else if let Some(line) = record.line() {
            format!("line:{line}")
        } else {
            "unknown".to_string()
        };

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        // Set level colors
        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };

        // Set meta style color based on platform
        #[cfg(target_os = "macos")]
        {
            // Color::Rgb does not work on macOS, so we use Color::Blue as a workaround
            meta_style.set_color(Color::Blue);
        }

        #[cfg(not(target_os = "macos"))]
        {
            // Color formatting with Color::Rgb works fine on Windows/Linux
            meta_style.set_color(Color::Rgb(120, 120, 120));
        }

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    let console_logger = builder.build();

    let composite_logger = CompositeLogger {
        console_logger,
        buffer_logger,
    };

    log::set_boxed_logger(Box::new(composite_logger)).expect("Failed to set logger");

    // Always set the maximum level to Trace so that filtering works correctly
    log::set_max_level(LevelFilter::Trace);

    shared_buffer
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

/// Exports the current log buffer to a debug log file.
///
/// Writes the last 1,000 lines of logs (captured via the log macros like
/// debug!, info!, etc.) to debug.log. Useful for troubleshooting a capture
/// session without waiting for a crash.
///
/// # Arguments
/// * `app_name` - The application name used for the log directory
/// * `log_buffer` - The shared log buffer containing the recent log messages
///
/// # Returns
/// * `Ok(PathBuf)` - The path to the created debug log file
/// * `Err(std::io::Error)` - An error if the export fails
pub fn export_debug_logs(app_name: &str, log_buffer: Arc<Mutex<VecDeque<String>>>) -> Result<PathBuf, std::io::Error> {
    let log_dir_path = get_log_directory(app_name);
    std::fs::create_dir_all(&log_dir_path)?;

    let debug_log_path = log_dir_path.join("debug.log");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&debug_log_path)?;

    // Write formatted timestamp
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

    writeln!(file, "{timestamp} [DEBUG EXPORT] =====================================")?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] framelabeler Debug Log Export")?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] Maximum captured entries: {MAX_LOG_LINES}")?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] =====================================")?;
    writeln!(file)?; // Empty line for readability

    let log_entries: Vec<String> = {
        let buffer = log_buffer.lock().unwrap();
        buffer.iter().cloned().collect()
    }; // Lock is dropped here

    if log_entries.is_empty() {
        writeln!(file, "{timestamp} [DEBUG EXPORT] No log entries found in buffer")?;
    } else {
        writeln!(file, "{} [DEBUG EXPORT] Found {} log entries:", timestamp, log_entries.len())?;
        writeln!(file)?;

        for log_entry in log_entries.iter() {
            writeln!(file, "{timestamp} {log_entry}")?;
        }
    }

    file.flush()?;

    info!("Debug logs exported to: {}", debug_log_path.display());

    Ok(debug_log_path)
}

pub fn setup_panic_hook(app_name: &str, log_buffer: Arc<Mutex<VecDeque<String>>>) {
    let log_file_path = get_log_directory(app_name).join("panic.log");
    std::fs::create_dir_all(log_file_path.parent().unwrap()).expect("Failed to create log directory");

    panic::set_hook(Box::new(move |info| {
        let backtrace = backtrace::Backtrace::new();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file_path)
            .expect("Failed to open panic log file");

        // Write formatted timestamp
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        // Extract panic location information if available
        let location = if let Some(location) = info.location() {
            format!("{}:{}", location.file(), location.line())
        } else {
            "unknown location".to_string()
        };

        // Create formatted messages that we'll use for both console and file
        let header_msg = format!("[PANIC] at {location} - {info}");
        let backtrace_header = "[PANIC] Backtrace:";

        // Format backtrace lines
        let mut backtrace_lines = Vec::new();
        for line in format!("{backtrace:?}").lines() {
            backtrace_lines.push(format!("[BACKTRACE] {}", line.trim()));
        }

        // Log header to file
        writeln!(file, "{timestamp} {header_msg}").expect("Failed to write panic info");
        writeln!(file, "{timestamp} {backtrace_header}").expect("Failed to write backtrace header");

        // Log backtrace to file
        for line in &backtrace_lines {
            writeln!(file, "{timestamp} {line}").expect("Failed to write backtrace line");
        }

        // Add double linebreak between backtrace and log entries
        writeln!(file).expect("Failed to write newline");
        writeln!(file).expect("Failed to write second newline");

        // Dump the last N log lines from the buffer with timestamps
        writeln!(file, "{timestamp} [PANIC] Last {MAX_LOG_LINES} log entries:")
            .expect("Failed to write log header");

        let buffer = log_buffer.lock().unwrap();
        for log in buffer.iter() {
            writeln!(file, "{timestamp} {log}").expect("Failed to write log entry");
        }

        // Also print to stderr so the crash is visible in the console
        eprintln!("\n\n{header_msg}");
        eprintln!("{backtrace_header}");
        for line in &backtrace_lines {
            eprintln!("{line}");
        }
        eprintln!("\nA complete crash log has been written to: {}", log_file_path.display());
    }));
}
