// src/logging.rs
//! Logging setup
//!
//! Records go to an `env_logger` sink and are mirrored into a bounded in-memory
//! buffer that the editor's console panel reads. The buffer handle is returned by
//! [`init`] and handed to whoever needs it; nothing reads it through a global.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn};

/// Lines kept for the console panel
pub const CONSOLE_CAPACITY: usize = 1000;

const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

/// Shared ring buffer of formatted log lines
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    lines: Arc<Mutex<VecDeque<ConsoleLine>>>,
    capacity: usize,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::with_capacity(CONSOLE_CAPACITY)
    }
}

impl ConsoleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(CONSOLE_CAPACITY)))),
            capacity: capacity.max(1),
        }
    }

    // A panic while holding the lock only loses log lines
    fn lock(&self) -> MutexGuard<'_, VecDeque<ConsoleLine>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, line: ConsoleLine) {
        let mut lines = self.lock();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Copy of the current lines, oldest first
    pub fn snapshot(&self) -> Vec<ConsoleLine> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `log` backend forwarding to `env_logger` and recording into a [`ConsoleBuffer`]
pub struct ConsoleLog {
    inner: env_logger::Logger,
    buffer: ConsoleBuffer,
}

impl ConsoleLog {
    pub fn new(inner: env_logger::Logger, buffer: ConsoleBuffer) -> Self {
        Self { inner, buffer }
    }

    pub fn filter(&self) -> log::LevelFilter {
        self.inner.filter()
    }
}

impl log::Log for ConsoleLog {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        self.buffer.push(ConsoleLine {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the process logger and returns the console buffer it feeds
///
/// `RUST_LOG` overrides the default filter. Calling this twice keeps the first
/// logger and hands back a buffer that will stay empty.
pub fn init() -> ConsoleBuffer {
    let inner =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
            .build();
    let buffer = ConsoleBuffer::default();
    let logger = ConsoleLog::new(inner, buffer.clone());
    let max_level = logger.filter();

    match log::set_boxed_logger(Box::new(logger)) {
        Ok(()) => log::set_max_level(max_level),
        Err(e) => eprintln!("Logger already initialized: {}", e),
    }

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn line(message: &str) -> ConsoleLine {
        ConsoleLine {
            level: log::Level::Info,
            target: "test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_buffer_drops_oldest() {
        let buffer = ConsoleBuffer::with_capacity(2);
        buffer.push(line("a"));
        buffer.push(line("b"));
        buffer.push(line("c"));

        let lines = buffer.snapshot();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "b");
        assert_eq!(lines[1].message, "c");
    }

    #[test]
    fn test_clones_share_lines() {
        let buffer = ConsoleBuffer::default();
        let handle = buffer.clone();
        buffer.push(line("shared"));
        assert_eq!(handle.len(), 1);
        handle.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_console_log_records_enabled_levels_only() {
        let inner = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .target(env_logger::Target::Pipe(Box::new(std::io::sink())))
            .build();
        let buffer = ConsoleBuffer::default();
        let logger = ConsoleLog::new(inner, buffer.clone());

        logger.log(
            &log::Record::builder()
                .args(format_args!("too quiet"))
                .level(log::Level::Info)
                .target("kiln")
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .args(format_args!("texture missing"))
                .level(log::Level::Warn)
                .target("kiln")
                .build(),
        );

        let lines = buffer.snapshot();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, log::Level::Warn);
        assert_eq!(lines[0].message, "texture missing");
    }
}
