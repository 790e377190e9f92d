use log::{Level, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const MAX_LOG_ENTRIES: usize = 100;

/// Shared ring buffer of recent log lines; the on-screen log window reads it.
#[derive(Clone)]
pub struct LogHistory {
    entries: Arc<Mutex<VecDeque<String>>>,
}

impl LogHistory {
    pub fn new() -> Self {
        Self { entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))) }
    }

    pub fn record(&self, line: String) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(line);
    }

    pub fn recent(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::new()
    }
}

struct CaptureLogger {
    history: LogHistory,
    started: Instant,
    max_level: Level,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f32();
        let line = format!("[{elapsed:8.3}] {}: {}", record.level(), record.args());
        if record.level() <= Level::Warn {
            eprintln!("{line}");
        }
        self.history.record(line);
    }

    fn flush(&self) {}
}

/// Installs the capture sink as the global logger and hands back the history
/// it fills. Fails if a logger is already installed.
pub fn install(max_level: Level) -> Result<LogHistory, log::SetLoggerError> {
    let history = LogHistory::new();
    let logger =
        CaptureLogger { history: history.clone(), started: Instant::now(), max_level };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level.to_level_filter());
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_caps_at_the_buffer_limit() {
        let history = LogHistory::new();
        for index in 0..150 {
            history.record(format!("line {index}"));
        }
        let recent = history.recent();
        assert_eq!(recent.len(), MAX_LOG_ENTRIES);
        assert_eq!(recent.first().map(String::as_str), Some("line 50"));
        assert_eq!(recent.last().map(String::as_str), Some("line 149"));
    }

    #[test]
    fn clear_empties_the_history() {
        let history = LogHistory::new();
        history.record("one".to_string());
        assert!(!history.is_empty());
        history.clear();
        assert!(history.is_empty());
    }
}
