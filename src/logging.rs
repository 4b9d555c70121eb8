//! Structured logging for the engine
//!
//! Writes category-tagged log lines to a dated file and stdout:
//! - PROFILE: tag extraction and profile update cycles
//! - MEMORY: persona memory inserts, eviction, consolidation
//! - API: completion calls, retries, parse recovery
//! - STORE: persistence operations
//! - ERROR: failures

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Profile, // Tag extraction, profile update cycles
    Memory,  // Persona memory lifecycle
    Api,     // Completion calls and retries
    Store,   // Persistence operations
    Error,   // Errors
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Profile => "PROFILE",
            LogCategory::Memory => "MEMORY",
            LogCategory::Api => "API",
            LogCategory::Store => "STORE",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Current log file path, set by init_logging
static LOG_FILE: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

/// Get the log directory path
fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RAPPORT_LOG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".rapport/logs")
}

/// Get today's log file path
fn get_log_file_path() -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    get_log_dir().join(format!("rapport-{}.log", today))
}

/// Initialize the logging system - creates the log directory if needed
pub fn init_logging() -> std::io::Result<()> {
    let log_dir = get_log_dir();

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    let log_path = get_log_file_path();
    *LOG_FILE.lock().unwrap() = Some(log_path);

    log(LogCategory::Store, None, "rapport logging initialized");

    Ok(())
}

/// Log a message with category and optional chat context
pub fn log(category: LogCategory, chat_id: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let chat_context = chat_id
        .map(|id| format!("chat={} | ", &id[..8.min(id.len())]))
        .unwrap_or_default();

    let log_line = format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        chat_context,
        message
    );

    print!("{}", log_line);

    // File logging is best-effort; only active after init_logging
    let initialized = LOG_FILE.lock().map(|f| f.is_some()).unwrap_or(false);
    if initialized {
        let log_path = get_log_file_path();
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_line.as_bytes());
        }
    }
}

/// Log a profile event (tags extracted, update cycle ran)
pub fn log_profile(chat_id: Option<&str>, message: &str) {
    log(LogCategory::Profile, chat_id, message);
}

/// Log a persona memory event (insert, eviction, consolidation)
pub fn log_memory(chat_id: Option<&str>, message: &str) {
    log(LogCategory::Memory, chat_id, message);
}

/// Log a completion API event (request, retry, parse recovery)
pub fn log_api(chat_id: Option<&str>, message: &str) {
    log(LogCategory::Api, chat_id, message);
}

/// Log a persistence event
pub fn log_store(chat_id: Option<&str>, message: &str) {
    log(LogCategory::Store, chat_id, message);
}

/// Log an error
pub fn log_error(chat_id: Option<&str>, message: &str) {
    log(LogCategory::Error, chat_id, message);
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs() -> std::io::Result<usize> {
    let log_dir = get_log_dir();
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}
