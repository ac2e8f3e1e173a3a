//! Log Module

use colored::Colorize;
use std::sync::{Once, RwLock};

static INIT: Once = Once::new();
static LOG_LEVEL: RwLock<LogLevel> = RwLock::new(LogLevel::Info);

/// This enum is used to represent the different log levels
#[derive(PartialEq, PartialOrd, Debug)]
pub enum LogLevel {
    Debug,
    Info,
    Log,
    Warn,
    Error,
}

/// Initializes the log level from `RUMAKE_LOG_LEVEL`, called only once when
/// the program starts
fn init_log_level() {
    let level = std::env::var("RUMAKE_LOG_LEVEL").unwrap_or_else(|_| "Info".to_string());
    let log_level = match level.as_str() {
        "Debug" => LogLevel::Debug,
        "Info" => LogLevel::Info,
        "Log" => LogLevel::Log,
        "Warn" => LogLevel::Warn,
        "Error" => LogLevel::Error,
        _ => LogLevel::Info,
    };

    let mut write_lock = LOG_LEVEL.write().unwrap();
    *write_lock = log_level;
}

/// This function is used to log messages to the console
/// # Arguments
/// * `level` - The log level of the message
/// * `message` - The message to log
pub fn log(level: LogLevel, message: &str) {
    INIT.call_once(init_log_level);
    let level_str = match level {
        LogLevel::Debug => "[DEBUG]".purple(),
        LogLevel::Info => "[INFO]".blue(),
        LogLevel::Log => "[LOG]".green(),
        LogLevel::Warn => "[WARN]".yellow(),
        LogLevel::Error => "[ERROR]".red(),
    };
    if level >= *LOG_LEVEL.read().unwrap() {
        println!("{} {}", level_str, message);
    }
}
