//! Logging for the srlx bridge
//!
//! Console output goes to stderr so that parse output on stdout stays clean;
//! everything is additionally appended to a log file under the user config
//! directory. Chatter coming out of a loaded pipeline plugin is written with
//! a `PLUGIN` source tag so it can be told apart from the bridge's own lines.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static NO_STDERR: Mutex<bool> = Mutex::new(false);
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Get the current verbosity level for use by other crates
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Get whether console logging is disabled
pub fn get_no_stderr() -> bool {
    NO_STDERR.lock().ok().map(|v| *v).unwrap_or(false)
}

/// Set whether console logging is disabled
pub fn set_no_stderr(disabled: bool) {
    if let Ok(mut v) = NO_STDERR.lock() {
        *v = disabled;
    }
}

/// Initialize the logger with a verbosity level
/// 0 = warnings and errors only, 1 = debug (-v), 2 = trace (-vv)
pub fn init_with_verbosity(verbosity: u8, no_stderr: bool) -> Result<(), String> {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
    set_no_stderr(no_stderr);
    init()
}

/// Initialize the logger with a log file path (internal)
fn init() -> Result<(), String> {
    let config_dir = get_config_dir()?;
    fs::create_dir_all(&config_dir)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;

    let log_file = config_dir.join("srlx.log");

    // Truncate log file on each run (overwrite instead of append)
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    if let Ok(mut log_file_guard) = LOG_FILE.lock() {
        *log_file_guard = Some(log_file);
    }

    Ok(())
}

/// Get the config directory path
fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let config_dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("srlx");

    #[cfg(target_os = "windows")]
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("srlx");

    Ok(config_dir)
}

/// Write to log file
fn write_to_log(message: &str) {
    write_to_log_with_source(message, "BRIDGE");
}

/// Write to log file with custom source tag
fn write_to_log_with_source(message: &str, source: &str) {
    if let Ok(log_file_guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *log_file_guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] [{}] {}", timestamp, source, message);
            }
        }
    }
}

/// Log a debug message (to console if verbose >= 1, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 1 && !get_no_stderr() {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Log an informational message (to console if verbose >= 1, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if get_verbosity() >= 1 && !get_no_stderr() {
        eprintln!("{}", message);
    }
}

/// Log a warning message (to both file and console)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    if !get_no_stderr() {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }
}

/// Log an error message (to both file and console)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    if !get_no_stderr() {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}

/// Log a success message (to console only for user feedback)
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    let check = "\u{2714}".green().bold();
    if !get_no_stderr() {
        eprintln!("{} {}", check, message);
    }
}

/// Log a step message (important user-facing step)
pub fn step(message: &str) {
    write_to_log(&format!("STEP: {}", message));
    if get_verbosity() >= 2 && !get_no_stderr() {
        eprintln!("TRACE: {}", message);
    }
}

/// Log a line emitted by a loaded pipeline plugin
///
/// Levels follow the plugin ABI: 0 = debug, 1 = info, 2 = warn, 3+ = error.
pub fn plugin_line(level: u8, message: &str) {
    let tag = match level {
        0 => "DEBUG",
        1 => "INFO",
        2 => "WARN",
        _ => "ERROR",
    };
    write_to_log_with_source(&format!("{} {}", tag, message), "PLUGIN");
    let show = match level {
        0 | 1 => get_verbosity() >= 1,
        _ => true,
    };
    if show && !get_no_stderr() {
        eprintln!("{} {}", "plugin:".cyan().bold(), message);
    }
}

/// Start a spinner for a long-running phase (model loading)
pub fn spinner_start(message: &str) {
    write_to_log(&format!("STEP: {}", message));
    if get_no_stderr() || get_verbosity() >= 1 {
        return;
    }
    if let Ok(mut guard) = SPINNER.lock() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        *guard = Some(pb);
    }
}

/// Finish the active spinner, if any
pub fn spinner_finish() {
    if let Ok(mut guard) = SPINNER.lock() {
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}
