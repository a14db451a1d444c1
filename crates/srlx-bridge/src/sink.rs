//! Scoped log-sink injection for pipeline chatter
//!
//! External pipeline libraries tend to write progress chatter to the process
//! streams. Instead of redirecting a global stream, each bridge instance
//! hands its plugin an explicit sink; the default sink routes the lines into
//! `srlx-logger` under the `PLUGIN` source tag.

use srlx_logger as logger;

/// Receives log lines emitted by a loaded pipeline plugin
///
/// Levels follow the plugin ABI: 0 = debug, 1 = info, 2 = warn, 3+ = error.
pub trait LogSink: Send + Sync {
    fn line(&self, level: u8, message: &str);
}

/// Default sink: forward plugin chatter into the srlx logger
pub struct LoggerSink;

impl LogSink for LoggerSink {
    fn line(&self, level: u8, message: &str) {
        logger::plugin_line(level, message);
    }
}

/// Sink that drops everything; for hosts that silence the plugin entirely
pub struct NullSink;

impl LogSink for NullSink {
    fn line(&self, _level: u8, _message: &str) {}
}
