//! Logging for the Stellar3D engine
//!
//! Every engine message goes through the `Logger` installed on `Engine`.
//! Sources name the emitting component (`"stellar3d::ForwardRenderer"`).
//! ERROR entries built by `engine_error!`, `engine_err!` and `engine_bail!`
//! carry the file and line of the failing call site.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for engine log entries
///
/// Implement it to forward engine output to a file, an editor console or a
/// test capture, then install it with `Engine::set_logger`.
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "stellar3d::Engine", "stellar3d::DeferredRenderer")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-node and per-frame detail
    Trace,
    Debug,
    Info,
    /// Recoverable problems (missing texture, skipped node)
    Warn,
    /// Failed operations, logged with file:line
    Error,
}

/// Colored console logger used until `Engine::set_logger` replaces it
///
/// Format: `[timestamp] [SEVERITY] [source] message`, with ` (file:line)`
/// appended to detailed ERROR entries. WARN and ERROR go to stderr.
///
/// Draw paths log per node, so entries below `min_severity` are dropped.
/// The default threshold is DEBUG in debug builds and INFO in release.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    pub min_severity: LogSeverity,
}

impl DefaultLogger {
    pub fn new(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Render `entry` as a console line, `None` when below the threshold
    pub fn format_entry(&self, entry: &LogEntry) -> Option<String> {
        if entry.severity < self.min_severity {
            return None;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

        let severity = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let mut line = format!(
            "[{}] [{}] [{}] {}",
            timestamp,
            severity,
            entry.source.bright_blue(),
            entry.message
        );
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        Some(line)
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        let min_severity = if cfg!(debug_assertions) { LogSeverity::Debug } else { LogSeverity::Info };
        Self::new(min_severity)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if let Some(line) = self.format_entry(entry) {
            if entry.severity >= LogSeverity::Warn {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```ignore
/// engine_trace!("stellar3d::Skeleton", "Evaluating pose at t={}", time);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::stellar3d::Engine::log(
            $crate::stellar3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
///
/// # Example
///
/// ```ignore
/// engine_debug!("stellar3d::RenderableGraph", "Cloned subtree of {} nodes", count);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::stellar3d::Engine::log(
            $crate::stellar3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```ignore
/// engine_info!("stellar3d::DeferredRenderer", "G-buffer created ({}x{})", w, h);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::stellar3d::Engine::log(
            $crate::stellar3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
///
/// # Example
///
/// ```ignore
/// engine_warn!("stellar3d::TextureCache", "Texture '{}' not found", name);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::stellar3d::Engine::log(
            $crate::stellar3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```ignore
/// engine_error!("stellar3d::ForwardRenderer", "Shadow map creation failed: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::stellar3d::Engine::log_detailed(
            $crate::stellar3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and build the matching `Error` from it
///
/// Evaluates to the error value so it can be used with `ok_or_else`,
/// `map_err` or returned directly. The variant defaults to `BackendError`;
/// name another string-carrying variant with `Variant =>`.
///
/// # Example
///
/// ```ignore
/// let node = nodes.get(key)
///     .ok_or_else(|| engine_err!("stellar3d::RenderableGraph", InvalidResource => "Unknown renderable {:?}", key))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident => $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::stellar3d::Engine::log_detailed(
            $crate::stellar3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::stellar3d::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_err!($source, BackendError => $($arg)*)
    };
}

/// Log an ERROR message and return `Err` from the enclosing function
///
/// Accepts the same arguments as `engine_err!`.
///
/// # Example
///
/// ```ignore
/// if status != FramebufferStatus::Complete {
///     engine_bail!("stellar3d::ForwardRenderer", FramebufferIncomplete => "Shadow map: {:?}", status);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
