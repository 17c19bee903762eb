//! Unit tests for the Engine logger registry
//!
//! The logger is a global shared by every test of the crate. Tests touching it
//! are marked #[serial] and only look at entries from their own source.

use crate::stellar3d::Engine;
use crate::stellar3d::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

const SOURCE: &str = "stellar3d::engine_test";

/// Test logger that captures formatted entries from `SOURCE`
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl TestLogger {
    fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source != SOURCE {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => {
                entries.push(format!("{:?}: {} [{}:{}]", entry.severity, entry.message, file, line))
            }
            _ => entries.push(format!("{:?}: {}", entry.severity, entry.message)),
        }
    }
}

// ============================================================================
// LOGGER REGISTRY
// ============================================================================

#[test]
#[serial]
fn test_set_logger_captures_messages() {
    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, SOURCE, "G-buffer created".to_string());
    Engine::log(LogSeverity::Warn, SOURCE, "Core destroyed".to_string());
    Engine::reset_logger();

    let entries = entries_ref.lock().unwrap();
    assert_eq!(entries.as_slice(), &["Info: G-buffer created", "Warn: Core destroyed"]);
}

#[test]
#[serial]
fn test_reset_logger_to_default() {
    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, SOURCE, "After reset".to_string());

    // Default logger is active again
    assert!(entries_ref.lock().unwrap().is_empty());
}

#[test]
#[serial]
fn test_log_detailed_with_file_line() {
    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        SOURCE,
        "Shadow map incomplete".to_string(),
        "forward_renderer.rs",
        42,
    );
    Engine::reset_logger();

    let entries = entries_ref.lock().unwrap();
    assert_eq!(entries.as_slice(), &["Error: Shadow map incomplete [forward_renderer.rs:42]"]);
}

#[test]
#[serial]
fn test_macros_route_through_engine() {
    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    crate::engine_trace!(SOURCE, "trace {}", 1);
    crate::engine_debug!(SOURCE, "debug {}", 2);
    crate::engine_warn!(SOURCE, "warn {}", 3);
    Engine::reset_logger();

    let entries = entries_ref.lock().unwrap();
    assert_eq!(entries.as_slice(), &["Trace: trace 1", "Debug: debug 2", "Warn: warn 3"]);
}

#[test]
#[serial]
fn test_drain_errors_logs_each_pending_error() {
    use crate::graphics_provider::drain_errors;
    use crate::graphics_provider::mock_graphics_provider::MockGraphicsProvider;

    let test_logger = TestLogger::new();
    let entries_ref = test_logger.entries.clone();
    Engine::set_logger(test_logger);

    let mut gfx = MockGraphicsProvider::new();
    gfx.pending_errors = vec![0x0500, 0x0506];
    let drained = drain_errors(&mut gfx, SOURCE);
    Engine::reset_logger();

    assert_eq!(drained, 2);
    let entries = entries_ref.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.starts_with("Error: GPU error 0x050")));
}
