//! Integration tests for Engine logging system
//!
//! These tests verify the logging system functionality.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use stellar_3d_engine::stellar3d::animation::{Bone, Skeleton, NO_PARENT};
use stellar_3d_engine::stellar3d::scene::{RenderableCore, RenderableGraph};
use stellar_3d_engine::stellar3d::{Engine, Error};
use stellar_3d_engine::stellar3d::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.push(LogEntry {
            severity: entry.severity,
            timestamp: entry.timestamp,
            source: entry.source.clone(),
            message: entry.message.clone(),
            file: entry.file,
            line: entry.line,
        });
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::renderer", "G-buffer resized".to_string());
    Engine::log(LogSeverity::Warn, "test::renderer", "Core destroyed, node skipped".to_string());
    Engine::reset_logger();

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "test::renderer");
    assert_eq!(captured[0].message, "G-buffer resized");
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[1].message, "Core destroyed, node skipped");
    assert!(captured.iter().all(|e| e.file.is_none() && e.line.is_none()));
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::shader",
        "Link failed".to_string(),
        "render_shader.rs",
        42,
    );
    Engine::reset_logger();

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let entry = &captured[0];
    assert_eq!(entry.severity, LogSeverity::Error);
    assert_eq!(entry.source, "test::shader");
    assert_eq!(entry.file, Some("render_shader.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    Engine::reset_logger();

    // Goes to the default logger
    Engine::log(LogSeverity::Info, "test", "Message 2".to_string());

    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_integration_engine_warnings_reach_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut looped = Bone::new(1, "loop", NO_PARENT);
    looped.parent = 1;
    let skeleton = Skeleton::new(vec![Bone::new(0, "root", NO_PARENT), looped], Vec::new());
    Engine::reset_logger();

    assert!(skeleton.is_ok());
    let captured = entries.lock().unwrap();
    let warning = captured.iter()
        .find(|e| e.source == "stellar3d::Skeleton")
        .expect("skeleton warning");
    assert_eq!(warning.severity, LogSeverity::Warn);
    assert!(warning.message.contains("'loop'"));
}

#[test]
#[serial]
fn test_integration_failures_are_logged_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let bones = vec![Bone::new(0, "root", NO_PARENT), Bone::new(1, "orphan", 5)];
    let rejected = Skeleton::new(bones, Vec::new());
    let mut graph = RenderableGraph::new();
    let mut core = RenderableCore::default();
    core.skeleton = Some(Skeleton::new(vec![Bone::new(0, "root", NO_PARENT)], Vec::new()).unwrap());
    let actor = graph.create_renderable(core);
    let missing_clip = graph.update_animation(actor, 3, 0.1);
    Engine::reset_logger();

    assert!(matches!(rejected, Err(Error::InvalidResource(_))));
    assert!(matches!(missing_clip, Err(Error::InvalidResource(_))));
    let captured = entries.lock().unwrap();
    let errors: Vec<&LogEntry> = captured.iter()
        .filter(|e| e.severity == LogSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].source, "stellar3d::Skeleton");
    assert!(errors[0].message.contains("'orphan'"));
    assert_eq!(errors[1].source, "stellar3d::RenderableGraph");
    assert!(errors.iter().all(|e| e.file.is_some() && e.line.is_some()));
}
