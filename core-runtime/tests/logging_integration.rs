//! Integration tests for logging system

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

#[derive(Default)]
struct CapturingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CapturingSink {
    async fn log(&self, entry: LogEntry) -> BridgeResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// The global subscriber can only be installed once per process, so the whole
// lifecycle lives in one test.
#[test]
fn test_logging_lifecycle() {
    let sink = Arc::new(CapturingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    tracing::debug!(target: "core_sync::coordinator", added = 2u64, "Sync completed");
    tracing::trace!(target: "core_sync::coordinator", "below the filter");
    tracing::info!(target: "hyper::proto", "outside the workspace filter");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Debug);
        assert_eq!(entries[0].message, "Sync completed");
        assert_eq!(entries[0].fields.get("added"), Some(&"2".to_string()));
    }

    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_filter_rejected() {
    let config = LoggingConfig::default().with_filter("core_sync=notalevel");
    let result = init_logging(config);
    assert!(result.is_err());
}
