use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of a single log event, as handed to
/// [`JsonLayout::render`](crate::layout::JsonLayout::render).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub logger: String,
    pub message: Option<String>,
    pub thread: String,
    pub location: Option<LocationInfo>,
    pub error: Option<ErrorInfo>,
    /// Contextual key/value pairs, rendered under `mdc`.
    pub context: BTreeMap<String, serde_json::Value>,
    /// Nested diagnostic context.
    pub ndc: Option<String>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, logger: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level: level.into(),
            logger: logger.into(),
            message: Some(message.into()),
            thread: std::thread::current().name().unwrap_or("unnamed").to_string(),
            location: None,
            error: None,
            context: BTreeMap::new(),
            ndc: None,
        }
    }

    /// Set the timestamp from milliseconds since the Unix epoch. Values
    /// outside chrono's range leave the timestamp unchanged.
    pub fn with_timestamp_millis(mut self, millis: i64) -> Self {
        if let Some(ts) = DateTime::<Utc>::from_timestamp_millis(millis) {
            self.timestamp = ts;
        }
        self
    }

    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = thread.into();
        self
    }

    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_ndc(mut self, ndc: impl Into<String>) -> Self {
        self.ndc = Some(ndc.into());
        self
    }
}

/// Call site of a log event. Any part may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocationInfo {
    pub class: Option<String>,
    pub file: Option<String>,
    pub method: Option<String>,
    pub line: Option<String>,
}

/// Error attached to a log event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub message: Option<String>,
    /// Type name of the error, when the producer knows it.
    pub class_name: Option<String>,
    /// Stack trace, one frame per entry.
    pub stack_trace: Vec<String>,
}

impl ErrorInfo {
    /// Capture an error and its `source()` chain. The first frame is the
    /// error itself, each cause follows as `Caused by: ...`.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack_trace = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            stack_trace.push(format!("Caused by: {}", cause));
            source = cause.source();
        }
        ErrorInfo {
            message: Some(error.to_string()),
            class_name: None,
            stack_trace,
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}
