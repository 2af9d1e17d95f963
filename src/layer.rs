use crate::config::LayoutConfig;
use crate::fields::FieldKey;
use crate::host::SystemHostName;
use crate::layout::{JsonLayout, DIAGNOSTIC_TARGET};
use crate::record::{ErrorInfo, LocationInfo, LogRecord};
use crate::sink::{LogSink, SinkFilePath};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// writes them, rendered by a [`JsonLayout`], to a [`LogSink`].
///
/// Records travel over a bounded channel to a background task that owns
/// the layout exclusively, so rendering and I/O never happen on
/// application threads. When the channel is full the record is dropped
/// and counted.
pub struct JsonLayer {
    sender: mpsc::Sender<LogRecord>,
    max_level: Level,
    capture_location: bool,
    capture_errors: bool,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl JsonLayer {
    /// Create a new layer and spawn the background task that renders
    /// records and sends them to `sink`.
    ///
    /// Must be called from within a Tokio runtime. The task ends once the
    /// layer is dropped and the channel drained; the sink is flushed then.
    pub fn new(
        sink: Arc<dyn LogSink>,
        layout_config: &LayoutConfig,
        buffer: usize,
        max_level: Level,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let mut layout = JsonLayout::with_resolvers(
            layout_config,
            &SystemHostName,
            SinkFilePath(Arc::clone(&sink)),
        );
        let capture_location = layout.registry().is_enabled(FieldKey::Location);
        let capture_errors = !layout.ignores_error();

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let line = layout.render(&record);
                if let Err(e) = sink.send(line).await {
                    eprintln!("error writing log line: {}", e);
                }
            }
            if let Err(e) = sink.flush().await {
                eprintln!("error flushing log sink: {}", e);
            }
        });

        (Self {
            sender: tx,
            max_level,
            capture_location,
            capture_errors,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }, handle)
    }
}

impl<S> Layer<S> for JsonLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.max_level || meta.target() == DIAGNOSTIC_TARGET {
            return;
        }

        let mut visitor = RecordVisitor {
            context: BTreeMap::new(),
            message: None,
            error: None,
            capture_errors: self.capture_errors,
        };
        event.record(&mut visitor);

        let location = if self.capture_location {
            Some(LocationInfo {
                class: meta.module_path().map(|s| s.to_string()),
                file: meta.file().map(|s| s.to_string()),
                method: None,
                line: meta.line().map(|l| l.to_string()),
            })
        } else {
            None
        };

        // Enclosing spans, outermost first, play the part of the NDC stack.
        let ndc = ctx.event_scope(event).map(|scope| {
            scope
                .from_root()
                .map(|span| span.name())
                .collect::<Vec<_>>()
                .join(" ")
        });

        let thread = std::thread::current();
        let record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            logger: meta.target().to_string(),
            message: visitor.message,
            thread: thread
                .name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{:?}", thread.id())),
            location,
            error: visitor.error,
            context: visitor.context,
            ndc,
        };

        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log record");
            }
        }
    }
}

use tracing::field::{Field, Visit};

/// Collects an event's fields into the parts of a [`LogRecord`].
struct RecordVisitor {
    context: BTreeMap<String, serde_json::Value>,
    message: Option<String>,
    error: Option<ErrorInfo>,
    capture_errors: bool,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.context.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.context.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.context.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.context.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.context.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.capture_errors && self.error.is_none() {
            self.error = Some(ErrorInfo::from_error(value));
        } else {
            self.context.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.context.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
