use std::cell::OnceCell;
use std::fmt::Write as _;
use std::io;

use chrono::format::{Item, StrftimeItems};

use crate::config::LayoutConfig;
use crate::escape::{write_escaped, write_escaped_char, write_quoted};
use crate::fields::{FieldKey, FieldRegistry};
use crate::host::{HostNameResolver, SystemHostName};
use crate::record::LogRecord;

/// `tracing` target of the layout's own diagnostics (host name and sink
/// path failures). [`JsonLayer`](crate::layer::JsonLayer) never renders
/// events with this target, so a broken sink cannot feed on itself.
pub const DIAGNOSTIC_TARGET: &str = "json_event_layout::diagnostic";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const FALLBACK_HOST_NAME: &str = "localhost";
const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Looks up the file the rendered lines end up in, for the `path` field.
///
/// `logger` is the name of the logger the record came from. Return
/// `Ok(None)` when the destination is not a file.
pub trait SinkPathResolver {
    fn resolve_sink_path(&self, logger: &str) -> io::Result<Option<String>>;
}

/// Resolver for layouts that never write to a file.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSinkPath;

impl SinkPathResolver for NoSinkPath {
    fn resolve_sink_path(&self, _logger: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

impl<F> SinkPathResolver for F
where
    F: Fn(&str) -> io::Result<Option<String>>,
{
    fn resolve_sink_path(&self, logger: &str) -> io::Result<Option<String>> {
        self(logger)
    }
}

/// Renders [`LogRecord`]s as single-line, Logstash style JSON objects.
///
/// Fields are written in a fixed order; configuration only decides which of
/// them appear and under which label:
///
/// `exception`, static fields, `level`, `location`, `logger`, `message`,
/// `mdc`, `ndc`, `host`, `path`, `tags`, `@timestamp`, `thread`,
/// `@version`.
///
/// A layout owns its output buffer and reuses it for every record, so
/// [`render`](Self::render) takes `&mut self` and the type is `Send` but
/// not `Sync`. Use one layout per thread or task.
pub struct JsonLayout {
    registry: FieldRegistry,
    host_name: String,
    tags: Vec<String>,
    static_fields: Vec<(String, String)>,
    buf: String,
    scratch: String,
    timestamp_format: Vec<Item<'static>>,
    sink_path: Box<dyn SinkPathResolver + Send>,
    resolved_path: OnceCell<Option<String>>,
}

impl JsonLayout {
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Value of the `@version` field.
    pub const VERSION: &'static str = "1";

    /// Layout using the operating system's host name and no sink path.
    pub fn new(config: &LayoutConfig) -> Self {
        Self::with_resolvers(config, &SystemHostName, NoSinkPath)
    }

    /// Layout with injected host name and sink path lookups.
    ///
    /// `host` is consulted right away, and only if `config` carries no
    /// host name. `sink_path` is consulted at most once, on the first
    /// record rendered with the `path` field enabled.
    pub fn with_resolvers(
        config: &LayoutConfig,
        host: &dyn HostNameResolver,
        sink_path: impl SinkPathResolver + Send + 'static,
    ) -> Self {
        let mut layout = JsonLayout {
            registry: FieldRegistry::new(),
            host_name: String::new(),
            tags: Vec::new(),
            static_fields: Vec::new(),
            buf: String::with_capacity(INITIAL_BUFFER_CAPACITY),
            scratch: String::new(),
            timestamp_format: StrftimeItems::new(TIMESTAMP_FORMAT).collect(),
            sink_path: Box::new(sink_path),
            resolved_path: OnceCell::new(),
        };
        layout.apply_config(config, host);
        layout
    }

    /// (Re)apply configuration. The field registry, tags, static fields and
    /// host name are rebuilt from scratch; the cached sink path is kept.
    pub fn apply_config(&mut self, config: &LayoutConfig, host: &dyn HostNameResolver) {
        self.registry = FieldRegistry::configured(config);
        self.tags = config.tag_list();
        self.static_fields = config.static_fields();
        self.host_name = match &config.host_name {
            Some(name) => name.clone(),
            None => host.resolve_host_name().unwrap_or_else(|error| {
                tracing::error!(
                    target: DIAGNOSTIC_TARGET,
                    error = %error,
                    "unable to determine name of the local host, using {}",
                    FALLBACK_HOST_NAME
                );
                FALLBACK_HOST_NAME.to_string()
            }),
        };
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// `true` when the `exception` field is disabled, so callers can skip
    /// collecting error details altogether.
    pub fn ignores_error(&self) -> bool {
        !self.registry.is_enabled(FieldKey::Exception)
    }

    /// Render `record` as one JSON object followed by `\n`.
    ///
    /// The returned slice borrows the layout's buffer and is overwritten by
    /// the next call.
    pub fn render(&mut self, record: &LogRecord) -> &str {
        self.buf.clear();
        self.scratch.clear();
        self.write_record(record);
        &self.buf
    }

    fn write_record(&mut self, record: &LogRecord) {
        let JsonLayout {
            registry,
            host_name,
            tags,
            static_fields,
            buf,
            scratch,
            timestamp_format,
            sink_path,
            resolved_path,
        } = self;

        let mut obj = ObjectWriter::open(buf);

        if registry.is_enabled(FieldKey::Exception) {
            if let Some(error) = &record.error {
                obj.key(registry.label(FieldKey::Exception));
                let mut inner = ObjectWriter::open(obj.out);
                if registry.is_enabled(FieldKey::ExceptionMessage) {
                    if let Some(message) = &error.message {
                        inner.string(registry.label(FieldKey::ExceptionMessage), message);
                    }
                }
                if registry.is_enabled(FieldKey::ExceptionClass) {
                    if let Some(class_name) = &error.class_name {
                        inner.string(registry.label(FieldKey::ExceptionClass), class_name);
                    }
                }
                if registry.is_enabled(FieldKey::ExceptionStacktrace) && !error.stack_trace.is_empty() {
                    inner.key(registry.label(FieldKey::ExceptionStacktrace));
                    inner.out.push('"');
                    for (idx, frame) in error.stack_trace.iter().enumerate() {
                        if idx > 0 {
                            write_escaped_char(inner.out, '\n');
                        }
                        write_escaped(inner.out, frame);
                    }
                    inner.out.push('"');
                }
                inner.close();
            }
        }

        for (name, value) in static_fields.iter() {
            obj.string(name, value);
        }

        if registry.is_enabled(FieldKey::Level) {
            obj.string(registry.label(FieldKey::Level), &record.level);
        }

        if registry.is_enabled(FieldKey::Location) {
            if let Some(location) = &record.location {
                obj.key(registry.label(FieldKey::Location));
                let mut inner = ObjectWriter::open(obj.out);
                let parts = [
                    (FieldKey::LocationClass, &location.class),
                    (FieldKey::LocationFile, &location.file),
                    (FieldKey::LocationMethod, &location.method),
                    (FieldKey::LocationLine, &location.line),
                ];
                for (key, value) in parts {
                    if let Some(value) = value {
                        if registry.is_enabled(key) {
                            inner.string(registry.label(key), value);
                        }
                    }
                }
                inner.close();
            }
        }

        if registry.is_enabled(FieldKey::Logger) {
            obj.string(registry.label(FieldKey::Logger), &record.logger);
        }

        if registry.is_enabled(FieldKey::Message) {
            if let Some(message) = &record.message {
                obj.string(registry.label(FieldKey::Message), message);
            }
        }

        if registry.is_enabled(FieldKey::Mdc) && !record.context.is_empty() {
            obj.key(registry.label(FieldKey::Mdc));
            let mut inner = ObjectWriter::open(obj.out);
            for (key, value) in &record.context {
                match value {
                    serde_json::Value::String(text) => inner.string(key, text),
                    other => {
                        scratch.clear();
                        let _ = write!(scratch, "{}", other);
                        inner.string(key, scratch);
                    }
                }
            }
            inner.close();
        }

        if registry.is_enabled(FieldKey::Ndc) {
            if let Some(ndc) = record.ndc.as_deref().filter(|ndc| !ndc.is_empty()) {
                obj.string(registry.label(FieldKey::Ndc), ndc);
            }
        }

        if registry.is_enabled(FieldKey::Host) {
            obj.string(registry.label(FieldKey::Host), host_name);
        }

        if registry.is_enabled(FieldKey::Path) {
            let path = resolved_path.get_or_init(|| resolve_path(&**sink_path, &record.logger));
            if let Some(path) = path {
                obj.string(registry.label(FieldKey::Path), path);
            }
        }

        if registry.is_enabled(FieldKey::Tags) && !tags.is_empty() {
            obj.key(registry.label(FieldKey::Tags));
            obj.out.push('[');
            for (idx, tag) in tags.iter().enumerate() {
                if idx > 0 {
                    obj.out.push(',');
                }
                write_quoted(obj.out, tag);
            }
            obj.out.push(']');
        }

        if registry.is_enabled(FieldKey::Timestamp) {
            scratch.clear();
            let _ = write!(scratch, "{}", record.timestamp.format_with_items(timestamp_format.iter()));
            obj.string(registry.label(FieldKey::Timestamp), scratch);
        }

        if registry.is_enabled(FieldKey::Thread) {
            obj.string(registry.label(FieldKey::Thread), &record.thread);
        }

        if registry.is_enabled(FieldKey::Version) {
            obj.string(registry.label(FieldKey::Version), Self::VERSION);
        }

        obj.close();
        buf.push('\n');
    }
}

fn resolve_path(resolver: &dyn SinkPathResolver, logger: &str) -> Option<String> {
    match resolver.resolve_sink_path(logger) {
        Ok(path) => path.filter(|path| !path.is_empty()),
        Err(error) => {
            tracing::error!(
                target: DIAGNOSTIC_TARGET,
                error = %error,
                "unable to retrieve the sink's file path"
            );
            None
        }
    }
}

/// Writes the members of one JSON object, putting a comma before every
/// member but the first.
struct ObjectWriter<'a> {
    out: &'a mut String,
    empty: bool,
}

impl<'a> ObjectWriter<'a> {
    fn open(out: &'a mut String) -> Self {
        out.push('{');
        ObjectWriter { out, empty: true }
    }

    /// Start a member; the caller writes the value.
    fn key(&mut self, label: &str) {
        if !self.empty {
            self.out.push(',');
        }
        self.empty = false;
        write_quoted(self.out, label);
        self.out.push(':');
    }

    fn string(&mut self, label: &str, value: &str) {
        self.key(label);
        write_quoted(self.out, value);
    }

    fn close(self) {
        self.out.push('}');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixedHostName;
    use crate::record::{ErrorInfo, LocationInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layout(config: LayoutConfig) -> JsonLayout {
        JsonLayout::with_resolvers(&config, &FixedHostName("testhost".into()), NoSinkPath)
    }

    fn record() -> LogRecord {
        LogRecord::new("INFO", "app.Main", "hello")
            .with_timestamp_millis(0)
            .with_thread("main")
    }

    #[test]
    fn renders_default_fields_in_order() {
        let mut layout = layout(LayoutConfig::default());
        assert_eq!(
            layout.render(&record()),
            "{\"level\":\"INFO\",\"logger\":\"app.Main\",\"message\":\"hello\",\
             \"host\":\"testhost\",\"@timestamp\":\"1970-01-01T00:00:00.000Z\",\
             \"thread\":\"main\",\"@version\":\"1\"}\n"
        );
    }

    #[test]
    fn buffer_is_reset_between_records() {
        let mut layout = layout(LayoutConfig::default().with_excluded_fields("host"));
        let first = layout.render(&record()).to_string();
        let second = layout.render(&record()).to_string();
        assert_eq!(first, second);
        assert_eq!(second.matches('\n').count(), 1);
    }

    #[test]
    fn timestamp_keeps_milliseconds() {
        let mut layout = layout(LayoutConfig::default());
        let line = layout.render(&record().with_timestamp_millis(1_700_000_000_123)).to_string();
        assert!(line.contains("\"@timestamp\":\"2023-11-14T22:13:20.123Z\""), "{line}");
    }

    #[test]
    fn stacktrace_frames_are_joined_with_escaped_newlines() {
        let mut layout = layout(LayoutConfig::default().with_excluded_fields("level,logger,message,host,@timestamp,thread,@version"));
        let error = ErrorInfo {
            message: Some("boom".into()),
            class_name: Some("io::Error".into()),
            stack_trace: vec!["boom".into(), "\tat main".into()],
        };
        assert_eq!(
            layout.render(&record().with_error(error)),
            "{\"exception\":{\"message\":\"boom\",\"class\":\"io::Error\",\"stacktrace\":\"boom\\n\\tat main\"}}\n"
        );
    }

    #[test]
    fn location_parts_are_comma_joined_where_present() {
        let mut layout = layout(
            LayoutConfig::default()
                .with_included_fields("location")
                .with_excluded_fields("level,logger,message,host,@timestamp,thread,@version"),
        );
        let location = LocationInfo {
            class: None,
            file: Some("src/main.rs".into()),
            method: None,
            line: Some("42".into()),
        };
        assert_eq!(
            layout.render(&record().with_location(location)),
            "{\"location\":{\"file\":\"src\\/main.rs\",\"line\":\"42\"}}\n"
        );
    }

    #[test]
    fn context_values_render_as_strings() {
        let mut layout = layout(LayoutConfig::default().with_excluded_fields("level,logger,message,host,@timestamp,thread,@version"));
        let record = record()
            .with_context("user", "alice")
            .with_context("attempt", 3)
            .with_context("admin", false);
        assert_eq!(
            layout.render(&record),
            "{\"mdc\":{\"admin\":\"false\",\"attempt\":\"3\",\"user\":\"alice\"}}\n"
        );
    }

    #[test]
    fn everything_disabled_renders_empty_object() {
        let mut layout = layout(LayoutConfig::default().with_excluded_fields("e,l,m,n,h,p,t,@"));
        assert_eq!(layout.render(&record().with_error(ErrorInfo::default())), "{}\n");
    }

    #[test]
    fn sink_path_is_resolved_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut layout = JsonLayout::with_resolvers(
            &LayoutConfig::default().with_host_name("h"),
            &SystemHostName,
            |logger: &str| -> io::Result<Option<String>> {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Some(format!("/var/log/{logger}.json")))
            },
        );
        let first = layout.render(&record()).to_string();
        layout.render(&record());
        assert!(first.contains("\"path\":\"\\/var\\/log\\/app.Main.json\""), "{first}");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_sink_path_is_not_retried() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut layout = JsonLayout::with_resolvers(
            &LayoutConfig::default().with_host_name("h"),
            &SystemHostName,
            |_: &str| -> io::Result<Option<String>> {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
            },
        );
        for _ in 0..3 {
            assert!(!layout.render(&record()).contains("\"path\""));
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn host_failure_falls_back_to_localhost() {
        let failing = || -> Result<String, crate::error::HostResolutionError> {
            Err(crate::error::HostResolutionError::Empty)
        };
        let layout = JsonLayout::with_resolvers(&LayoutConfig::default(), &failing, NoSinkPath);
        assert_eq!(layout.host_name(), "localhost");
    }

    #[test]
    fn configured_host_name_skips_resolution() {
        let failing = || -> Result<String, crate::error::HostResolutionError> {
            panic!("host resolver must not be called")
        };
        let layout = JsonLayout::with_resolvers(
            &LayoutConfig::default().with_host_name("web-1"),
            &failing,
            NoSinkPath,
        );
        assert_eq!(layout.host_name(), "web-1");
    }

    #[test]
    fn ignores_error_follows_exception_field() {
        assert!(!layout(LayoutConfig::default()).ignores_error());
        assert!(layout(LayoutConfig::default().with_excluded_fields("exception")).ignores_error());
    }

    #[test]
    fn apply_config_rebuilds_registry() {
        let mut layout = layout(LayoutConfig::default().with_excluded_fields("level"));
        assert!(!layout.registry().is_enabled(FieldKey::Level));
        layout.apply_config(&LayoutConfig::default().with_host_name("other"), &SystemHostName);
        assert!(layout.registry().is_enabled(FieldKey::Level));
        assert_eq!(layout.host_name(), "other");
    }
}
