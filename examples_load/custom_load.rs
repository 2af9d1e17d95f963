use std::time::Instant;

use json_event_layout::host::FixedHostName;
use json_event_layout::{ErrorInfo, JsonLayout, LayoutConfig, LogRecord, NoSinkPath};

/// Renders records directly, without the tracing layer, to measure the
/// layout on its own.
fn main() {
    let config = LayoutConfig::default()
        .with_included_fields("location")
        .with_tags("load, bench")
        .with_fields("app=load-test; env=local")
        .with_renamed_fields("@timestamp:time");
    let mut layout = JsonLayout::with_resolvers(&config, &FixedHostName("bench".to_string()), NoSinkPath);

    let record = LogRecord::new("ERROR", "load::custom", "custom load test error \"with quotes\"")
        .with_context("user_id", 42)
        .with_context("path", "/api/v1/orders")
        .with_ndc("request handler")
        .with_error(ErrorInfo {
            message: Some("connection reset".to_string()),
            class_name: Some("std::io::Error".to_string()),
            stack_trace: vec!["connection reset".to_string(), "Caused by: os error 104".to_string()],
        });

    let n: u64 = 1_000_000;
    let start = Instant::now();
    let mut bytes = 0usize;

    for _ in 0..n {
        bytes += layout.render(&record).len();
    }

    let elapsed = start.elapsed();
    println!("custom config: rendered {} records ({} bytes) in {:?} (~{:.0} rec/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    print!("{}", layout.render(&record));
}
