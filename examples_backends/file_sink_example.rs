use std::sync::Arc;

use json_event_layout::env::env_or;
use json_event_layout::file_sink::FileSink;
use json_event_layout::init::{init_json_logging_with_config, LayerConfig};
use json_event_layout::LayoutConfig;
use tracing::{error, info, info_span};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Pick the output file; `LOG_FILE` overrides the default.
    let path = env_or("LOG_FILE", "app.json");
    let sink = FileSink::open(&path).await?;

    // 2) Layout options come from `JSON_LAYOUT_*`, with a few defaults.
    let mut layout = LayoutConfig::from_env();
    if layout.tags.is_none() {
        layout.tags = Some("example, file".to_string());
    }
    if layout.included_fields.is_none() {
        layout.included_fields = Some("location".to_string());
    }

    let config = LayerConfig {
        enable_stdout: true,
        ..LayerConfig::default()
    };
    init_json_logging_with_config(Arc::new(sink), &layout, config)?;

    // 3) Emit some events; spans show up as `ndc`, fields as `mdc`.
    info!("service started");
    let span = info_span!("checkout");
    let _guard = span.enter();
    error!(order_id = 123, "order failed");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    println!("wrote JSON lines to {}", path);
    Ok(())
}
