use std::sync::Arc;

use async_trait::async_trait;
use json_event_layout::{init::init_json_logging, sink::LogSink, LayoutConfig};
use tracing::{error, info};

/// Example of integrating a completely custom destination by implementing
/// the `LogSink` trait directly. Imagine this talks to some log shipper
/// for which this crate does not provide a built-in sink.
struct StdoutSink;

#[async_trait]
impl LogSink for StdoutSink {
    async fn send(&self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Lines already end with '\n'.
        print!("{}", line);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(StdoutSink);

    init_json_logging(sink, &LayoutConfig::from_env())?;

    info!("custom backend example started");
    error!(db = "my-custom-db", "simulated error sent via custom backend");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    Ok(())
}
