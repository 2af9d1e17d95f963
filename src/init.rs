use crate::config::LayoutConfig;
use crate::layer::JsonLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer itself (as opposed to the JSON
/// layout, see [`LayoutConfig`]).
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`LogRecord`]s queued for the
///   background task before new records are dropped.
/// - `max_level`: most verbose level that is written; more verbose events
///   are ignored.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`JsonLayer`] and events are also printed to
///   the console.
///
/// [`LogRecord`]: crate::record::LogRecord
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub max_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            max_level: Level::INFO,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber that writes every event as a JSON
/// line to `sink`.
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] receiving rendered lines.
/// - `layout`: [`LayoutConfig`] of the JSON layout.
/// - `config`: [`LayerConfig`] controlling buffering and filtering.
///
/// **Errors**
///
/// Fails if a global default subscriber has already been set.
///
/// Must be called from within a Tokio runtime, since the layer spawns its
/// background task right away.
pub fn init_json_logging_with_config(
    sink: Arc<dyn LogSink>,
    layout: &LayoutConfig,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let (layer, _handle) = JsonLayer::new(sink, layout, config.channel_buffer, config.max_level);

    // Two subscriber shapes, since the optional `fmt` layer changes the type.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Install JSON logging with [`LayerConfig::default`].
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] receiving rendered lines.
/// - `layout`: [`LayoutConfig`] of the JSON layout; use
///   [`LayoutConfig::from_env`] to take it from `JSON_LAYOUT_*` variables.
pub fn init_json_logging(sink: Arc<dyn LogSink>, layout: &LayoutConfig) -> Result<(), SetGlobalDefaultError> {
    init_json_logging_with_config(sink, layout, LayerConfig::default())
}
