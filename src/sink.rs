use async_trait::async_trait;
use std::error::Error;
use std::io;
use std::path::PathBuf;

use crate::layout::SinkPathResolver;

/// Asynchronous destination for rendered JSON lines.
///
/// Implementations are responsible for getting each line to a concrete
/// destination (a file, stdout, a socket, ...). The layer calls `send`
/// from a background task and never awaits it on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Write a single rendered line.
    ///
    /// **Parameters**
    /// - `line`: one JSON object including its trailing `\n`.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted.
    /// - `Err(..)` if the destination failed. The layer reports the error
    ///   and moves on to the next record; lines are not retried.
    async fn send(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered output, if the sink buffers.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    /// Canonical path of the file this sink writes to, if it writes to one.
    /// Feeds the layout's `path` field.
    fn file_path(&self) -> io::Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Exposes a sink's [`LogSink::file_path`] to the layout.
pub(crate) struct SinkFilePath<S: ?Sized>(pub(crate) std::sync::Arc<S>);

impl<S: LogSink + ?Sized> SinkPathResolver for SinkFilePath<S> {
    fn resolve_sink_path(&self, _logger: &str) -> io::Result<Option<String>> {
        Ok(self
            .0
            .file_path()?
            .map(|path| path.to_string_lossy().into_owned()))
    }
}
