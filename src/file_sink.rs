use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends rendered lines to a single file.
///
/// The file is opened in append mode and created if missing, and every line
/// is flushed as soon as it is written. Rotation is left to external tooling
/// (logrotate with `copytruncate`, or similar).
pub struct FileSink {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(FileSink {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path as given to [`FileSink::open`].
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileSink {
    async fn send(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        Ok(())
    }

    fn file_path(&self) -> io::Result<Option<PathBuf>> {
        if self.path.as_os_str().is_empty() {
            return Ok(None);
        }
        std::fs::canonicalize(&self.path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_lines_and_reports_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");

        let sink = FileSink::open(&path).await.unwrap();
        sink.send("{\"a\":\"1\"}\n").await.unwrap();
        sink.send("{\"a\":\"2\"}\n").await.unwrap();
        sink.flush().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\"a\":\"1\"}\n{\"a\":\"2\"}\n");

        let reported = sink.file_path().unwrap().unwrap();
        assert_eq!(reported, std::fs::canonicalize(&path).unwrap());
        assert!(reported.is_absolute());
    }

    #[tokio::test]
    async fn reopening_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");

        let first = FileSink::open(&path).await.unwrap();
        first.send("first\n").await.unwrap();
        drop(first);
        let sink = FileSink::open(&path).await.unwrap();
        sink.send("second\n").await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
