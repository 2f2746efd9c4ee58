use crate::domain::LogRecord;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// File name of the fallback store inside the configured log directory.
pub const FALLBACK_FILE_NAME: &str = "fallback-logs.json";

#[derive(Error, Debug)]
pub enum LocalPersistenceError {
    #[error("failed to create fallback directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to append to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fallback file {} would exceed {limit} bytes", path.display())]
    CapacityExceeded { path: PathBuf, limit: u64 },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt entry on line {line} of {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// The last-resort sink.
pub trait LocalSink: Send + Sync {
    fn save(
        &self,
        record: &LogRecord,
    ) -> impl Future<Output = Result<(), LocalPersistenceError>> + Send;
}

#[derive(Debug, Clone)]
pub struct DiskConfig {
    pub log_dir: PathBuf,
    /// Upper bound for the fallback file; `None` means unbounded.
    pub max_file_bytes: Option<u64>,
    pub sync_on_write: bool,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            max_file_bytes: Some(512 * 1024 * 1024), // 512MB
            sync_on_write: false,
        }
    }
}

/// Append-only NDJSON store at `<log_dir>/fallback-logs.json`.
///
/// Every record is written with a single `write_all` to a file opened in
/// append mode. Appends from clones of one `DiskFallback` are additionally
/// serialized by a shared mutex.
#[derive(Debug, Clone)]
pub struct DiskFallback {
    config: DiskConfig,
    file_path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl DiskFallback {
    pub fn new(config: DiskConfig) -> Self {
        let file_path = config.log_dir.join(FALLBACK_FILE_NAME);
        Self {
            config,
            file_path,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn config(&self) -> &DiskConfig {
        &self.config
    }

    pub async fn current_size(&self) -> Result<u64, LocalPersistenceError> {
        match fs::metadata(&self.file_path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(LocalPersistenceError::Read {
                path: self.file_path.clone(),
                source,
            }),
        }
    }

    /// Reads every stored record back, oldest first. A missing file is empty.
    pub async fn load_records(&self) -> Result<Vec<LogRecord>, LocalPersistenceError> {
        let content = match fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LocalPersistenceError::Read {
                    path: self.file_path.clone(),
                    source,
                });
            }
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| LocalPersistenceError::Corrupt {
                    path: self.file_path.clone(),
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }

    fn encode_line(record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        Ok(line)
    }

    async fn append(&self, line: &[u8]) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await?;

        file.write_all(line).await?;
        file.flush().await?;

        if self.config.sync_on_write {
            file.sync_data().await?;
        }
        Ok(())
    }
}

impl LocalSink for DiskFallback {
    async fn save(&self, record: &LogRecord) -> Result<(), LocalPersistenceError> {
        fs::create_dir_all(&self.config.log_dir)
            .await
            .map_err(|source| LocalPersistenceError::CreateDir {
                path: self.config.log_dir.clone(),
                source,
            })?;

        let line = Self::encode_line(record)?;

        let _guard = self.append_lock.lock().await;

        if let Some(limit) = self.config.max_file_bytes {
            let current = self.current_size().await?;
            if current + line.len() as u64 > limit {
                return Err(LocalPersistenceError::CapacityExceeded {
                    path: self.file_path.clone(),
                    limit,
                });
            }
        }

        self.append(&line)
            .await
            .map_err(|source| LocalPersistenceError::Write {
                path: self.file_path.clone(),
                source,
            })?;

        tracing::debug!(
            "Stored record to {} ({} bytes)",
            self.file_path.display(),
            line.len()
        );
        Ok(())
    }
}
