//! [`FileSystem`] backed by the local disk through tokio.

use super::{FileStat, FileSystem};
use crate::tree::hasher;
use async_trait::async_trait;
use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn system_time_ms(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64() * 1000.0,
        Err(e) => -(e.duration().as_secs_f64() * 1000.0),
    }
}

#[cfg(unix)]
fn ctime_ms(metadata: &Metadata) -> f64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ctime() as f64 * 1000.0 + metadata.ctime_nsec() as f64 / 1_000_000.0
}

#[cfg(not(unix))]
fn ctime_ms(metadata: &Metadata) -> f64 {
    metadata.created().map(system_time_ms).unwrap_or(0.0)
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let link = tokio::fs::symlink_metadata(path).await?;
        let is_symlink = link.file_type().is_symlink();
        let metadata = if is_symlink {
            match tokio::fs::metadata(path).await {
                Ok(target) => target,
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "Dangling symbolic link");
                    link
                }
            }
        } else {
            link
        };
        Ok(FileStat {
            size: metadata.len(),
            ctime_ms: ctime_ms(&metadata),
            mtime_ms: system_time_ms(metadata.modified()?),
            is_directory: metadata.is_dir(),
            is_file: metadata.is_file(),
            is_symlink,
        })
    }

    async fn partial_content_hash(&self, path: &Path) -> io::Result<String> {
        let mut file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();

        let mut samples = Vec::new();
        for (offset, size) in hasher::sample_ranges(len) {
            file.seek(SeekFrom::Start(offset)).await?;
            let mut buf = vec![0u8; size as usize];
            file.read_exact(&mut buf).await?;
            samples.push(buf);
        }
        trace!(path = %path.display(), len, windows = samples.len(), "Sampled file content");
        Ok(hasher::partial_hash(len, samples.iter().map(Vec::as_slice)))
    }
}
