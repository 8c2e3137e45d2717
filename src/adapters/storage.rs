use crate::domain::ports::Storage;
use crate::utils::error::{GuildError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes files under a base directory.
///
/// Data goes to a temporary sibling first and is renamed into place, so a
/// reader never sees a half-written report. The write runs on a blocking
/// task and finishes even if the calling future is dropped.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

fn write_atomic(full_path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = full_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = full_path.as_os_str().to_owned();
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp_path = PathBuf::from(tmp_name);

    let written =
        std::fs::write(&tmp_path, data).and_then(|_| std::fs::rename(&tmp_path, full_path));
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    written
}

fn join_error(e: tokio::task::JoinError) -> GuildError {
    GuildError::IoError(std::io::Error::other(e))
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = data.to_vec();

        let location = tokio::task::spawn_blocking(move || {
            write_atomic(&full_path, &data).map(|_| full_path.display().to_string())
        })
        .await
        .map_err(join_error)??;

        Ok(location)
    }
}

/// Sends the report to standard output; the path is ignored.
#[derive(Debug, Clone, Default)]
pub struct StdoutStorage;

impl Storage for StdoutStorage {
    async fn write_file(&self, _path: &str, data: &[u8]) -> Result<String> {
        let data = data.to_vec();

        // 整份報告一次寫完，呼叫端被取消也不會留下半截 JSON
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()
        })
        .await
        .map_err(join_error)??;

        Ok("<stdout>".to_string())
    }
}
