//! GitHub Actions runner file commands and annotations

use crate::error::{TreeCacheError, TreeCacheResult};
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Whether we are running inside a GitHub Actions job
pub fn is_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Encode a `name<<DELIM` multi-line record, the format read back by the
/// runner from `$GITHUB_ENV`, `$GITHUB_STATE` and `$GITHUB_OUTPUT`.
pub fn file_command_entry(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Append one record to a runner file command
pub async fn append_file_command(path: &Path, name: &str, value: &str) -> TreeCacheResult<()> {
    let entry = file_command_entry(name, value);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| TreeCacheError::io(format!("opening {}", path.display()), e))?;

    file.write_all(entry.as_bytes())
        .await
        .map_err(|e| TreeCacheError::io(format!("writing {}", path.display()), e))?;
    file.flush()
        .await
        .map_err(|e| TreeCacheError::io(format!("flushing {}", path.display()), e))?;
    Ok(())
}

/// `::error::` workflow command marking the step as failed in the job log
pub fn error_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}
