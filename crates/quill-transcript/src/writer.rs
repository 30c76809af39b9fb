//! Reply writer: appends formatted turns at the current end of the document.
//!
//! Appends are pure insertions at end-of-file. The length is re-read from the
//! open handle on every call because the human may have kept typing since the
//! document was last read.

use quill_core::{config::DocumentFormat, error::QuillError};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::format::{reply_block, user_block, TERMINATOR};

/// Append an assistant reply in the document's reply format.
pub async fn append_reply(
    path: &Path,
    format: DocumentFormat,
    text: &str,
) -> Result<(), QuillError> {
    append_at_end(path, &reply_block(format, text)).await
}

/// Append a user turn followed by the send terminator.
pub async fn append_user_turn(
    path: &Path,
    format: DocumentFormat,
    text: &str,
) -> Result<(), QuillError> {
    let mut block = user_block(format, text);
    // The block already ends with one newline; one more completes the terminator.
    block.push_str(&TERMINATOR[1..]);
    append_at_end(path, &block).await
}

async fn append_at_end(path: &Path, block: &str) -> Result<(), QuillError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map_err(|e| QuillError::Document(format!("failed to open {}: {e}", path.display())))?;

    let len = file
        .metadata()
        .await
        .map_err(|e| QuillError::Document(format!("failed to stat {}: {e}", path.display())))?
        .len();

    file.seek(SeekFrom::Start(len)).await?;
    file.write_all(block.as_bytes()).await?;
    file.flush().await?;

    debug!(
        "write: appended {} bytes to {} at offset {len}",
        block.len(),
        path.display()
    );
    Ok(())
}
