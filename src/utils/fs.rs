//! 文件写入辅助

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// 先写临时文件再改名，读者不会看到写了一半的文件
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
