//! 待复查清单 - 业务能力层
//!
//! 只负责"写 review.txt"能力：最后一次宽松重试渲染出的文件需要人工检查

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

/// 待复查清单写入服务
///
/// 职责：
/// - 追加单个产物文件的路径和原因
/// - 不关心流程顺序
pub struct ReviewWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReviewWriter {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    pub async fn write(&self, context: &str, artifact: &Path) -> Result<()> {
        debug!("加入复查清单: {} | {}", context, artifact.display());

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let line = format!(
            "{} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            context,
            artifact.display()
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_appends_lines() {
        let dir = TempDir::new().unwrap();
        let writer = ReviewWriter::with_path(dir.path().join("review.txt"));

        writer.write("[题目 0001 two-sum]", Path::new("a.pdf")).await.unwrap();
        writer.write("[题目 0001 two-sum]", Path::new("b.pdf")).await.unwrap();

        let content = tokio::fs::read_to_string(writer.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| [题目 0001 two-sum] | a.pdf"));
        assert!(lines[1].ends_with("b.pdf"));
    }
}
