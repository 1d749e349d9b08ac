//! 产物文件布局 - 业务能力层
//!
//! 每道题一个文件夹 `{题号:04}-{slug}`，文件名里编码了类型和语言：
//! `0001-Question-C#.pdf`、`0001-Solution-Java.pdf`、`0001-Solution-Comments.pdf`、
//! `0001-Solution-Comments-Expanded.pdf`。磁盘上有没有文件本身就是元数据。

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::models::Item;

static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+-(Solution-Comments-Expanded|Solution-Comments|Question|Solution)(?:-(.+))?\.pdf$")
        .unwrap_or_else(|e| unreachable!("产物文件名正则无效: {}", e))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Question,
    Solution,
    SolutionComments,
    SolutionCommentsExpanded,
}

impl ArtifactKind {
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Question => "Question",
            ArtifactKind::Solution => "Solution",
            ArtifactKind::SolutionComments => "Solution-Comments",
            ArtifactKind::SolutionCommentsExpanded => "Solution-Comments-Expanded",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "Question" => Some(ArtifactKind::Question),
            "Solution" => Some(ArtifactKind::Solution),
            "Solution-Comments" => Some(ArtifactKind::SolutionComments),
            "Solution-Comments-Expanded" => Some(ArtifactKind::SolutionCommentsExpanded),
            _ => None,
        }
    }
}

/// 语言名在文件名中的写法
pub fn language_to_file_name(language: &str) -> String {
    language.replace("MS SQL Server", "MSSQL").replace(' ', "")
}

/// 某道题在磁盘上已有的产物
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactInventory {
    /// 题目文件的语言（文件名写法），无语言的记为空串
    pub question: BTreeSet<String>,
    /// 题解文件的语言（文件名写法）
    pub solution: BTreeSet<String>,
    /// 评论区文件数量（普通 + 展开）
    pub comments: usize,
}

impl ArtifactInventory {
    pub fn has_question(&self, variant: Option<&str>) -> bool {
        let key = variant.map(language_to_file_name).unwrap_or_default();
        self.question.contains(&key)
    }

    pub fn solution_count(&self) -> usize {
        self.solution.len()
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn item_folder(&self, item: &Item) -> PathBuf {
        self.root.join(format!("{:04}-{}", item.display_id(), item.slug()))
    }

    pub fn path(&self, item: &Item, kind: ArtifactKind, variant: Option<&str>) -> PathBuf {
        let name = match variant {
            Some(variant) => format!(
                "{:04}-{}-{}.pdf",
                item.display_id(),
                kind.label(),
                language_to_file_name(variant)
            ),
            None => format!("{:04}-{}.pdf", item.display_id(), kind.label()),
        };
        self.item_folder(item).join(name)
    }

    /// 扫描题目文件夹；文件夹不存在时返回空清单
    pub async fn inventory(&self, item: &Item) -> Result<ArtifactInventory> {
        let folder = self.item_folder(item);
        let mut inventory = ArtifactInventory::default();
        if !tokio::fs::try_exists(&folder).await? {
            return Ok(inventory);
        }

        let mut entries = tokio::fs::read_dir(&folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((kind, variant)) = classify(name) {
                match kind {
                    ArtifactKind::Question => {
                        inventory.question.insert(variant.unwrap_or_default());
                    }
                    ArtifactKind::Solution => {
                        if let Some(variant) = variant {
                            inventory.solution.insert(variant);
                        }
                    }
                    ArtifactKind::SolutionComments | ArtifactKind::SolutionCommentsExpanded => {
                        inventory.comments += 1;
                    }
                }
            }
        }
        Ok(inventory)
    }
}

/// 从文件名解析产物类型和语言
fn classify(file_name: &str) -> Option<(ArtifactKind, Option<String>)> {
    let caps = ARTIFACT_NAME.captures(file_name)?;
    let kind = ArtifactKind::from_label(caps.get(1)?.as_str())?;
    let variant = caps.get(2).map(|m| m.as_str().to_string());
    Some((kind, variant))
}
