//! 题目目录的数据模型
//!
//! 字段名与目录接口（`/api/problems/all/`）保持一致，缓存文件可以直接 diff。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 目录接口的返回结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCatalog {
    pub stat_status_pairs: Vec<Item>,
}

/// 一道题目（目录中的一条记录 + 抓取元数据）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub stat: Stat,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub paid_only: bool,
    #[serde(default)]
    pub is_favor: bool,
    #[serde(default)]
    pub frequency: f32,
    #[serde(default)]
    pub progress: f32,

    #[serde(rename = "question_details", default, skip_serializing_if = "Option::is_none")]
    pub question_meta: Option<QuestionMeta>,

    #[serde(rename = "solution_details", default, skip_serializing_if = "Option::is_none")]
    pub solution_meta: Option<SolutionMeta>,
}

impl Item {
    /// 只有 slug 的临时题目（按 URL 抓取时使用）
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self {
            stat: Stat {
                slug: slug.into(),
                ..Default::default()
            },
            status: None,
            difficulty: Difficulty::default(),
            paid_only: false,
            is_favor: false,
            frequency: 0.0,
            progress: 0.0,
            question_meta: None,
            solution_meta: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.stat.question_id
    }

    /// 页面上展示的题号，未知时为 0
    pub fn display_id(&self) -> u32 {
        self.stat.frontend_question_id
    }

    pub fn slug(&self) -> &str {
        &self.stat.slug
    }

    pub fn title(&self) -> &str {
        &self.stat.title
    }

    pub fn difficulty_tier(&self) -> DifficultyTier {
        self.difficulty.tier()
    }

    /// 题目元数据声明存在题解
    pub fn has_known_solution(&self) -> bool {
        self.question_meta
            .as_ref()
            .is_some_and(|meta| meta.has_solution == SolutionPresence::Yes)
    }

    /// 题目元数据明确声明没有题解
    pub fn has_no_solution(&self) -> bool {
        self.question_meta
            .as_ref()
            .is_some_and(|meta| meta.has_solution == SolutionPresence::No)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stat {
    #[serde(default)]
    pub question_id: u32,
    #[serde(rename = "question__article__live", default)]
    pub article_live: Option<bool>,
    #[serde(rename = "question__article__slug", default)]
    pub article_slug: Option<String>,
    #[serde(rename = "question__article__has_video_solution", default)]
    pub article_has_video_solution: Option<bool>,
    #[serde(rename = "question__title", default)]
    pub title: String,
    #[serde(rename = "question__title_slug")]
    pub slug: String,
    #[serde(rename = "question__hide", default)]
    pub hidden: bool,
    #[serde(default)]
    pub total_acs: u64,
    #[serde(default)]
    pub total_submitted: u64,
    #[serde(default)]
    pub frontend_question_id: u32,
    #[serde(default)]
    pub is_new_question: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Difficulty {
    pub level: u8,
}

impl Difficulty {
    pub fn tier(self) -> DifficultyTier {
        match self.level {
            1 => DifficultyTier::Easy,
            2 => DifficultyTier::Medium,
            3 => DifficultyTier::Hard,
            _ => DifficultyTier::Unknown,
        }
    }
}

/// 难度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    Unknown,
}

impl std::fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Medium => "Medium",
            DifficultyTier::Hard => "Hard",
            DifficultyTier::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// 题解是否存在
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionPresence {
    Yes,
    No,
    #[default]
    Unknown,
}

/// 题解的访问权限
///
/// 页面上的"付费"和"免费"图标可能同时出现或同时缺失，这种情况记为 `Ambiguous`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionAccess {
    Free,
    Premium,
    Ambiguous,
}

/// 题目页面的抓取结果，每次成功抓取后整体覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionMeta {
    #[serde(default)]
    pub has_solution: SolutionPresence,
    #[serde(rename = "premium_solution", default, skip_serializing_if = "Option::is_none")]
    pub solution_access: Option<SolutionAccess>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub last_fetch: Option<DateTime<Local>>,
}

/// 题解页面的抓取结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionMeta {
    /// 按出现次数降序排列的语言
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub last_fetch: Option<DateTime<Local>>,
    #[serde(default)]
    pub frames: Vec<SolutionFrame>,
}

impl SolutionMeta {
    /// 有代码块的语言标签没读到，这份结果不能当作最终结果
    pub fn has_unread_frames(&self) -> bool {
        self.frames.iter().any(|frame| frame.unread)
    }
}

/// 题解页面中的一个代码块
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionFrame {
    #[serde(default)]
    pub tabs: Vec<FrameTab>,
    /// 宽松模式下跳过了这个代码块，`tabs` 为空不代表没有代码
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unread: bool,
}

impl SolutionFrame {
    pub fn from_languages(languages: Vec<String>) -> Self {
        Self {
            tabs: languages.into_iter().map(|language| FrameTab { language }).collect(),
            unread: false,
        }
    }

    pub fn unread() -> Self {
        Self {
            tabs: Vec::new(),
            unread: true,
        }
    }

    pub fn languages(&self) -> Vec<String> {
        self.tabs.iter().map(|tab| tab.language.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTab {
    pub language: String,
}
