//! 渲染协作方接口 - 基础设施层
//!
//! 抓取引擎只依赖这里的四组能力：导航、发现、交互、渲染成文档，
//! 外加凭证回放。所有与站点结构相关的细节都藏在实现里。

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Credential;

/// 一个租出去的渲染会话
pub type Session = Box<dyn Renderer>;

/// 单步交互结果
///
/// `Err` 表示阶段级失败；`Transient` 表示某个代码块里的单步交互失败，
/// 宽松模式下可以跳过。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Done(T),
    Transient(String),
}

/// 导航目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget<'a> {
    Home,
    Login,
    Question { slug: &'a str },
    Solution { slug: &'a str },
}

impl std::fmt::Display for PageTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageTarget::Home => write!(f, "首页"),
            PageTarget::Login => write!(f, "登录页"),
            PageTarget::Question { slug } => write!(f, "题目页 {}", slug),
            PageTarget::Solution { slug } => write!(f, "题解页 {}", slug),
        }
    }
}

/// 导航结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// 页面已稳定，可以继续
    Ready,
    /// 被重定向到登录页
    AuthGate,
    /// 页面上没有目标内容（比如题解未开放）
    Missing,
}

/// 题目页上与题解相关的入口
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolutionAffordances {
    /// 存在题解链接
    pub link: bool,
    /// 题解链接上带付费图标
    pub premium_marker: bool,
    /// 题解链接上带免费图标
    pub free_marker: bool,
}

/// 需要反复点击展开的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionRegion {
    /// 题目页：公司、相关话题、相似题目
    QuestionExtras,
    /// 评论区："阅读更多"
    CommentReadMore,
    /// 评论区："显示回复"
    CommentReplies,
}

/// 渲染前整理出的视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentView {
    Question,
    Solution,
    Comments,
    CommentsExpanded,
}

#[async_trait]
pub trait Renderer: Send {
    // ---------- 导航 ----------

    /// 打开目标页面并等待其稳定（每次等待都有上限）
    async fn navigate(&mut self, target: PageTarget<'_>) -> Result<NavigateOutcome>;

    // ---------- 发现 ----------

    /// 页面标题中的题号
    async fn display_id(&mut self) -> Result<Option<u32>>;

    /// 题目页代码编辑器可选的语言
    async fn question_variants(&mut self) -> Result<Vec<String>>;

    async fn solution_affordances(&mut self, slug: &str) -> Result<SolutionAffordances>;

    /// 题解正文中独立代码块的数量
    async fn content_blocks(&mut self) -> Result<usize>;

    /// 某个代码块暴露的语言标签；没有代码的块返回空列表
    async fn block_variants(&mut self, block: usize) -> Result<StepOutcome<Vec<String>>>;

    async fn expansion_targets(&mut self, region: ExpansionRegion) -> Result<usize>;

    // ---------- 交互 ----------

    async fn select_question_variant(&mut self, variant: &str) -> Result<()>;

    async fn select_block_variant(&mut self, block: usize, variant: &str) -> Result<StepOutcome<()>>;

    /// 点击下一个可展开元素
    async fn expand_next(&mut self, region: ExpansionRegion) -> Result<StepOutcome<()>>;

    async fn submit_login(&mut self, username: &str, password: &str) -> Result<()>;

    // ---------- 凭证 ----------

    async fn credentials(&mut self) -> Result<Vec<Credential>>;

    async fn apply_credentials(&mut self, credentials: &[Credential]) -> Result<()>;

    /// 探测登录状态；两个探针结论不一致时返回 `None`
    async fn is_authenticated(&mut self) -> Result<Option<bool>>;

    // ---------- 渲染 ----------

    /// 去掉页面上的无关元素，只保留要渲染的区域
    async fn isolate(&mut self, view: DocumentView) -> Result<()>;

    async fn render_to_document(&mut self, path: &Path) -> Result<()>;

    /// 释放底层资源
    async fn close(&mut self) -> Result<()>;
}
