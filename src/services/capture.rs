//! 抓取引擎 - 业务能力层
//!
//! 描述"对一道题能做什么"：抓题目页、抓题解页的一遍。
//! 重试和遍数由流程层决定，这里只执行单遍。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::infrastructure::{
    DocumentView, ExpansionRegion, NavigateOutcome, PageTarget, Renderer, SolutionAffordances,
    StepOutcome,
};
use crate::models::{
    Item, QuestionMeta, SolutionAccess, SolutionFrame, SolutionMeta, SolutionPresence,
};
use crate::services::artifact_store::{ArtifactKind, ArtifactLayout};
use crate::services::auth_store::AuthStore;
use crate::services::language::LanguagePreferences;
use crate::services::review_writer::ReviewWriter;

/// 单遍题解抓取的选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOptions {
    /// 只统计语言，不选择也不渲染
    pub discovery_only: bool,
    /// 代码块内的单步失败只记录、不中断
    pub tolerant: bool,
    /// 渲染出的文件写入复查清单
    pub diagnostic: bool,
}

impl PassOptions {
    pub fn discovery(tolerant: bool) -> Self {
        Self {
            discovery_only: true,
            tolerant,
            diagnostic: false,
        }
    }

    pub fn capture(tolerant: bool, diagnostic: bool) -> Self {
        Self {
            discovery_only: false,
            tolerant,
            diagnostic,
        }
    }
}

/// 题解页一遍的结果
#[derive(Debug, Clone)]
pub enum SolutionOutcome {
    Captured(SolutionMeta),
    /// 页面上题解不可用（未开放）
    Unavailable,
}

/// 抓取引擎配置
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub max_expansions: usize,
    /// 为每种出现过的语言各渲染一份题解
    pub all_solution_languages: bool,
}

pub struct CaptureEngine {
    layout: ArtifactLayout,
    languages: LanguagePreferences,
    auth: Arc<AuthStore>,
    review: Arc<ReviewWriter>,
    settings: CaptureSettings,
}

impl CaptureEngine {
    pub fn new(
        layout: ArtifactLayout,
        languages: LanguagePreferences,
        auth: Arc<AuthStore>,
        review: Arc<ReviewWriter>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            layout,
            languages,
            auth,
            review,
            settings,
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn languages(&self) -> &LanguagePreferences {
        &self.languages
    }

    pub fn all_solution_languages(&self) -> bool {
        self.settings.all_solution_languages
    }

    /// 抓取题目页
    ///
    /// `item` 是工作副本：题号未知时会从页面补上。
    /// 任何一步失败都直接返回错误，调用方不应更新元数据。
    pub async fn capture_question(
        &self,
        session: &mut dyn Renderer,
        item: &mut Item,
        prefix: &str,
    ) -> Result<QuestionMeta> {
        let slug = item.slug().to_string();
        let target = PageTarget::Question { slug: &slug };
        if self.open(session, target, prefix).await? == NavigateOutcome::Missing {
            return Err(AppError::navigation(target.to_string(), "题目不存在"));
        }

        if item.display_id() == 0 {
            let display_id = session
                .display_id()
                .await?
                .ok_or_else(|| AppError::interaction("读取题号", "标题中没有题号"))?;
            info!("{} 从页面解析到题号 {}", prefix, display_id);
            item.stat.frontend_question_id = display_id;
        }

        let variants = session.question_variants().await?;
        let affordances = session.solution_affordances(&slug).await?;
        let variant = self.languages.preferred_question(&variants);
        debug!("{} 可选语言 {:?}，使用 {:?}", prefix, variants, variant);

        if let Some(variant) = variant.as_deref() {
            session.select_question_variant(variant).await?;
        }
        session.isolate(DocumentView::Question).await?;
        self.expand(session, &[ExpansionRegion::QuestionExtras], prefix).await?;

        let path = self.layout.path(item, ArtifactKind::Question, variant.as_deref());
        session.render_to_document(&path).await?;
        info!("{} 📄 题目已保存: {}", prefix, path.display());

        Ok(QuestionMeta {
            has_solution: if affordances.link {
                SolutionPresence::Yes
            } else {
                SolutionPresence::No
            },
            solution_access: classify_access(affordances, prefix),
            languages: variants,
            last_fetch: Some(Local::now()),
        })
    }

    /// 抓取题解页一遍
    pub async fn capture_solution(
        &self,
        session: &mut dyn Renderer,
        item: &Item,
        options: PassOptions,
        prefix: &str,
    ) -> Result<SolutionOutcome> {
        let target = PageTarget::Solution { slug: item.slug() };
        if self.open(session, target, prefix).await? == NavigateOutcome::Missing {
            warn!("{} 题解页不可用", prefix);
            return Ok(SolutionOutcome::Unavailable);
        }
        session.isolate(DocumentView::Solution).await?;

        // 倒序处理：展开后面的代码块不会挪动前面代码块的位置
        let blocks = session.content_blocks().await?;
        let mut frames = vec![SolutionFrame::default(); blocks];
        for block in (0..blocks).rev() {
            let outcome = session.block_variants(block).await?;
            frames[block] = match settle(outcome, options, format!("读取代码块 {}", block), prefix)? {
                Some(tabs) => SolutionFrame::from_languages(tabs),
                None => SolutionFrame::unread(),
            };
        }

        let meta = SolutionMeta {
            languages: rank_by_frequency(&frames),
            last_fetch: Some(Local::now()),
            frames,
        };
        debug!("{} {} 个代码块，语言 {:?}", prefix, blocks, meta.languages);
        if meta.has_unread_frames() {
            warn!("{} 有代码块未读取，本次结果不算完整", prefix);
        } else if meta.languages.is_empty() {
            warn!("{} 题解中没有找到任何代码语言", prefix);
        }

        if options.discovery_only {
            return Ok(SolutionOutcome::Captured(meta));
        }

        for language in self.render_targets(&meta) {
            for (block, frame) in meta.frames.iter().enumerate().rev() {
                let tabs = frame.languages();
                if tabs.is_empty() {
                    continue;
                }
                let chosen = if tabs.contains(&language) {
                    language.clone()
                } else {
                    self.languages.resolve_closest(&language, &tabs)
                };
                let outcome = session.select_block_variant(block, &chosen).await?;
                settle(outcome, options, format!("代码块 {} 选择 {}", block, chosen), prefix)?;
            }

            let path = self.layout.path(item, ArtifactKind::Solution, Some(&language));
            self.render(session, path, options, prefix).await?;
        }

        session.isolate(DocumentView::Comments).await?;
        self.expand(session, &[ExpansionRegion::CommentReadMore], prefix).await?;
        let path = self.layout.path(item, ArtifactKind::SolutionComments, None);
        self.render(session, path, options, prefix).await?;

        self.expand(
            session,
            &[ExpansionRegion::CommentReplies, ExpansionRegion::CommentReadMore],
            prefix,
        )
        .await?;
        session.isolate(DocumentView::CommentsExpanded).await?;
        let path = self.layout.path(item, ArtifactKind::SolutionCommentsExpanded, None);
        self.render(session, path, options, prefix).await?;

        Ok(SolutionOutcome::Captured(meta))
    }

    /// 本遍要渲染的题解语言
    fn render_targets(&self, meta: &SolutionMeta) -> Vec<String> {
        if self.settings.all_solution_languages {
            meta.languages.clone()
        } else {
            self.languages
                .preferred_solution(&meta.languages)
                .into_iter()
                .collect()
        }
    }

    /// 导航；被重定向到登录页时登录后再试一次
    async fn open(
        &self,
        session: &mut dyn Renderer,
        target: PageTarget<'_>,
        prefix: &str,
    ) -> Result<NavigateOutcome> {
        match session.navigate(target).await? {
            NavigateOutcome::AuthGate => {
                info!("{} 🔒 {} 需要登录", prefix, target);
                self.auth.login_and_persist(session).await?;
                match session.navigate(target).await? {
                    NavigateOutcome::AuthGate => {
                        Err(AppError::Auth(format!("登录后仍无法打开{}", target)))
                    }
                    outcome => Ok(outcome),
                }
            }
            outcome => Ok(outcome),
        }
    }

    async fn render(
        &self,
        session: &mut dyn Renderer,
        path: PathBuf,
        options: PassOptions,
        prefix: &str,
    ) -> Result<()> {
        session.render_to_document(&path).await?;
        debug!("{} 已渲染 {}", prefix, path.display());
        if options.diagnostic {
            self.review.write(prefix, &path).await?;
        }
        Ok(())
    }

    /// 依次点击各区域的可展开元素，直到都没有可展开的或达到上限
    async fn expand(
        &self,
        session: &mut dyn Renderer,
        regions: &[ExpansionRegion],
        prefix: &str,
    ) -> Result<usize> {
        let mut expanded = 0;
        loop {
            let mut progressed = false;
            for &region in regions {
                while expanded < self.settings.max_expansions {
                    if session.expansion_targets(region).await? == 0 {
                        break;
                    }
                    match session.expand_next(region).await? {
                        StepOutcome::Done(()) => {
                            expanded += 1;
                            progressed = true;
                        }
                        StepOutcome::Transient(reason) => {
                            debug!("{} 停止展开 {:?}: {}", prefix, region, reason);
                            break;
                        }
                    }
                }
            }
            if expanded >= self.settings.max_expansions {
                warn!("{} 展开次数达到上限 {}", prefix, self.settings.max_expansions);
                break;
            }
            if !progressed {
                break;
            }
        }
        Ok(expanded)
    }
}

/// 单步结果：严格模式下把可跳过的失败升级为错误
fn settle<T>(
    outcome: StepOutcome<T>,
    options: PassOptions,
    step: String,
    prefix: &str,
) -> Result<Option<T>> {
    match outcome {
        StepOutcome::Done(value) => Ok(Some(value)),
        StepOutcome::Transient(reason) if options.tolerant => {
            warn!("{} ⚠️ 跳过 {}: {}", prefix, step, reason);
            Ok(None)
        }
        StepOutcome::Transient(reason) => Err(AppError::interaction(step, reason)),
    }
}

/// 题解访问权限：两个图标一致（都有或都没有）时无法判断
fn classify_access(affordances: SolutionAffordances, prefix: &str) -> Option<SolutionAccess> {
    let SolutionAffordances {
        link,
        premium_marker,
        free_marker,
    } = affordances;
    if !link && !premium_marker && !free_marker {
        return None;
    }
    if premium_marker != free_marker {
        return Some(if premium_marker {
            SolutionAccess::Premium
        } else {
            SolutionAccess::Free
        });
    }
    warn!(
        "{} 题解权限不明确 (链接: {}, 付费图标: {}, 免费图标: {})",
        prefix, link, premium_marker, free_marker
    );
    Some(SolutionAccess::Ambiguous)
}

/// 所有代码块中出现过的语言，按出现次数降序；次数相同按首次出现的顺序
pub fn rank_by_frequency(frames: &[SolutionFrame]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for tab in frames.iter().flat_map(|frame| frame.tabs.iter()) {
        match counts.iter_mut().find(|(language, _)| *language == tab.language) {
            Some((_, count)) => *count += 1,
            None => counts.push((tab.language.clone(), 1)),
        }
    }
    // 稳定排序保留首次出现的顺序
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(language, _)| language).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(langs: &[&str]) -> SolutionFrame {
        SolutionFrame::from_languages(langs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_rank_by_frequency() {
        let frames = vec![frame(&["B", "A"]), frame(&["A"]), frame(&[]), frame(&["A"])];
        assert_eq!(rank_by_frequency(&frames), vec!["A", "B"]);
    }

    #[test]
    fn test_rank_ties_keep_first_occurrence() {
        let frames = vec![frame(&["Go", "Java"]), frame(&["Java", "Go"])];
        assert_eq!(rank_by_frequency(&frames), vec!["Go", "Java"]);
        assert!(rank_by_frequency(&[]).is_empty());
    }

    #[test]
    fn test_classify_access() {
        let none = SolutionAffordances::default();
        assert_eq!(classify_access(none, ""), None);

        let premium = SolutionAffordances {
            link: true,
            premium_marker: true,
            free_marker: false,
        };
        assert_eq!(classify_access(premium, ""), Some(SolutionAccess::Premium));

        let free = SolutionAffordances {
            link: true,
            premium_marker: false,
            free_marker: true,
        };
        assert_eq!(classify_access(free, ""), Some(SolutionAccess::Free));

        let link_only = SolutionAffordances {
            link: true,
            ..Default::default()
        };
        assert_eq!(classify_access(link_only, ""), Some(SolutionAccess::Ambiguous));
    }

    #[test]
    fn test_settle_promotes_transient_in_strict_mode() {
        let strict = PassOptions::capture(false, false);
        let tolerant = PassOptions::capture(true, false);

        let result = settle::<()>(StepOutcome::Transient("x".into()), strict, "step".into(), "");
        assert!(matches!(result, Err(AppError::Interaction { .. })));

        let result = settle::<()>(StepOutcome::Transient("x".into()), tolerant, "step".into(), "");
        assert_eq!(result.unwrap(), None);

        let result = settle(StepOutcome::Done(3), strict, "step".into(), "");
        assert_eq!(result.unwrap(), Some(3));
    }
}
