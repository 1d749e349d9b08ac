//! 单道题目处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **判定**：根据磁盘产物和缓存元数据决定两个阶段是否需要运行
//! 2. **租借会话**：至少有一个阶段需要运行时才向会话池租借
//! 3. **阶段调度**：先题目后题解，同一个会话顺序执行
//! 4. **写穿保存**：每个阶段完成后立即保存整个目录
//! 5. **错误隔离**：阶段失败只记录日志，不影响其他题目
//!
//! 会话由租约持有，函数返回时无论成功失败都会归还到池里。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::infrastructure::{PooledSession, SessionPool};
use crate::models::{Item, SharedCatalog, SharedItem};
use crate::services::{CaptureEngine, CatalogCache};
use crate::workflow::{
    question_needed, solution_needed, ItemCtx, QuestionFlow, SolutionFlow, SolutionRun,
};

/// 单个阶段的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhaseResult {
    /// 已完整，无需运行
    #[default]
    Skipped,
    Captured,
    /// 页面上没有题解
    Unavailable,
    Failed,
}

/// 一道题本次运行的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemOutcome {
    pub question: PhaseResult,
    pub solution: PhaseResult,
}

impl ItemOutcome {
    pub fn failed(&self) -> bool {
        self.question == PhaseResult::Failed || self.solution == PhaseResult::Failed
    }

    /// 本次是否做过渲染
    pub fn captured(&self) -> bool {
        self.question == PhaseResult::Captured || self.solution == PhaseResult::Captured
    }
}

pub struct ItemProcessor {
    pool: Arc<SessionPool>,
    cache: Arc<CatalogCache>,
    catalog: Arc<SharedCatalog>,
    engine: Arc<CaptureEngine>,
    question_flow: QuestionFlow,
    solution_flow: SolutionFlow,
    base_url: String,
    force_refresh: bool,
}

impl ItemProcessor {
    pub fn new(
        pool: Arc<SessionPool>,
        cache: Arc<CatalogCache>,
        catalog: Arc<SharedCatalog>,
        engine: Arc<CaptureEngine>,
        base_url: impl Into<String>,
        force_refresh: bool,
    ) -> Self {
        Self {
            question_flow: QuestionFlow::new(engine.clone()),
            solution_flow: SolutionFlow::new(engine.clone()),
            pool,
            cache,
            catalog,
            engine,
            base_url: base_url.into(),
            force_refresh,
        }
    }

    /// 处理一道题；错误都在这里消化
    pub async fn crawl_item(&self, shared: &SharedItem) -> ItemOutcome {
        let mut ctx = ItemCtx::for_item(&shared.snapshot());
        let mut lease: Option<PooledSession> = None;
        let mut outcome = ItemOutcome::default();

        // ========== 题目阶段 ==========
        let item = shared.snapshot();
        let decision = match self.engine.layout().inventory(&item).await {
            Ok(inventory) => question_needed(&item, &inventory, self.engine.languages(), self.force_refresh),
            Err(e) => {
                error!("{} ❌ 无法读取已有文件: {}", ctx, e);
                outcome.question = PhaseResult::Failed;
                return outcome;
            }
        };

        if decision.should_run() {
            info!("{} 题目阶段: {}", ctx, decision.reason());
            match self.run_question(&mut lease, shared, &ctx).await {
                Ok(updated) => {
                    ctx = updated;
                    outcome.question = PhaseResult::Captured;
                    self.persist(&ctx).await;
                }
                Err(e) => {
                    error!("{} ❌ 题目阶段失败: {}", ctx, e);
                    outcome.question = PhaseResult::Failed;
                    return outcome;
                }
            }
        } else {
            debug!("{} 跳过题目阶段: {}", ctx, decision.reason());
        }

        // ========== 题解阶段 ==========
        // 题号和"是否有题解"可能刚被题目阶段更新，重新判定
        let item = shared.snapshot();
        let decision = match self.engine.layout().inventory(&item).await {
            Ok(inventory) => solution_needed(
                &item,
                &inventory,
                self.engine.all_solution_languages(),
                self.force_refresh,
            ),
            Err(e) => {
                error!("{} ❌ 无法读取已有文件: {}", ctx, e);
                outcome.solution = PhaseResult::Failed;
                return outcome;
            }
        };

        if decision.should_run() {
            info!("{} 题解阶段: {}", ctx, decision.reason());
            outcome.solution = match self.run_solution(&mut lease, shared, &ctx).await {
                Ok(SolutionRun::Captured) => {
                    self.persist(&ctx).await;
                    PhaseResult::Captured
                }
                Ok(SolutionRun::Unavailable) => PhaseResult::Unavailable,
                Ok(SolutionRun::Incomplete) => PhaseResult::Failed,
                Err(e) => {
                    error!("{} ❌ 题解阶段失败: {}", ctx, e);
                    PhaseResult::Failed
                }
            };
        } else {
            debug!("{} 跳过题解阶段: {}", ctx, decision.reason());
        }

        if lease.is_some() {
            debug!("{} 归还会话", ctx);
        }
        outcome
    }

    /// 按题目地址抓取单道题
    ///
    /// 目录里有这道题时使用目录中的记录，否则临时建一条（题号从页面解析）。
    pub async fn crawl_by_url(&self, url: &str) -> Result<ItemOutcome> {
        let slug = slug_from_url(&self.base_url, url)?;
        let shared = match self.catalog.find_by_slug(&slug) {
            Some(shared) => shared,
            None => {
                info!("目录中没有 {}，按临时题目处理", slug);
                SharedItem::new(Item::from_slug(slug))
            }
        };
        Ok(self.crawl_item(&shared).await)
    }

    async fn run_question(
        &self,
        lease: &mut Option<PooledSession>,
        shared: &SharedItem,
        ctx: &ItemCtx,
    ) -> Result<ItemCtx> {
        let session = self.session(lease).await?;
        self.question_flow.run(&mut **session, shared, ctx).await
    }

    async fn run_solution(
        &self,
        lease: &mut Option<PooledSession>,
        shared: &SharedItem,
        ctx: &ItemCtx,
    ) -> Result<SolutionRun> {
        let session = self.session(lease).await?;
        self.solution_flow.run(&mut **session, shared, ctx).await
    }

    /// 第一次需要时才租借
    async fn session<'a>(&self, lease: &'a mut Option<PooledSession>) -> Result<&'a mut PooledSession> {
        let session = match lease.take() {
            Some(session) => session,
            None => self.pool.lease().await?,
        };
        Ok(lease.insert(session))
    }

    async fn persist(&self, ctx: &ItemCtx) {
        if let Err(e) = self.cache.persist(&self.catalog).await {
            warn!("{} ⚠️ 保存目录失败: {}", ctx, e);
        }
    }
}

/// `{base_url}/problems/{slug}/...` 中的 slug
pub fn slug_from_url(base_url: &str, url: &str) -> Result<String> {
    let prefix = format!("{}/problems/", base_url.trim_end_matches('/'));
    let rest = url
        .strip_prefix(&prefix)
        .ok_or_else(|| AppError::navigation(url, "不是题目地址"))?;
    match rest.split('/').next() {
        Some(slug) if !slug.is_empty() => Ok(slug.to_string()),
        _ => Err(AppError::navigation(url, "地址中没有题目 slug")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_url() {
        let base = "https://leetcode.com";
        assert_eq!(slug_from_url(base, "https://leetcode.com/problems/two-sum/").unwrap(), "two-sum");
        assert_eq!(slug_from_url(base, "https://leetcode.com/problems/two-sum").unwrap(), "two-sum");
        assert_eq!(
            slug_from_url("https://leetcode.com/", "https://leetcode.com/problems/two-sum/solution/").unwrap(),
            "two-sum"
        );
        assert!(slug_from_url(base, "https://example.com/problems/two-sum/").is_err());
        assert!(slug_from_url(base, "https://leetcode.com/problems/").is_err());
    }

    #[test]
    fn test_outcome_flags() {
        let outcome = ItemOutcome {
            question: PhaseResult::Skipped,
            solution: PhaseResult::Captured,
        };
        assert!(outcome.captured());
        assert!(!outcome.failed());
        assert!(!ItemOutcome::default().captured());
    }
}
