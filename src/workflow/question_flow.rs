//! 题目阶段 - 流程层
//!
//! 抓题目页，成功后整体覆盖题目元数据；失败时不动元数据。

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::infrastructure::Renderer;
use crate::models::SharedItem;
use crate::services::CaptureEngine;
use crate::workflow::item_ctx::ItemCtx;

/// 题目阶段流程
///
/// - 不持有任何资源（会话由调用方租借）
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    engine: Arc<CaptureEngine>,
}

impl QuestionFlow {
    pub fn new(engine: Arc<CaptureEngine>) -> Self {
        Self { engine }
    }

    /// 运行题目阶段，返回更新后的上下文（题号可能刚刚解析出来）
    pub async fn run(&self, session: &mut dyn Renderer, shared: &SharedItem, ctx: &ItemCtx) -> Result<ItemCtx> {
        info!("{} 📝 抓取题目...", ctx);

        let mut working = shared.snapshot();
        let meta = self
            .engine
            .capture_question(session, &mut working, &ctx.to_string())
            .await?;

        let display_id = working.display_id();
        shared.update(|item| {
            item.stat.frontend_question_id = display_id;
            item.question_meta = Some(meta);
        });

        let ctx = ItemCtx::new(display_id, ctx.slug.clone());
        info!("{} ✓ 题目阶段完成", ctx);
        Ok(ctx)
    }
}
