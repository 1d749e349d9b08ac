//! 题解阶段 - 流程层
//!
//! 固定跑两遍：第一遍只统计语言（页面布局稳定前代码块尺寸会偏小），
//! 第二遍逐语言渲染。
//!
//! - 第一遍：严格 → 宽松，仍失败则上抛
//! - 第二遍：严格 → 宽松 → 宽松 + 复查清单，仍失败则放弃本次
//!
//! 只有第二遍成功才写入题解元数据。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::infrastructure::Renderer;
use crate::models::SharedItem;
use crate::services::{CaptureEngine, PassOptions, SolutionOutcome};
use crate::workflow::item_ctx::ItemCtx;

/// 题解阶段结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionRun {
    /// 第二遍完成，元数据已更新
    Captured,
    /// 页面上题解不可用
    Unavailable,
    /// 第二遍三次尝试都失败，元数据未更新
    Incomplete,
}

pub struct SolutionFlow {
    engine: Arc<CaptureEngine>,
}

impl SolutionFlow {
    pub fn new(engine: Arc<CaptureEngine>) -> Self {
        Self { engine }
    }

    pub async fn run(&self, session: &mut dyn Renderer, shared: &SharedItem, ctx: &ItemCtx) -> Result<SolutionRun> {
        let item = shared.snapshot();
        let prefix = ctx.to_string();

        // ========== 第一遍：统计语言 ==========
        info!("{} 🔍 题解第一遍...", ctx);
        let discovery = match self
            .engine
            .capture_solution(session, &item, PassOptions::discovery(false), &prefix)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} 第一遍失败，宽松模式重试: {}", ctx, e);
                self.engine
                    .capture_solution(session, &item, PassOptions::discovery(true), &prefix)
                    .await?
            }
        };
        if let SolutionOutcome::Unavailable = discovery {
            return Ok(SolutionRun::Unavailable);
        }

        // ========== 第二遍：渲染 ==========
        info!("{} 📄 题解第二遍...", ctx);
        let attempts = [
            PassOptions::capture(false, false),
            PassOptions::capture(true, false),
            PassOptions::capture(true, true),
        ];
        let mut captured = None;
        for (attempt, options) in attempts.into_iter().enumerate() {
            match self.engine.capture_solution(session, &item, options, &prefix).await {
                Ok(outcome) => {
                    captured = Some(outcome);
                    break;
                }
                Err(e) if attempt + 1 < attempts.len() => {
                    warn!("{} 第二遍第 {} 次尝试失败: {}", ctx, attempt + 1, e);
                }
                Err(e) => {
                    error!("{} ❌ 第二遍全部失败，保留原有题解元数据: {}", ctx, e);
                }
            }
        }

        match captured {
            Some(SolutionOutcome::Captured(meta)) => {
                info!("{} ✓ 题解阶段完成，语言: {:?}", ctx, meta.languages);
                shared.update(|item| item.solution_meta = Some(meta));
                Ok(SolutionRun::Captured)
            }
            Some(SolutionOutcome::Unavailable) => Ok(SolutionRun::Unavailable),
            None => Ok(SolutionRun::Incomplete),
        }
    }
}
