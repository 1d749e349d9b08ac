//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"有限等待"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::error::{AppError, Result};

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 Item / Solution
pub struct JsExecutor {
    page: Page,
    timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行一段不关心返回值的脚本
    pub async fn run(&self, js_code: impl Into<String>) -> Result<()> {
        self.page.evaluate(js_code.into()).await?;
        Ok(())
    }

    /// 轮询 `condition`（返回布尔值的表达式）直到为真或超时
    pub async fn wait_until(&self, what: &str, condition: &str) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            // 页面还在跳转时求值可能失败，视为条件未满足
            let ready = self
                .eval_as::<bool>(format!("!!({})", condition))
                .await
                .unwrap_or(false);
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::timeout(what, self.timeout.as_secs()));
            }
            trace!("等待中: {}", what);
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 选择器至少匹配一个元素
    pub async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        let condition = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.wait_until(selector, &condition).await
    }

    /// 选择器匹配的元素数量
    pub async fn count(&self, selector: &str) -> Result<usize> {
        self.eval_as(format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(selector)?
        ))
        .await
    }
}
