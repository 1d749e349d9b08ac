//! 题目目录客户端
//!
//! 封装目录接口的调用，只在本地缓存缺失或损坏时使用

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{ApiCatalog, Item};

/// 目录来源
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 拉取完整目录
    async fn fetch(&self) -> Result<Vec<Item>>;
}

/// 通过 HTTP 接口拉取目录
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    /// 创建新的目录客户端
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/problems/all/", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        let url = self.endpoint();
        info!("🌐 正在拉取题目目录: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::catalog(format!("目录接口返回 {}", status)));
        }

        let catalog: ApiCatalog = response.json().await?;
        debug!("目录接口返回 {} 条记录", catalog.stat_status_pairs.len());
        Ok(catalog.stat_status_pairs)
    }
}
