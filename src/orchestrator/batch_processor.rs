//! 批量题目处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、凭证存储、会话池、目录缓存
//! 2. **批量加载**：从缓存（或目录接口）加载全部题目，按 skip / take 取子集
//! 3. **并发控制**：使用 Semaphore 限制同时处理的题目数量，也就限制了会话数量
//! 4. **资源管理**：运行结束后关闭所有空闲会话
//! 5. **全局统计**：汇总所有题目的处理结果
//!
//! 每道题的细节委托给 `ItemProcessor`。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::HttpCatalogSource;
use crate::config::Config;
use crate::infrastructure::{SessionFactory, SessionPool};
use crate::models::{Item, SharedCatalog, SharedItem};
use crate::orchestrator::item_processor::{ItemOutcome, ItemProcessor};
use crate::orchestrator::session_factory::ChromeSessionFactory;
use crate::services::{
    ArtifactLayout, AuthStore, CaptureEngine, CaptureSettings, CatalogCache, LanguagePreferences,
    LoginCredentials, ReviewWriter,
};
use crate::utils::logging::{self, RunStats};

/// 应用主结构
pub struct App {
    config: Config,
    catalog: Arc<SharedCatalog>,
    pool: Arc<SessionPool>,
    processor: Arc<ItemProcessor>,
}

impl App {
    /// 初始化应用：浏览器会话按需创建，目录在这里加载
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(config.max_concurrent_items, &config.output_folder);

        let auth = Arc::new(AuthStore::new(
            &config.cookies_file,
            LoginCredentials::from_config(&config.username, &config.password),
        ));
        let factory = Arc::new(ChromeSessionFactory::from_config(&config, auth.clone()));

        let source = Arc::new(HttpCatalogSource::new(
            &config.base_url,
            Duration::from_secs(config.wait_timeout_secs.max(30)),
        )?);
        let cache = Arc::new(CatalogCache::new(config.catalog_path(), source));
        let items = cache.load().await?;

        Ok(Self::assemble(config, factory, cache, auth, items))
    }

    /// 用现成的部件组装（会话工厂和目录来源可替换）
    pub fn assemble(
        config: Config,
        factory: Arc<dyn SessionFactory>,
        cache: Arc<CatalogCache>,
        auth: Arc<AuthStore>,
        items: Vec<Item>,
    ) -> Self {
        let catalog = Arc::new(SharedCatalog::new(items));
        let pool = SessionPool::new(factory);

        let engine = Arc::new(CaptureEngine::new(
            ArtifactLayout::new(&config.output_folder),
            LanguagePreferences::new(
                config.preferred_question_languages.clone(),
                config.preferred_solution_languages.clone(),
            ),
            auth,
            Arc::new(ReviewWriter::with_path(&config.review_file)),
            CaptureSettings {
                max_expansions: config.max_expansions,
                all_solution_languages: config.fetch_all_solution_languages,
            },
        ));

        let processor = Arc::new(ItemProcessor::new(
            pool.clone(),
            cache,
            catalog.clone(),
            engine,
            config.base_url.clone(),
            config.force_refresh,
        ));

        Self {
            config,
            catalog,
            pool,
            processor,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        let stats = match self.config.crawl_url.as_deref() {
            Some(url) => self.crawl_single(url).await?,
            None => self.crawl_catalog().await?,
        };

        self.pool.shutdown().await;
        logging::print_final_stats(&stats, &self.config.output_log_file)?;
        Ok(stats)
    }

    async fn crawl_single(&self, url: &str) -> Result<RunStats> {
        info!("🎯 只抓取单个题目: {}", url);
        let outcome = self.processor.crawl_by_url(url).await?;
        let mut stats = RunStats {
            total: 1,
            ..Default::default()
        };
        tally(&mut stats, outcome);
        Ok(stats)
    }

    /// 选出本次处理的题目
    fn selected_items(&self) -> Vec<SharedItem> {
        self.catalog
            .items()
            .iter()
            .skip(self.config.skip)
            .take(self.config.take.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    async fn crawl_catalog(&self) -> Result<RunStats> {
        let selected = self.selected_items();
        if selected.is_empty() {
            warn!("⚠️ 没有需要处理的题目，程序结束");
            return Ok(RunStats::default());
        }
        logging::log_items_loaded(self.catalog.len(), selected.len(), self.config.max_concurrent_items);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_items));
        let mut handles = Vec::with_capacity(selected.len());

        for shared in selected {
            let permit = semaphore.clone().acquire_owned().await?;
            let processor = self.processor.clone();
            let slug = shared.snapshot().slug().to_string();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                processor.crawl_item(&shared).await
            });
            handles.push((slug, handle));
        }

        let mut stats = RunStats {
            total: handles.len(),
            ..Default::default()
        };
        for (slug, handle) in handles {
            match handle.await {
                Ok(outcome) => tally(&mut stats, outcome),
                Err(e) => {
                    error!("[题目 {}] 任务执行失败: {}", slug, e);
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }
}

fn tally(stats: &mut RunStats, outcome: ItemOutcome) {
    if outcome.failed() {
        stats.failed += 1;
    } else {
        stats.complete += 1;
    }
    if outcome.captured() {
        stats.captured += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::item_processor::PhaseResult;

    #[test]
    fn test_tally() {
        let mut stats = RunStats::default();
        tally(
            &mut stats,
            ItemOutcome {
                question: PhaseResult::Captured,
                solution: PhaseResult::Failed,
            },
        );
        tally(&mut stats, ItemOutcome::default());
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.complete, 1);
        assert_eq!(stats.captured, 1);
    }
}
