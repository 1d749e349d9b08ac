//! 目录缓存 - 业务能力层
//!
//! 本地 JSON 文件里保存完整目录和每道题的抓取元数据。
//! 每次元数据变化后整体重写（写穿），进程中断最多丢失正在处理的那道题。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::CatalogSource;
use crate::error::Result;
use crate::models::{Item, SharedCatalog};
use crate::utils::fs::write_atomic;

pub struct CatalogCache {
    path: PathBuf,
    source: Arc<dyn CatalogSource>,
    /// 所有 worker 的保存操作共用这一把锁
    lock: Mutex<()>,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            path: path.into(),
            source,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 优先读本地缓存；缓存缺失或损坏时从目录接口拉取并立即保存
    ///
    /// 结果按展示题号升序排列。
    pub async fn load(&self) -> Result<Vec<Item>> {
        let mut items = match self.read_cache().await {
            Ok(Some(items)) => {
                info!("📂 从缓存加载 {} 道题目", items.len());
                items
            }
            Ok(None) => {
                info!("没有目录缓存，首次拉取");
                self.fetch_and_save().await?
            }
            Err(e) => {
                warn!("⚠️ 目录缓存无法读取，重新拉取: {}", e);
                self.fetch_and_save().await?
            }
        };
        items.sort_by_key(Item::display_id);
        Ok(items)
    }

    /// 按题目 id 降序整体写入
    pub async fn save(&self, items: &[Item]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_sorted(items.to_vec()).await
    }

    /// 保存运行期目录
    ///
    /// 快照在锁内获取，后拿到锁的 worker 一定能看到先前所有 worker 的修改。
    pub async fn persist(&self, catalog: &SharedCatalog) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_sorted(catalog.snapshot()).await
    }

    async fn fetch_and_save(&self) -> Result<Vec<Item>> {
        let items = self.source.fetch().await?;
        self.save(&items).await?;
        Ok(items)
    }

    async fn read_cache(&self) -> Result<Option<Vec<Item>>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let items: Vec<Item> = serde_json::from_str(&content)?;
        Ok(Some(items))
    }

    async fn write_sorted(&self, mut items: Vec<Item>) -> Result<()> {
        items.sort_by(|a, b| b.id().cmp(&a.id()));
        let json = serde_json::to_vec_pretty(&items)?;
        write_atomic(&self.path, &json).await?;
        debug!("目录已保存: {} 道题目", items.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{QuestionMeta, SolutionPresence};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn item(id: u32, display_id: u32, slug: &str) -> Item {
        let mut item = Item::from_slug(slug);
        item.stat.question_id = id;
        item.stat.frontend_question_id = display_id;
        item
    }

    struct FixedSource {
        items: Vec<Item>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(items: Vec<Item>) -> Arc<Self> {
            Arc::new(Self {
                items,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CatalogSource for FixedSource {
        async fn fetch(&self) -> Result<Vec<Item>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Item>> {
            Err(AppError::catalog("offline"))
        }
    }

    #[tokio::test]
    async fn test_first_load_fetches_and_persists() {
        let dir = TempDir::new().unwrap();
        let source = FixedSource::new(vec![item(2, 20, "b"), item(1, 10, "a")]);
        let cache = CatalogCache::new(dir.path().join("Problems.json"), source.clone());

        let items = cache.load().await.unwrap();
        assert_eq!(items[0].slug(), "a");
        assert!(cache.path().exists());

        // 第二次读缓存，不再拉取
        cache.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_fetch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Problems.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let source = FixedSource::new(vec![item(1, 1, "a")]);
        let cache = CatalogCache::new(&path, source.clone());
        let items = cache.load().await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let rewritten: Vec<Item> = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(rewritten.len(), 1);
    }

    #[tokio::test]
    async fn test_save_load_round_trip_ignores_order() {
        let dir = TempDir::new().unwrap();
        let cache = CatalogCache::new(dir.path().join("Problems.json"), Arc::new(FailingSource));

        let mut with_meta = item(7, 3, "c");
        with_meta.question_meta = Some(QuestionMeta {
            has_solution: SolutionPresence::Yes,
            ..Default::default()
        });
        let items = vec![item(5, 1, "a"), with_meta, item(9, 2, "b")];
        cache.save(&items).await.unwrap();

        // 文件里按 id 降序
        let raw: Vec<Item> = serde_json::from_str(&tokio::fs::read_to_string(cache.path()).await.unwrap()).unwrap();
        assert_eq!(raw.iter().map(Item::id).collect::<Vec<_>>(), vec![9, 7, 5]);

        // 读回按展示题号升序
        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.iter().map(Item::display_id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            loaded.iter().map(Item::id).collect::<BTreeSet<_>>(),
            items.iter().map(Item::id).collect::<BTreeSet<_>>()
        );
        assert!(loaded[2].has_known_solution());
    }

    #[tokio::test]
    async fn test_missing_cache_and_offline_source_is_error() {
        let dir = TempDir::new().unwrap();
        let cache = CatalogCache::new(dir.path().join("Problems.json"), Arc::new(FailingSource));
        assert!(cache.load().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_persist_keeps_every_update() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(CatalogCache::new(
            dir.path().join("Problems.json"),
            Arc::new(FailingSource),
        ));
        let catalog = Arc::new(SharedCatalog::new(
            (1..=16).map(|i| item(i, i, &format!("item-{}", i))).collect(),
        ));

        let mut handles = Vec::new();
        for shared in catalog.items().iter().cloned() {
            let cache = cache.clone();
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                shared.update(|item| {
                    item.question_meta = Some(QuestionMeta {
                        has_solution: SolutionPresence::No,
                        ..Default::default()
                    })
                });
                cache.persist(&catalog).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.len(), 16);
        assert!(loaded.iter().all(Item::has_no_solution));
    }
}
