//! 会话池 - 基础设施层
//!
//! 只负责复用，不做准入控制：并发上限由驱动层的 Semaphore 保证。
//! 归还时不做健康检查，坏掉的会话会在下次使用时以抓取失败的形式暴露。

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::infrastructure::renderer::{Renderer, Session};

/// 会话工厂，创建时可以顺带完成登录
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Session>;
}

pub struct SessionPool {
    idle: Mutex<Vec<Session>>,
    factory: Arc<dyn SessionFactory>,
}

impl SessionPool {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Arc<Self> {
        Arc::new(Self {
            idle: Mutex::new(Vec::new()),
            factory,
        })
    }

    /// 取一个空闲会话，没有则新建
    pub async fn lease(self: &Arc<Self>) -> Result<PooledSession> {
        let reused = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let session = match reused {
            Some(session) => {
                debug!("复用空闲会话");
                session
            }
            None => {
                debug!("没有空闲会话，创建新会话");
                self.factory.create().await?
            }
        };

        Ok(PooledSession {
            session: Some(session),
            pool: Arc::clone(self),
        })
    }

    /// 归还会话；`None` 不做任何事
    pub fn give_back(&self, session: Option<Session>) {
        if let Some(session) = session {
            self.idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(session);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// 关闭所有空闲会话
    pub async fn shutdown(&self) {
        let sessions: Vec<Session> = std::mem::take(
            &mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for mut session in sessions {
            if let Err(e) = session.close().await {
                warn!("关闭会话失败: {}", e);
            }
        }
    }
}

/// 租约：同一时刻只属于一个调用方，离开作用域时自动归还
pub struct PooledSession {
    session: Option<Session>,
    pool: Arc<SessionPool>,
}

impl Deref for PooledSession {
    type Target = dyn Renderer;

    fn deref(&self) -> &Self::Target {
        self.session
            .as_deref()
            .unwrap_or_else(|| unreachable!("会话只在 drop 时取出"))
    }
}

impl DerefMut for PooledSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
            .as_deref_mut()
            .unwrap_or_else(|| unreachable!("会话只在 drop 时取出"))
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        self.pool.give_back(self.session.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::renderer::{
        DocumentView, ExpansionRegion, NavigateOutcome, PageTarget, SolutionAffordances,
        StepOutcome,
    };
    use crate::models::Credential;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullRenderer;

    #[async_trait]
    impl Renderer for NullRenderer {
        async fn navigate(&mut self, _: PageTarget<'_>) -> Result<NavigateOutcome> {
            Ok(NavigateOutcome::Ready)
        }
        async fn display_id(&mut self) -> Result<Option<u32>> {
            Ok(None)
        }
        async fn question_variants(&mut self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn solution_affordances(&mut self, _: &str) -> Result<SolutionAffordances> {
            Ok(SolutionAffordances::default())
        }
        async fn content_blocks(&mut self) -> Result<usize> {
            Ok(0)
        }
        async fn block_variants(&mut self, _: usize) -> Result<StepOutcome<Vec<String>>> {
            Ok(StepOutcome::Done(Vec::new()))
        }
        async fn expansion_targets(&mut self, _: ExpansionRegion) -> Result<usize> {
            Ok(0)
        }
        async fn select_question_variant(&mut self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn select_block_variant(&mut self, _: usize, _: &str) -> Result<StepOutcome<()>> {
            Ok(StepOutcome::Done(()))
        }
        async fn expand_next(&mut self, _: ExpansionRegion) -> Result<StepOutcome<()>> {
            Ok(StepOutcome::Done(()))
        }
        async fn submit_login(&mut self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn credentials(&mut self) -> Result<Vec<Credential>> {
            Ok(Vec::new())
        }
        async fn apply_credentials(&mut self, _: &[Credential]) -> Result<()> {
            Ok(())
        }
        async fn is_authenticated(&mut self) -> Result<Option<bool>> {
            Ok(Some(false))
        }
        async fn isolate(&mut self, _: DocumentView) -> Result<()> {
            Ok(())
        }
        async fn render_to_document(&mut self, _: &Path) -> Result<()> {
            Ok(())
        }
        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    #[async_trait]
    impl SessionFactory for CountingFactory {
        async fn create(&self) -> Result<Session> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullRenderer))
        }
    }

    #[tokio::test]
    async fn test_lease_reuses_returned_session() {
        let factory = Arc::new(CountingFactory::default());
        let pool = SessionPool::new(factory.clone());

        let lease = pool.lease().await.unwrap();
        assert_eq!(pool.idle_count(), 0);
        drop(lease);
        assert_eq!(pool.idle_count(), 1);

        let _again = pool.lease().await.unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(pool.idle_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_leases_get_distinct_sessions() {
        let factory = Arc::new(CountingFactory::default());
        let pool = SessionPool::new(factory.clone());

        let a = pool.lease().await.unwrap();
        let b = pool.lease().await.unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        drop(a);
        drop(b);
        assert_eq!(pool.idle_count(), 2);
    }

    #[tokio::test]
    async fn test_give_back_none_is_noop() {
        let pool = SessionPool::new(Arc::new(CountingFactory::default()));
        pool.give_back(None);
        assert_eq!(pool.idle_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_idle_sessions() {
        let pool = SessionPool::new(Arc::new(CountingFactory::default()));
        drop(pool.lease().await.unwrap());
        pool.shutdown().await;
        assert_eq!(pool.idle_count(), 0);
    }
}
