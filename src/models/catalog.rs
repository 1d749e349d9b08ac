//! 运行期的共享目录
//!
//! 每道题目单独加锁；worker 只在修改自己那道题时短暂持锁，
//! 保存时逐条拍快照，不会把整道题的处理过程串行化。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::item::Item;

/// 共享的单条题目
#[derive(Debug, Clone)]
pub struct SharedItem(Arc<Mutex<Item>>);

impl SharedItem {
    pub fn new(item: Item) -> Self {
        Self(Arc::new(Mutex::new(item)))
    }

    fn lock(&self) -> MutexGuard<'_, Item> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前状态的拷贝
    pub fn snapshot(&self) -> Item {
        self.lock().clone()
    }

    /// 原地修改
    pub fn update<R>(&self, f: impl FnOnce(&mut Item) -> R) -> R {
        f(&mut self.lock())
    }
}

/// 整个目录：运行期间唯一可信的数据源
#[derive(Debug, Default)]
pub struct SharedCatalog {
    items: Vec<SharedItem>,
}

impl SharedCatalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into_iter().map(SharedItem::new).collect(),
        }
    }

    pub fn items(&self) -> &[SharedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 所有题目的快照
    pub fn snapshot(&self) -> Vec<Item> {
        self.items.iter().map(SharedItem::snapshot).collect()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<SharedItem> {
        self.items
            .iter()
            .find(|item| item.lock().slug() == slug)
            .cloned()
    }
}
