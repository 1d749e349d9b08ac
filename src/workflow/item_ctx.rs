//! 题目处理上下文
//!
//! 封装"我正在处理哪道题"这一信息，只用于日志前缀

use std::fmt::Display;

use crate::models::Item;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 展示题号，未知时为 0
    pub display_id: u32,

    pub slug: String,
}

impl ItemCtx {
    pub fn new(display_id: u32, slug: impl Into<String>) -> Self {
        Self {
            display_id,
            slug: slug.into(),
        }
    }

    pub fn for_item(item: &Item) -> Self {
        Self::new(item.display_id(), item.slug())
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 {:04} {}]", self.display_id, self.slug)
    }
}
