//! 集成测试共用的假站点和假会话
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use problem_harvest::clients::CatalogSource;
use problem_harvest::infrastructure::{
    DocumentView, ExpansionRegion, NavigateOutcome, PageTarget, Renderer, Session,
    SessionFactory, SolutionAffordances, StepOutcome,
};
use problem_harvest::models::{Credential, Item};
use problem_harvest::services::{AuthStore, CatalogCache, LoginCredentials};
use problem_harvest::{App, AppError, Config, Result};
use tempfile::TempDir;

pub const BASE_URL: &str = "https://leetcode.test";

/// 一道题在假站点上的样子
#[derive(Debug, Clone)]
pub struct FakePage {
    pub display_id: u32,
    pub question_variants: Vec<String>,
    /// 每个代码块的语言标签；`None` 表示没有题解
    pub solution_blocks: Option<Vec<Vec<String>>>,
    pub comment_replies: usize,
}

impl FakePage {
    pub fn new(display_id: u32) -> Self {
        Self {
            display_id,
            question_variants: strings(&["Go", "Java"]),
            solution_blocks: None,
            comment_replies: 0,
        }
    }

    pub fn with_solution(mut self, blocks: &[&[&str]]) -> Self {
        self.solution_blocks = Some(blocks.iter().map(|b| strings(b)).collect());
        self
    }

    pub fn with_replies(mut self, replies: usize) -> Self {
        self.comment_replies = replies;
        self
    }
}

/// 所有会话共享的站点状态
#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, FakePage>>,
    renders: Mutex<Vec<PathBuf>>,
    /// 未登录时所有页面都跳转到登录页
    pub requires_login: AtomicBool,
    logged_in: AtomicBool,
    /// 接下来这么多次代码块选择返回可跳过的失败
    pub flaky_selects: AtomicUsize,
    /// 接下来这么多次题解渲染直接报错
    pub failing_solution_renders: AtomicUsize,
    /// 接下来这么多次读取代码块语言标签返回可跳过的失败
    pub flaky_block_reads: AtomicUsize,
    /// 接下来这么多次统计代码块直接报错
    pub failing_block_counts: AtomicUsize,
    /// 累计点击展开的次数
    pub expansions: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, slug: &str, page: FakePage) {
        self.pages.lock().unwrap().insert(slug.to_string(), page);
    }

    fn page(&self, slug: &str) -> Option<FakePage> {
        self.pages.lock().unwrap().get(slug).cloned()
    }

    pub fn renders(&self) -> Vec<PathBuf> {
        self.renders.lock().unwrap().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }

    pub fn expansion_count(&self) -> usize {
        self.expansions.load(Ordering::SeqCst)
    }
}

/// 计数器大于 0 时减一并返回 true
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub struct FakeRenderer {
    site: Arc<FakeSite>,
    slug: Option<String>,
    replies_left: usize,
}

impl FakeRenderer {
    fn current(&self) -> Result<FakePage> {
        let slug = self
            .slug
            .as_deref()
            .ok_or_else(|| AppError::interaction("fake", "还没有导航"))?;
        self.site
            .page(slug)
            .ok_or_else(|| AppError::navigation(slug, "404"))
    }

    fn blocks(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.current()?.solution_blocks.unwrap_or_default())
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn navigate(&mut self, target: PageTarget<'_>) -> Result<NavigateOutcome> {
        let requires_login = self.site.requires_login.load(Ordering::SeqCst);
        let logged_in = self.site.logged_in.load(Ordering::SeqCst);
        match target {
            PageTarget::Home | PageTarget::Login => Ok(NavigateOutcome::Ready),
            PageTarget::Question { slug } | PageTarget::Solution { slug } => {
                if requires_login && !logged_in {
                    return Ok(NavigateOutcome::AuthGate);
                }
                let page = self
                    .site
                    .page(slug)
                    .ok_or_else(|| AppError::navigation(slug, "404"))?;
                self.slug = Some(slug.to_string());
                if matches!(target, PageTarget::Solution { .. }) {
                    if page.solution_blocks.is_none() {
                        return Ok(NavigateOutcome::Missing);
                    }
                    self.replies_left = page.comment_replies;
                }
                Ok(NavigateOutcome::Ready)
            }
        }
    }

    async fn display_id(&mut self) -> Result<Option<u32>> {
        Ok(Some(self.current()?.display_id))
    }

    async fn question_variants(&mut self) -> Result<Vec<String>> {
        Ok(self.current()?.question_variants)
    }

    async fn solution_affordances(&mut self, _: &str) -> Result<SolutionAffordances> {
        let has_solution = self.current()?.solution_blocks.is_some();
        Ok(SolutionAffordances {
            link: has_solution,
            premium_marker: false,
            free_marker: has_solution,
        })
    }

    async fn content_blocks(&mut self) -> Result<usize> {
        if take_one(&self.site.failing_block_counts) {
            return Err(AppError::timeout("题解代码块", 1));
        }
        Ok(self.blocks()?.len())
    }

    async fn block_variants(&mut self, block: usize) -> Result<StepOutcome<Vec<String>>> {
        if take_one(&self.site.flaky_block_reads) {
            return Ok(StepOutcome::Transient(format!("代码块 {} 语言标签未出现", block)));
        }
        match self.blocks()?.get(block) {
            Some(tabs) => Ok(StepOutcome::Done(tabs.clone())),
            None => Ok(StepOutcome::Transient(format!("代码块 {} 不存在", block))),
        }
    }

    async fn expansion_targets(&mut self, region: ExpansionRegion) -> Result<usize> {
        Ok(match region {
            ExpansionRegion::CommentReplies => self.replies_left,
            _ => 0,
        })
    }

    async fn select_question_variant(&mut self, variant: &str) -> Result<()> {
        if !self.current()?.question_variants.iter().any(|v| v == variant) {
            return Err(AppError::interaction("选择题目语言", variant));
        }
        Ok(())
    }

    async fn select_block_variant(&mut self, block: usize, variant: &str) -> Result<StepOutcome<()>> {
        if take_one(&self.site.flaky_selects) {
            return Ok(StepOutcome::Transient("标签点击没有生效".to_string()));
        }
        let blocks = self.blocks()?;
        match blocks.get(block) {
            Some(tabs) if tabs.iter().any(|t| t == variant) => Ok(StepOutcome::Done(())),
            _ => Ok(StepOutcome::Transient(format!("代码块 {} 没有 {}", block, variant))),
        }
    }

    async fn expand_next(&mut self, region: ExpansionRegion) -> Result<StepOutcome<()>> {
        if region == ExpansionRegion::CommentReplies && self.replies_left > 0 {
            self.replies_left -= 1;
            self.site.expansions.fetch_add(1, Ordering::SeqCst);
            return Ok(StepOutcome::Done(()));
        }
        Ok(StepOutcome::Transient("没有可展开的元素".to_string()))
    }

    async fn submit_login(&mut self, _: &str, _: &str) -> Result<()> {
        self.site.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn credentials(&mut self) -> Result<Vec<Credential>> {
        Ok(Vec::new())
    }

    async fn apply_credentials(&mut self, _: &[Credential]) -> Result<()> {
        Ok(())
    }

    async fn is_authenticated(&mut self) -> Result<Option<bool>> {
        Ok(Some(self.site.logged_in.load(Ordering::SeqCst)))
    }

    async fn isolate(&mut self, _: DocumentView) -> Result<()> {
        Ok(())
    }

    async fn render_to_document(&mut self, path: &Path) -> Result<()> {
        let is_solution = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("-Solution-"));
        if is_solution {
            if take_one(&self.site.failing_solution_renders) {
                return Err(AppError::Browser("打印失败".to_string()));
            }
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, b"%PDF-1.4 fake").await?;
        self.site.renders.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct FakeFactory {
    site: Arc<FakeSite>,
    pub created: AtomicUsize,
}

impl FakeFactory {
    pub fn new(site: Arc<FakeSite>) -> Arc<Self> {
        Arc::new(Self {
            site,
            created: AtomicUsize::new(0),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn create(&self) -> Result<Session> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            site: self.site.clone(),
            slug: None,
            replies_left: 0,
        }))
    }
}

pub struct FixedSource(pub Vec<Item>);

#[async_trait]
impl CatalogSource for FixedSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        Ok(self.0.clone())
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn catalog_item(id: u32, slug: &str) -> Item {
    let mut item = Item::from_slug(slug);
    item.stat.question_id = id;
    item.stat.frontend_question_id = id;
    item
}

pub fn test_config(dir: &TempDir) -> Config {
    let root = dir.path();
    Config {
        base_url: BASE_URL.to_string(),
        output_folder: root.join("out").to_string_lossy().into_owned(),
        cookies_file: root.join("Cookies.data").to_string_lossy().into_owned(),
        output_log_file: root.join("crawl_log.txt").to_string_lossy().into_owned(),
        review_file: root.join("review.txt").to_string_lossy().into_owned(),
        max_concurrent_items: 3,
        ..Config::default()
    }
}

/// 和 `App::initialize` 一样先经过目录缓存，只是会话和目录来源都是假的
pub async fn build_app(config: Config, factory: Arc<FakeFactory>, catalog: Vec<Item>) -> App {
    let login = LoginCredentials::from_config(&config.username, &config.password);
    let auth = Arc::new(AuthStore::new(&config.cookies_file, login));
    let cache = Arc::new(CatalogCache::new(
        config.catalog_path(),
        Arc::new(FixedSource(catalog)),
    ));
    let items = cache.load().await.unwrap();
    App::assemble(config, factory, cache, auth, items)
}

/// 直接读缓存文件
pub async fn read_cache(config: &Config) -> Vec<Item> {
    let content = tokio::fs::read_to_string(config.catalog_path()).await.unwrap();
    serde_json::from_str(&content).unwrap()
}

pub fn find<'a>(items: &'a [Item], slug: &str) -> &'a Item {
    items.iter().find(|i| i.slug() == slug).unwrap()
}
