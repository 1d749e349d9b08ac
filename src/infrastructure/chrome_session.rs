//! Chrome 渲染会话 - 基础设施层
//!
//! `Renderer` 的 chromiumoxide 实现。一个会话持有一个页面；
//! 启动模式下还独占一个浏览器进程。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Browser;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::browser::{self, LaunchOptions};
use crate::error::{AppError, Result};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::renderer::{
    DocumentView, ExpansionRegion, NavigateOutcome, PageTarget, Renderer, SolutionAffordances,
    StepOutcome,
};
use crate::infrastructure::scripts;
use crate::models::Credential;

/// A4，单位英寸
const PAPER_WIDTH_IN: f64 = 210.0 / 25.4;
const PAPER_HEIGHT_IN: f64 = 297.0 / 25.4;

/// 会话参数
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub base_url: String,
    pub launch: LaunchOptions,
    /// 设置后连接已有浏览器
    pub debug_port: Option<u16>,
    pub wait_timeout: Duration,
    pub question_page_width: u32,
    pub solution_page_width: u32,
    pub max_page_width: u32,
}

pub struct ChromeSession {
    browser: Browser,
    executor: JsExecutor,
    options: ChromeOptions,
    owns_browser: bool,
    authenticated: bool,
    /// 已经整理过的题解页（同一页面的第二遍不再重新加载）
    prepared_solution: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FrameTabs {
    state: String,
    tabs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScriptResult {
    ok: bool,
    reason: String,
}

impl ChromeSession {
    /// 启动或连接浏览器，得到一个新会话
    pub async fn open(options: ChromeOptions) -> Result<Self> {
        let (browser, page, owns_browser) = match options.debug_port {
            Some(port) => {
                let (browser, page) = browser::connect_to_browser_and_page(port).await?;
                (browser, page, false)
            }
            None => {
                let (browser, page) = browser::launch_browser(&options.launch).await?;
                (browser, page, true)
            }
        };

        Ok(Self {
            browser,
            executor: JsExecutor::new(page, options.wait_timeout),
            options,
            owns_browser,
            authenticated: false,
            prepared_solution: None,
        })
    }

    fn url_for(&self, target: PageTarget<'_>) -> String {
        let base = self.options.base_url.trim_end_matches('/');
        match target {
            PageTarget::Home => base.to_string(),
            PageTarget::Login => format!("{}/accounts/login/", base),
            PageTarget::Question { slug } => format!("{}/problems/{}/", base, slug),
            PageTarget::Solution { slug } => format!("{}/problems/{}/solution/", base, slug),
        }
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        // 第一次失败通常是页面还在跳转，再试一次
        if let Err(e) = self.executor.page().goto(url).await {
            debug!("导航失败，重试一次: {}", e);
            self.executor
                .page()
                .goto(url)
                .await
                .map_err(|e| AppError::navigation(url, e))?;
        }
        Ok(())
    }

    fn expansion_query(region: ExpansionRegion) -> String {
        match region {
            ExpansionRegion::QuestionExtras => scripts::expansion_query(scripts::QUESTION_EXTRAS, None),
            ExpansionRegion::CommentReadMore => scripts::expansion_query(scripts::READ_MORE, None),
            ExpansionRegion::CommentReplies => {
                scripts::expansion_query(scripts::SHOW_REPLIES, Some("Show "))
            }
        }
    }

    async fn fit_comments_width(&self) -> Result<()> {
        let wanted: u32 = self.executor.eval_as(scripts::COMMENTS_WIDTH).await.unwrap_or(0);
        let width = wanted
            .max(self.options.solution_page_width)
            .min(self.options.max_page_width);
        debug!("评论区宽度: {}px", width);
        self.executor.run(scripts::set_comments_width(width)).await
    }

    async fn prepare_solution_page(&mut self, slug: &str) -> Result<()> {
        if self.prepared_solution.as_deref() == Some(slug) {
            return Ok(());
        }
        self.executor.run(scripts::HIDE_SCROLLBAR).await?;
        // 评论区加载得慢，等到"阅读更多"出现或确认没有评论
        let comments_ready = format!(
            "document.querySelector({}) !== null || Array.from(document.querySelectorAll('.comment-count__28iT')).some(el => el.textContent === 'Comments: 0')",
            serde_json::to_string(scripts::READ_MORE)?
        );
        self.executor.wait_until("评论区", &comments_ready).await?;

        let isolated: bool = self
            .executor
            .eval_as(scripts::isolate_solution(self.options.solution_page_width))
            .await?;
        if !isolated {
            return Err(AppError::interaction("整理题解页", "找不到正文区域"));
        }
        self.prepared_solution = Some(slug.to_string());
        Ok(())
    }
}

#[async_trait]
impl Renderer for ChromeSession {
    async fn navigate(&mut self, target: PageTarget<'_>) -> Result<NavigateOutcome> {
        let url = self.url_for(target);

        if let PageTarget::Solution { slug } = target {
            if self.prepared_solution.as_deref() == Some(slug) && self.current_url().await? == url {
                debug!("题解页已就绪，跳过重新加载");
                return Ok(NavigateOutcome::Ready);
            }
        }
        self.prepared_solution = None;

        self.goto(&url).await?;

        if target != PageTarget::Login && self.current_url().await?.contains("/accounts/login") {
            return Ok(NavigateOutcome::AuthGate);
        }

        match target {
            PageTarget::Home => Ok(NavigateOutcome::Ready),
            PageTarget::Login => {
                self.executor.wait_for_selector(scripts::SIGNIN_BUTTON).await?;
                Ok(NavigateOutcome::Ready)
            }
            PageTarget::Question { .. } => {
                self.executor.wait_for_selector(scripts::QUESTION_CONTENT).await?;
                self.executor.wait_for_selector(scripts::QUESTION_SIDE_TOOLS).await?;
                Ok(NavigateOutcome::Ready)
            }
            PageTarget::Solution { .. } => match self.executor.wait_for_selector(scripts::SOLUTION_CONTENT).await {
                Ok(()) => Ok(NavigateOutcome::Ready),
                Err(AppError::Timeout { .. }) => {
                    let disabled: bool = self
                        .executor
                        .eval_as(format!(
                            "Array.from(document.querySelectorAll({})).some(t => t.textContent === 'Solution')",
                            serde_json::to_string(scripts::SOLUTION_DISABLED_TAB)?
                        ))
                        .await?;
                    if disabled {
                        Ok(NavigateOutcome::Missing)
                    } else {
                        Err(AppError::navigation(url, "题解正文未出现"))
                    }
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn display_id(&mut self) -> Result<Option<u32>> {
        // CDP 对 null 结果不返回 value，找不到标题时用空串
        let title: String = self
            .executor
            .eval_as(format!(
                "(() => {{ const el = document.querySelector({}); return el ? el.textContent : ''; }})()",
                serde_json::to_string(scripts::QUESTION_TITLE)?
            ))
            .await?;
        Ok(title.split('.').next().and_then(|n| n.trim().parse().ok()))
    }

    async fn question_variants(&mut self) -> Result<Vec<String>> {
        let open_dropdown = format!(
            "(() => {{ const el = document.querySelector({}); if (el) el.click(); return !!el; }})()",
            serde_json::to_string(scripts::LANGUAGE_COMBOBOX)?
        );
        // 下拉框偶尔第一次点击不生效
        self.executor.run(open_dropdown.clone()).await?;
        if self.executor.wait_for_selector(scripts::LANGUAGE_OPTIONS).await.is_err() {
            self.executor.run(open_dropdown).await?;
            self.executor.wait_for_selector(scripts::LANGUAGE_OPTIONS).await?;
        }

        self.executor
            .eval_as(format!(
                "Array.from(document.querySelectorAll({})).map(el => el.getAttribute('data-cy').substring('lang-select-'.length))",
                serde_json::to_string(scripts::LANGUAGE_OPTIONS)?
            ))
            .await
    }

    async fn solution_affordances(&mut self, slug: &str) -> Result<SolutionAffordances> {
        let link = format!("a[href='/problems/{}/solution/']", slug);
        Ok(SolutionAffordances {
            link: self.executor.count(&link).await? > 0,
            premium_marker: self.executor.count(&format!("{} .css-ut75m1-ColoredIcon", link)).await? > 0,
            free_marker: self.executor.count(&format!("{} .css-1nf3fa5-ColoredIcon", link)).await? > 0,
        })
    }

    async fn content_blocks(&mut self) -> Result<usize> {
        self.executor.count(scripts::SOLUTION_FRAMES).await
    }

    async fn block_variants(&mut self, block: usize) -> Result<StepOutcome<Vec<String>>> {
        let script = scripts::frame_tabs(scripts::SOLUTION_FRAMES, block);
        let deadline = tokio::time::Instant::now() + self.executor.timeout();
        loop {
            let tabs: FrameTabs = self.executor.eval_as(script.clone()).await?;
            match tabs.state.as_str() {
                "ok" => return Ok(StepOutcome::Done(tabs.tabs)),
                "empty" => return Ok(StepOutcome::Done(Vec::new())),
                "missing" => return Ok(StepOutcome::Transient(format!("代码块 {} 不存在", block))),
                _ if tokio::time::Instant::now() >= deadline => {
                    return Ok(StepOutcome::Transient(format!("代码块 {} 语言标签未出现", block)));
                }
                _ => sleep(Duration::from_millis(250)).await,
            }
        }
    }

    async fn expansion_targets(&mut self, region: ExpansionRegion) -> Result<usize> {
        self.executor
            .eval_as(format!("({}).length", Self::expansion_query(region)))
            .await
    }

    async fn select_question_variant(&mut self, variant: &str) -> Result<()> {
        let selector = format!("li[data-cy='lang-select-{}']", variant);
        let clicked: bool = self
            .executor
            .eval_as(format!(
                "(() => {{ const el = document.querySelector({}); if (el) el.click(); return !!el; }})()",
                serde_json::to_string(&selector)?
            ))
            .await?;
        if !clicked {
            return Err(AppError::interaction("选择题目语言", format!("找不到语言 {}", variant)));
        }
        Ok(())
    }

    async fn select_block_variant(&mut self, block: usize, variant: &str) -> Result<StepOutcome<()>> {
        let result: ScriptResult = self
            .executor
            .eval_as(scripts::frame_select(scripts::SOLUTION_FRAMES, block, variant))
            .await?;
        if !result.ok {
            return Ok(StepOutcome::Transient(format!(
                "代码块 {} 选择 {} 失败: {}",
                block, variant, result.reason
            )));
        }
        sleep(Duration::from_millis(500)).await;
        Ok(StepOutcome::Done(()))
    }

    async fn expand_next(&mut self, region: ExpansionRegion) -> Result<StepOutcome<()>> {
        let clicked: bool = self
            .executor
            .eval_as(format!(
                "(() => {{ const els = {}; if (!els.length) return false; els[0].setAttribute('{}', '1'); els[0].scrollIntoView(); els[0].click(); return true; }})()",
                Self::expansion_query(region),
                scripts::EXPANDED_MARK
            ))
            .await?;
        if !clicked {
            return Ok(StepOutcome::Transient("没有可展开的元素".to_string()));
        }
        sleep(Duration::from_millis(500)).await;
        Ok(StepOutcome::Done(()))
    }

    async fn submit_login(&mut self, username: &str, password: &str) -> Result<()> {
        self.navigate(PageTarget::Login).await?;
        let page = self.executor.page();
        page.find_element(scripts::LOGIN_INPUT)
            .await?
            .click()
            .await?
            .type_str(username)
            .await?;
        page.find_element(scripts::PASSWORD_INPUT)
            .await?
            .click()
            .await?
            .type_str(password)
            .await?;
        page.find_element(scripts::SIGNIN_BUTTON).await?.click().await?;
        self.executor.wait_for_selector(scripts::AFTER_LOGIN_MARKER).await?;
        self.authenticated = true;
        Ok(())
    }

    async fn credentials(&mut self) -> Result<Vec<Credential>> {
        let cookies = self.executor.page().get_cookies().await?;
        Ok(cookies.into_iter().map(cookie_to_credential).collect())
    }

    async fn apply_credentials(&mut self, credentials: &[Credential]) -> Result<()> {
        self.navigate(PageTarget::Home).await?;
        let params = credentials
            .iter()
            .map(credential_to_param)
            .collect::<Result<Vec<_>>>()?;
        self.executor.page().set_cookies(params).await?;
        self.executor.page().reload().await?;
        Ok(())
    }

    async fn is_authenticated(&mut self) -> Result<Option<bool>> {
        let either = format!(
            "document.querySelector({}) !== null || document.querySelector({}) !== null",
            serde_json::to_string(scripts::LOGGED_IN_MARKER)?,
            serde_json::to_string(scripts::LOGGED_OUT_MARKER)?
        );
        self.executor.wait_until("登录状态", &either).await?;

        let logged_in = self.executor.count(scripts::LOGGED_IN_MARKER).await? > 0;
        let logged_out = self.executor.count(scripts::LOGGED_OUT_MARKER).await? > 0;
        if logged_in == logged_out {
            warn!("登录状态探测结果矛盾 (已登录: {}, 未登录: {})", logged_in, logged_out);
            self.authenticated = false;
            return Ok(None);
        }
        self.authenticated = logged_in;
        Ok(Some(logged_in))
    }

    async fn isolate(&mut self, view: DocumentView) -> Result<()> {
        match view {
            DocumentView::Question => {
                self.executor.run(scripts::HIDE_SCROLLBAR).await?;
                self.executor.run(scripts::remove_all(scripts::QUESTION_BOILERPLATE)).await?;
                for text in ["Autocomplete", "Add to List", "Share"] {
                    self.executor.run(scripts::remove_parent_by_text("span", text)).await?;
                }
                if self.authenticated {
                    self.executor
                        .run(scripts::remove_parent_by_text(
                            "div .title__3BS7",
                            "Seen this question in a real interview before?",
                        ))
                        .await?;
                }
                sleep(Duration::from_secs(1)).await;

                let isolated: bool = self
                    .executor
                    .eval_as(scripts::isolate_question(self.options.question_page_width))
                    .await?;
                if !isolated {
                    return Err(AppError::interaction("整理题目页", "找不到题目正文"));
                }
                sleep(Duration::from_secs(2)).await;
                Ok(())
            }
            DocumentView::Solution => {
                let url = self.current_url().await?;
                let slug = url
                    .trim_end_matches('/')
                    .trim_end_matches("/solution")
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                self.prepare_solution_page(&slug).await?;
                self.executor.run(scripts::remove_all(scripts::SOLUTION_BOILERPLATE)).await?;
                sleep(Duration::from_secs(1)).await;
                Ok(())
            }
            DocumentView::Comments | DocumentView::CommentsExpanded => {
                self.executor.run(scripts::clean_comment_frames()).await?;
                self.fit_comments_width().await
            }
        }
    }

    async fn render_to_document(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let params = PrintToPdfParams {
            paper_width: Some(PAPER_WIDTH_IN),
            paper_height: Some(PAPER_HEIGHT_IN),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            print_background: Some(true),
            ..Default::default()
        };
        let pdf = self.executor.page().pdf(params).await?;
        tokio::fs::write(path, pdf).await?;
        debug!("已保存: {}", path.display());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.owns_browser {
            self.browser.close().await?;
        } else {
            self.executor.page().clone().close().await?;
        }
        Ok(())
    }
}

fn cookie_to_credential(cookie: Cookie) -> Credential {
    // 会话 cookie 的 expires 为 -1
    let expiry = if cookie.expires > 0.0 {
        DateTime::<Utc>::from_timestamp(cookie.expires as i64, 0)
    } else {
        None
    };
    Credential {
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain.trim_start_matches('.').to_string(),
        path: cookie.path,
        expiry,
        secure: cookie.secure,
        http_only: cookie.http_only,
        same_site: cookie.same_site.map(|s| {
            match s {
                CookieSameSite::Strict => "Strict",
                CookieSameSite::Lax => "Lax",
                CookieSameSite::None => "None",
            }
            .to_string()
        }),
    }
}

fn credential_to_param(credential: &Credential) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(credential.name.clone())
        .value(credential.value.clone())
        .domain(credential.domain.clone())
        .path(credential.path.clone())
        .secure(credential.secure)
        .http_only(credential.http_only);
    if let Some(expiry) = credential.expiry {
        builder = builder.expires(TimeSinceEpoch::new(expiry.timestamp() as f64));
    }
    if let Some(same_site) = credential.same_site.as_deref() {
        let parsed = match same_site.to_ascii_lowercase().as_str() {
            "strict" => Some(CookieSameSite::Strict),
            "lax" => Some(CookieSameSite::Lax),
            "none" => Some(CookieSameSite::None),
            _ => None,
        };
        if let Some(parsed) = parsed {
            builder = builder.same_site(parsed);
        }
    }
    builder
        .build()
        .map_err(|e| AppError::Auth(format!("无效的凭证 {}: {}", credential.name, e)))
}
