//! 会话工厂 - 编排层
//!
//! 把浏览器会话和登录状态接在一起：新会话先回放保存的凭证，
//! 仍未登录且配置了账号时再显式登录。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser::LaunchOptions;
use crate::config::Config;
use crate::error::Result;
use crate::infrastructure::{ChromeOptions, ChromeSession, Session, SessionFactory};
use crate::services::AuthStore;

pub struct ChromeSessionFactory {
    options: ChromeOptions,
    auth: Arc<AuthStore>,
    load_saved_cookies: bool,
}

impl ChromeSessionFactory {
    pub fn new(options: ChromeOptions, auth: Arc<AuthStore>, load_saved_cookies: bool) -> Self {
        Self {
            options,
            auth,
            load_saved_cookies,
        }
    }

    pub fn from_config(config: &Config, auth: Arc<AuthStore>) -> Self {
        let options = ChromeOptions {
            base_url: config.base_url.clone(),
            launch: LaunchOptions {
                headless: config.headless,
                chrome_executable: config.chrome_executable.clone(),
                ..Default::default()
            },
            debug_port: config.browser_debug_port,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            question_page_width: config.question_page_width,
            solution_page_width: config.solution_page_width,
            max_page_width: config.max_page_width,
        };
        Self::new(options, auth, config.load_saved_cookies)
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn create(&self) -> Result<Session> {
        let mut session = ChromeSession::open(self.options.clone()).await?;

        let mut authenticated = false;
        if self.load_saved_cookies {
            match self.auth.try_restore(&mut session).await {
                Ok((_, logged_in)) => authenticated = logged_in,
                Err(e) => warn!("⚠️ 恢复登录凭证失败: {}", e),
            }
        }
        if !authenticated && self.auth.can_login() {
            self.auth.login_and_persist(&mut session).await?;
            authenticated = true;
        }
        info!("🌐 新会话已就绪 (已登录: {})", authenticated);

        Ok(Box::new(session))
    }
}
