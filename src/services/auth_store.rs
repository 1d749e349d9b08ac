//! 登录凭证存储 - 业务能力层
//!
//! 全进程共享一份凭证文件，所有读写都在同一把锁下完成。

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::infrastructure::Renderer;
use crate::models::credential;
use crate::utils::fs::write_atomic;

/// 配置里的账号
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    /// 用户名或密码为空时返回 `None`
    pub fn from_config(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

pub struct AuthStore {
    path: PathBuf,
    login: Option<LoginCredentials>,
    lock: Mutex<()>,
    logged_in: AtomicBool,
}

impl AuthStore {
    pub fn new(path: impl Into<PathBuf>, login: Option<LoginCredentials>) -> Self {
        Self {
            path: path.into(),
            login,
            lock: Mutex::new(()),
            logged_in: AtomicBool::new(false),
        }
    }

    pub fn can_login(&self) -> bool {
        self.login.is_some()
    }

    /// 最近一次恢复或登录之后的状态
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    /// 把保存的凭证回放到会话里并探测登录状态
    ///
    /// 返回 `(是否回放了凭证, 是否已登录)`。
    pub async fn try_restore(&self, session: &mut dyn Renderer) -> Result<(bool, bool)> {
        let _guard = self.lock.lock().await;

        if !tokio::fs::try_exists(&self.path).await? {
            debug!("没有保存的凭证: {}", self.path.display());
            return Ok((false, false));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let records = credential::parse_records(&content)?;
        session.apply_credentials(&records).await?;

        let authenticated = match session.is_authenticated().await? {
            Some(state) => state,
            None => {
                warn!("登录状态不明确，按未登录处理");
                false
            }
        };
        self.logged_in.store(authenticated, Ordering::SeqCst);
        info!("已恢复 {} 条凭证 (已登录: {})", records.len(), authenticated);
        Ok((true, authenticated))
    }

    /// 保存会话当前的凭证，整体覆盖
    pub async fn persist(&self, session: &mut dyn Renderer) -> Result<()> {
        let _guard = self.lock.lock().await;
        let records = session.credentials().await?;
        write_atomic(&self.path, credential::format_records(&records).as_bytes()).await?;
        debug!("已保存 {} 条凭证", records.len());
        Ok(())
    }

    /// 删除保存的凭证
    pub async fn invalidate(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            tokio::fs::remove_file(&self.path).await?;
        }
        self.logged_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// 用配置的账号登录并保存凭证
    pub async fn login_and_persist(&self, session: &mut dyn Renderer) -> Result<()> {
        let login = self.login.as_ref().ok_or(AppError::AuthRequired)?;
        info!("🔑 正在登录: {}", login.username);
        session.submit_login(&login.username, &login.password).await?;
        self.logged_in.store(true, Ordering::SeqCst);
        self.persist(session).await
    }
}
