use thiserror::Error;

/// 应用程序错误类型
///
/// 能力层和流程层统一返回该类型；入口层（main / App）使用 anyhow 包装。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / CDP 错误
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 导航失败（页面始终无法稳定）
    #[error("导航到 {target} 失败: {reason}")]
    Navigation { target: String, reason: String },

    /// 等待超时
    #[error("等待 {what} 超时 ({secs} 秒)")]
    Timeout { what: String, secs: u64 },

    /// 单个交互步骤失败（严格模式下才会上抛）
    #[error("交互失败 ({step}): {reason}")]
    Interaction { step: String, reason: String },

    /// 页面要求登录，但未配置账号
    #[error("需要登录，但未配置用户名/密码")]
    AuthRequired,

    /// 登录 / 凭证相关错误
    #[error("认证错误: {0}")]
    Auth(String),

    /// 题目目录错误
    #[error("题目目录错误: {0}")]
    Catalog(String),

    /// HTTP 请求失败
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 文件读写失败
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML 解析失败
    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    /// 凭证行格式错误
    #[error("凭证记录第 {line} 行格式错误: {reason}")]
    CredentialParse { line: usize, reason: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建导航错误
    pub fn navigation(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::Navigation {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建交互错误
    pub fn interaction(step: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Interaction {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        AppError::Timeout {
            what: what.into(),
            secs,
        }
    }

    /// 创建目录错误
    pub fn catalog(message: impl Into<String>) -> Self {
        AppError::Catalog(message.into())
    }
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
