use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};

/// 启动参数
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// 启动浏览器并打开一个空白页面
pub async fn launch_browser(options: &LaunchOptions) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器 (headless: {})...", options.headless);

    let mut builder = BrowserConfig::builder()
        .window_size(options.window_width, options.window_height)
        .args(vec![
            "--disable-gpu",           // 无头模式必须禁用 GPU
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
        ]);
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(exe) = &options.chrome_executable {
        builder = builder.chrome_executable(Path::new(exe));
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(format!("配置浏览器失败: {}", e))
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(format!("创建页面失败: {}", e))
    })?;

    Ok((browser, page))
}
