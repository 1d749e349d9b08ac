use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};

/// 连接到已运行的浏览器，并为当前会话新开一个页面
///
/// 多个会话可以共用同一个浏览器，各自持有独立的页面。
pub async fn connect_to_browser_and_page(port: u16) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::Browser(format!("无法连接到浏览器 (端口: {}): {}", port, e))
    })?;
    debug!("浏览器连接成功");

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
        error!("创建新页面失败: {}", e);
        AppError::Browser(format!("创建新页面失败: {}", e))
    })?;
    debug!("已创建会话页面");

    Ok((browser, page))
}
