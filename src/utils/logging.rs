/// 日志工具模块
///
/// 订阅器初始化、运行日志文件和几条固定格式的横幅
use std::fs::{self, OpenOptions};
use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// 安装全局订阅器；`RUST_LOG` 优先
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // 测试里可能被重复调用
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目抓取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, output_folder: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 增量抓取模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("📁 输出目录: {}", output_folder);
    info!("{}", "=".repeat(60));
}

pub fn log_items_loaded(total: usize, selected: usize, max_concurrent: usize) {
    info!("✓ 目录中共 {} 道题目，本次处理 {} 道", total, selected);
    info!("📋 同时处理 {} 道", max_concurrent);
}

/// 运行结果汇总
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    /// 两个阶段都已完整（包括无需处理的）
    pub complete: usize,
    /// 本次实际抓取过的
    pub captured: usize,
    pub failed: usize,
}

/// 打印最终统计信息，并追加到日志文件
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) -> Result<()> {
    let finished_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", finished_at);
    info!("{}", "=".repeat(60));
    info!("✅ 完整: {}/{}", stats.complete, stats.total);
    info!("📥 本次抓取: {}", stats.captured);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "完成时间: {}\n完整: {}/{}\n本次抓取: {}\n失败: {}",
        finished_at, stats.complete, stats.total, stats.captured, stats.failed
    )?;
    Ok(())
}
