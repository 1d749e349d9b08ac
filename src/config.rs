use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};

/// 默认配置文件
const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的题目数量
    pub max_concurrent_items: usize,
    /// 站点根地址
    pub base_url: String,
    /// 输出目录（题目文件夹和目录缓存都放在这里）
    pub output_folder: String,
    /// 目录缓存文件名
    pub catalog_file_name: String,
    /// 登录凭证存放文件
    pub cookies_file: String,
    // --- 登录 ---
    pub username: String,
    pub password: String,
    /// 是否尝试恢复已保存的凭证
    pub load_saved_cookies: bool,
    // --- 浏览器 ---
    pub headless: bool,
    /// 设置后连接已运行的浏览器，否则自行启动
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub question_page_width: u32,
    pub solution_page_width: u32,
    pub max_page_width: u32,
    /// 单步等待上限（秒）
    pub wait_timeout_secs: u64,
    /// 展开"更多回复"的最大点击次数
    pub max_expansions: usize,
    // --- 抓取策略 ---
    pub force_refresh: bool,
    pub fetch_all_solution_languages: bool,
    pub preferred_question_languages: Vec<String>,
    pub preferred_solution_languages: Vec<String>,
    pub skip: usize,
    pub take: Option<usize>,
    /// 只抓取单个题目
    pub crawl_url: Option<String>,
    // --- 日志 ---
    pub verbose_logging: bool,
    pub output_log_file: String,
    pub review_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_items: 5,
            base_url: "https://leetcode.com".to_string(),
            output_folder: "LeechCode-Problems".to_string(),
            catalog_file_name: "Problems.json".to_string(),
            cookies_file: "Cookies.data".to_string(),
            username: String::new(),
            password: String::new(),
            load_saved_cookies: true,
            headless: true,
            browser_debug_port: None,
            chrome_executable: None,
            question_page_width: 900,
            solution_page_width: 900,
            max_page_width: 1600,
            wait_timeout_secs: 20,
            max_expansions: 50,
            force_refresh: false,
            fetch_all_solution_languages: true,
            preferred_question_languages: to_strings(&[
                "C#",
                "Java",
                "Python3",
                "Python",
                "MS SQL Server",
                "MySQL",
                "C++",
                "Go",
                "Rust",
                "Oracle",
            ]),
            preferred_solution_languages: to_strings(&[
                "C#",
                "Java",
                "Python3",
                "Python",
                "MS SQL Server",
                "MySQL",
                "C++",
                "Go",
            ]),
            skip: 0,
            take: None,
            crawl_url: None,
            verbose_logging: false,
            output_log_file: "crawl_log.txt".to_string(),
            review_file: "review.txt".to_string(),
        }
    }
}

impl Config {
    /// 配置文件 + 环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("HARVEST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        if !Path::new(&path).exists() {
            let config = Self::from_env();
            config.validate()?;
            return Ok(config);
        }
        let config = Self::from_file(&path)?.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取，缺省字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// 用环境变量覆盖当前值
    pub fn apply_env(self) -> Self {
        let current = self;
        Self {
            max_concurrent_items: env_parse("MAX_CONCURRENT_ITEMS").unwrap_or(current.max_concurrent_items),
            base_url: std::env::var("BASE_URL").unwrap_or(current.base_url),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(current.output_folder),
            catalog_file_name: std::env::var("CATALOG_FILE_NAME").unwrap_or(current.catalog_file_name),
            cookies_file: std::env::var("COOKIES_FILE").unwrap_or(current.cookies_file),
            username: std::env::var("HARVEST_USERNAME").unwrap_or(current.username),
            password: std::env::var("HARVEST_PASSWORD").unwrap_or(current.password),
            load_saved_cookies: env_parse("LOAD_SAVED_COOKIES").unwrap_or(current.load_saved_cookies),
            headless: env_parse("HEADLESS").unwrap_or(current.headless),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(current.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(current.chrome_executable),
            question_page_width: env_parse("QUESTION_PAGE_WIDTH").unwrap_or(current.question_page_width),
            solution_page_width: env_parse("SOLUTION_PAGE_WIDTH").unwrap_or(current.solution_page_width),
            max_page_width: env_parse("MAX_PAGE_WIDTH").unwrap_or(current.max_page_width),
            wait_timeout_secs: env_parse("WAIT_TIMEOUT_SECS").unwrap_or(current.wait_timeout_secs),
            max_expansions: env_parse("MAX_EXPANSIONS").unwrap_or(current.max_expansions),
            force_refresh: env_parse("FORCE_REFRESH").unwrap_or(current.force_refresh),
            fetch_all_solution_languages: env_parse("FETCH_ALL_SOLUTION_LANGUAGES")
                .unwrap_or(current.fetch_all_solution_languages),
            preferred_question_languages: env_list("PREFERRED_QUESTION_LANGUAGES")
                .unwrap_or(current.preferred_question_languages),
            preferred_solution_languages: env_list("PREFERRED_SOLUTION_LANGUAGES")
                .unwrap_or(current.preferred_solution_languages),
            skip: env_parse("SKIP").unwrap_or(current.skip),
            take: env_parse("TAKE").or(current.take),
            crawl_url: std::env::var("CRAWL_URL").ok().or(current.crawl_url),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(current.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(current.output_log_file),
            review_file: std::env::var("REVIEW_FILE").unwrap_or(current.review_file),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent_items == 0 {
            return Err(AppError::Config("max_concurrent_items 必须大于 0".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(AppError::Config("base_url 不能为空".to_string()));
        }
        Ok(())
    }

    /// 目录缓存的完整路径
    pub fn catalog_path(&self) -> PathBuf {
        Path::new(&self.output_folder).join(&self.catalog_file_name)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// 逗号分隔的列表
fn env_list(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
