//! # Problem Harvest
//!
//! 增量抓取题目和题解，渲染成 PDF，并在本地目录缓存中记录抓取状态
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器页面），只暴露能力
//! - `Renderer` - 导航、发现、交互、渲染成文档四组能力 + 凭证回放
//! - `ChromeSession` - 基于 chromiumoxide 的实现，站点细节都在这里
//! - `SessionPool` - 会话复用，租约离开作用域时自动归还
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题目
//! - `CaptureEngine` - 抓题目页、抓题解页的一遍
//! - `LanguagePreferences` - 选择渲染语言
//! - `AuthStore` / `CatalogCache` / `ArtifactLayout` / `ReviewWriter`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的两个阶段
//! - `decision` - 阶段是否需要运行
//! - `QuestionFlow` / `SolutionFlow` - 阶段内的遍数和重试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 整个目录，管理资源和并发
//! - `orchestrator/item_processor` - 单道题目，租借会话并保存进度
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::{Renderer, SessionFactory, SessionPool, StepOutcome};
pub use models::{Item, SharedCatalog};
pub use orchestrator::{App, ItemOutcome, ItemProcessor};
pub use workflow::{ItemCtx, PhaseDecision};
