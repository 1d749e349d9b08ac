//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量题目处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 加载目录，按 skip / take 取子集
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `item_processor` - 单道题目处理器
//! - 判定两个阶段是否需要运行
//! - 按需租借会话，结束时归还
//! - 每个阶段完成后保存目录
//!
//! ### `session_factory` - 会话工厂
//! - 启动或连接浏览器，恢复登录状态
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理整个目录)
//!     ↓
//! item_processor (处理单道题目)
//!     ↓
//! workflow::QuestionFlow / SolutionFlow (处理单个阶段)
//!     ↓
//! services (能力层：capture / language / auth / cache)
//!     ↓
//! infrastructure (基础设施：Renderer / SessionPool)
//! ```

pub mod batch_processor;
pub mod item_processor;
pub mod session_factory;

// 重新导出主要类型
pub use batch_processor::App;
pub use item_processor::{ItemOutcome, ItemProcessor, PhaseResult};
pub use session_factory::ChromeSessionFactory;
