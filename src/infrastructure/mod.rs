//! 基础设施层：持有稀缺资源（浏览器页面），只暴露能力

pub mod chrome_session;
pub mod js_executor;
pub mod renderer;
pub mod scripts;
pub mod session_pool;

pub use chrome_session::{ChromeOptions, ChromeSession};
pub use js_executor::JsExecutor;
pub use renderer::{
    DocumentView, ExpansionRegion, NavigateOutcome, PageTarget, Renderer, Session,
    SolutionAffordances, StepOutcome,
};
pub use session_pool::{PooledSession, SessionFactory, SessionPool};
