pub mod decision;
pub mod item_ctx;
pub mod question_flow;
pub mod solution_flow;

pub use decision::{question_needed, solution_needed, PhaseDecision};
pub use item_ctx::ItemCtx;
pub use question_flow::QuestionFlow;
pub use solution_flow::{SolutionFlow, SolutionRun};
