pub mod catalog;
pub mod credential;
pub mod item;

pub use catalog::{SharedCatalog, SharedItem};
pub use credential::Credential;
pub use item::{
    ApiCatalog, Difficulty, DifficultyTier, FrameTab, Item, QuestionMeta, SolutionAccess,
    SolutionFrame, SolutionMeta, SolutionPresence, Stat,
};
