pub mod cache;
pub mod engine;

pub use cache::{CacheStats, PredictionCache};
pub use engine::{PredictionTicket, PredictiveEngine, ReplyPlanner};
