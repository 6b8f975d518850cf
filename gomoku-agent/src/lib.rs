pub mod admission;
pub mod advisory;
pub mod agent;
pub mod agent_provider;
pub mod agents;
pub mod breaker;
pub mod candidate;
pub mod difficulty;
pub mod heuristic;
pub mod opening_book;
pub mod prediction;
pub mod timeout;
