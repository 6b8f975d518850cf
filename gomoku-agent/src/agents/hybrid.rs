mod agent;
pub mod arbiter;
mod options;
mod orchestrator;
mod provider;

pub use agent::*;
pub use options::*;
pub use orchestrator::*;
pub use provider::*;
