mod config;
mod engine;
mod error;
mod options;
mod plan;

pub use config::RippleConfig;
pub use engine::{BumpEngine, plan_bumps};
pub use error::{ConfigError, PlanFailure};
pub use options::EngineOptions;
pub use plan::{BumpDecision, BumpPlan, RangeRewrite};
