pub mod logger;
pub mod ports;

pub use logger::ExplainPlanLogger;
pub use ports::PlanLogger;
