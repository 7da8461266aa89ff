pub mod executor;
pub mod explain;
pub mod ports;

pub use executor::SessionAnalyzeExecutor;
pub use explain::parse_explain;
pub use ports::AnalyzeExecutor;
