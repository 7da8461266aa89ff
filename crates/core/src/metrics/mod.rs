pub mod collector;
pub mod ports;

pub use collector::CatalogMetricsCollector;
pub use ports::MetricsCollector;
