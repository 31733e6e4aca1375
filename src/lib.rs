pub mod classifier;
pub mod config;
pub mod dedup;
pub mod emitter;
pub mod models;
pub mod pipeline;
pub mod plugins;
pub mod pricing;
pub mod scheduler;
pub mod scraper;
pub mod scorer;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use pipeline::{ListingPipeline, PassReport};
pub use scheduler::{ScanScheduler, SchedulerStats};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
