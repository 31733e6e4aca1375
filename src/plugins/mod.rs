pub mod traits;
pub mod manager;
pub mod sources;
pub mod trackers;
pub mod notifiers;

pub use manager::SourceRegistry;
pub use traits::{ListingSource, Notifier};
