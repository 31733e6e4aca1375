pub mod notifier;
pub mod source;

pub use notifier::{MessageId, Notifier};
pub use source::ListingSource;
