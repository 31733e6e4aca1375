pub mod alert;
pub mod listing;
pub mod variant;

// Re-exports for convenience
pub use alert::*;
pub use listing::*;
pub use variant::*;
