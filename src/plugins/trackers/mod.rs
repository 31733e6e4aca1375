// Listing attribute extractors
pub mod model;
pub mod price;

pub use model::{ModelMatch, ModelMatcher};
pub use price::PriceExtractor;
