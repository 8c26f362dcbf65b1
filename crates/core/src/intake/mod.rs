//! Turning extraction-service responses into canonical products.

pub mod keys;
pub mod normalize;
pub mod unwrap;

pub use normalize::normalize;
pub use unwrap::{extract_products, locate_products};
