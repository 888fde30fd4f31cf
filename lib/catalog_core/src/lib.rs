pub mod cursor;
pub mod errors;
pub mod flags;
pub mod homogenization;
pub mod quantity_info;
pub mod registry;
pub mod schema;
pub mod units;
