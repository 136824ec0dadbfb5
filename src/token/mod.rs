pub mod cache;
pub mod types;

pub use cache::{TokenCache, DEFAULT_SERVICE};
pub use types::{format_date, parse_date, AccessToken};
