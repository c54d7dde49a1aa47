pub mod cache;
pub mod rate_limit;
pub mod tips;

pub use cache::TtlCache;
pub use rate_limit::RateLimiter;
pub use tips::{TipService, TipSettings};
