#[path = "resilience/policy.rs"]
mod policy;

#[path = "resilience/classify.rs"]
mod classify;

#[path = "resilience/executor.rs"]
mod executor;

#[path = "resilience/rate_limit.rs"]
mod rate_limit;

pub use classify::{classify, ErrorClass};
pub use executor::execute;
pub use policy::RetryPolicy;
pub use rate_limit::RateLimiter;
