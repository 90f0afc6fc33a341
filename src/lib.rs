pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod http;
pub mod normalize;
pub mod output;
pub mod rate_limit;
pub mod request;
pub mod tools;
pub mod types;

pub use client::{ClientError, QuoteClient};
pub use types::{Outcome, QuoteRequest, QuoteResult, RateLimitStatus};
