mod cache;
mod client;
mod cost;
mod prompt;
mod response;

pub use cache::{CachePolicy, ResponseCache};
pub use client::*;
pub use cost::{estimate_cost, usd_to_krw};
pub use prompt::*;
pub use response::*;

#[cfg(test)]
pub(crate) mod testing;
