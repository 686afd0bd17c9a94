pub mod logging;
pub mod retry;

pub use retry::{retry, Backoff, RetryExhausted, RetryPolicy};
