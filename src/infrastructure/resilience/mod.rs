//! Retry and backoff around external model calls

mod caller;

pub use caller::ResilientCaller;
