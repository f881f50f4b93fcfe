//! Retriever adapters

mod fixture;
mod http;

pub use fixture::FixtureRetriever;
pub use http::HttpRetriever;
