//! LLM provider implementations

mod anthropic;
mod factory;
mod http_client;
mod openai;

pub use anthropic::AnthropicProvider;
pub use factory::{ProviderKind, ProviderRegistry, ProviderSettings, ResolvedProvider};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
