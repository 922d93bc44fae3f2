//! LLM backend abstraction for multi-provider support
//!
//! All providers implement the `LlmBackend` trait. The [`ProviderGateway`]
//! binds them to routes, applies deadlines and the fallback-model retry, and
//! reports failures as classified [`ProviderError`]s.

mod anthropic_backend;
mod gateway;
pub(crate) mod http_client;
mod openai_backend;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use gateway::{ProviderGateway, ProviderReply, RouteBinding};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use rfpgen_utils::error::{LlmError, ProviderError, ProviderErrorClass};
