//! Concrete `LLMProvider` implementations: the Anthropic Messages API
//! adapter used in production and a scripted in-memory provider used by
//! tests and other crates' doctests.

pub mod anthropic;
pub mod scripted;

pub use anthropic::AnthropicProvider;
pub use scripted::ScriptedProvider;
