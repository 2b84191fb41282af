//! OpenAI-compatible chat client and platform registry.
//!
//! Every supported LLM platform speaks the `/chat/completions` dialect, so a
//! single [`ChatClient`] serves all of them; per-platform differences reduce
//! to base URL, model name, credentials, and occasional request extensions
//! (Hunyuan's `enable_enhancement`). [`PlatformRegistry`] discovers which
//! platforms are usable from environment variables.

pub mod client;
pub mod platform;

pub use client::{ChatClient, ChatProvider, Message};
pub use platform::{PlatformConfig, PlatformRegistry};
