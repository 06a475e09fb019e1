//! Gemini: thin adapter over the generative-language REST API.
//!
//! The [`GenerateContent`] trait is the only seam the rest of the crate
//! depends on, so the advisor can run against a scripted model in tests.

pub mod client;
pub mod config;
pub mod schema;
pub mod types;

pub use client::{EnvGeminiClient, GeminiClient};
pub use types::{GeminiError, GenerateContent, GenerateRequest};
