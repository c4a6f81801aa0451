pub mod cloudflare;
pub mod gemini;
pub mod openrouter;
mod types;

pub use types::*;

/// Greeting sent by the per-provider connectivity checks.
pub const CHECK_PROMPT: &str =
    "Hello! This is a test message. Please respond with 'API test successful' if you receive this.";
