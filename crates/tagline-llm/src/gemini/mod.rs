mod client;

pub use client::{GeminiTransport, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
