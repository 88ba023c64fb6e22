mod client;

pub use client::OpenAITransport;
