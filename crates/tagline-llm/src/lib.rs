pub mod analysis;
pub mod config;
pub mod credential;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod prompt;
pub mod traits;

pub use config::{LlmSettings, ProviderType, TransportFactory};
pub use credential::Credential;
pub use gemini::GeminiTransport;
pub use http::{RawResponse, ReqwestSender, RequestSender};
pub use openai::OpenAITransport;
pub use prompt::analysis_prompt;
pub use traits::{AnalysisTransport, Classification, KeyAction, TransportRequest};
