pub mod document_fetcher;
pub mod llm_client;

pub use document_fetcher::{DocumentFetcher, FetchedDocument};
pub use llm_client::LlmClient;
