//! Retrieval-and-generation port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;

/// Answer produced by the knowledge base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
}

/// Opaque retrieval-augmented answering backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RetrievalPort: Send + Sync {
    /// Retrieve supporting text for `question` and generate an answer
    async fn retrieve_and_generate(&self, question: &str) -> Result<Answer, ProviderError>;

    /// Name reported in provider errors
    fn name(&self) -> &'static str {
        "rag"
    }
}
