//! Knowledge base collaborator interface.
//!
//! The actual article search lives elsewhere; the pipeline only asks for a
//! pre-formatted excerpt to drop into the system prompt or to answer a
//! search_knowledge_base tool call.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// A bounded, formatted text block relevant to `query`, or `None` when
    /// nothing matches.
    async fn context_for_query(
        &self,
        tenant_id: Uuid,
        query: &str,
        max_articles: usize,
        max_chars: usize,
    ) -> Result<Option<String>>;
}
