use crate::error::DomainError;
use async_trait::async_trait;

/// Source of fresh entity identifiers.
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn next_id(&self) -> Result<i64, DomainError>;
}
