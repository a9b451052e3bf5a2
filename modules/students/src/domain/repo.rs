use async_trait::async_trait;
use query_core::{Filter, Pagination, Sort};
use thiserror::Error;

/// Failures a repository reports to the domain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// The descriptors reference an unknown field or carry a mistyped value.
    #[error("{0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Storage(String),
}

/// Port for the domain layer: generic persistence over one table.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Insert payload; the stored `T` carries the generated key.
    type Draft: Send + 'static;

    async fn insert(&self, draft: Self::Draft) -> Result<T, RepoError>;

    /// Page of rows matching every filter, ordered by `sort` when given.
    async fn find_all(
        &self,
        filters: &[Filter],
        sort: Option<&Sort>,
        pagination: &Pagination,
    ) -> Result<Vec<T>, RepoError>;

    async fn count(&self, filters: &[Filter]) -> Result<u64, RepoError>;
}
