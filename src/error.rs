//! Error taxonomy shared by the fetch gate, the resolvers and the cache store.

use thiserror::Error;

/// Outcome of a single outbound request that did not produce data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
  /// No response arrived before the deadline; the request was cancelled.
  #[error("request timed out")]
  Timeout,

  /// Transport-level failure (DNS, connection reset, unreadable body).
  #[error("network error: {0}")]
  NetworkError(String),

  /// The API answered with its error envelope or a non-success status.
  #[error("API error: {0}")]
  ApiError(String),
}

/// Failure surfaced by a resolver after its fallback policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// Offline and nothing usable in the cache.
  #[error("offline and no cached data")]
  OfflineNoData,

  #[error("request timed out")]
  Timeout,

  #[error("network error: {0}")]
  Network(String),

  #[error("API error: {0}")]
  Api(String),
}

impl From<FetchFailure> for ResolveError {
  fn from(failure: FetchFailure) -> Self {
    match failure {
      FetchFailure::Timeout => ResolveError::Timeout,
      FetchFailure::NetworkError(msg) => ResolveError::Network(msg),
      FetchFailure::ApiError(msg) => ResolveError::Api(msg),
    }
  }
}

/// Durable storage errors. Handled inside the cache store, never shown to the user.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage quota exceeded")]
  QuotaExceeded,

  #[error("malformed cache snapshot: {0}")]
  MalformedSnapshot(#[from] serde_json::Error),

  #[error("storage backend error: {0}")]
  Backend(String),
}

impl StorageError {
  pub fn is_quota(&self) -> bool {
    matches!(self, StorageError::QuotaExceeded)
  }
}
