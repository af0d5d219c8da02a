use async_trait::async_trait;
use study_core::model::{CatalogError, Session};
use thiserror::Error;

/// Why a seed catalog could not be obtained.
///
/// The store recovers from every variant by falling back to the built-in
/// catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error("seed source unavailable: {0}")]
    Unavailable(String),

    #[error("seed source answered with status {0}")]
    Status(u16),

    #[error("malformed seed payload: {0}")]
    Malformed(String),
}

impl From<CatalogError> for SeedError {
    fn from(err: CatalogError) -> Self {
        SeedError::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        SeedError::Malformed(err.to_string())
    }
}

/// Read-only origin of the initial session catalog.
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Fetch the full catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` when the catalog cannot be fetched or parsed.
    async fn fetch_sessions(&self) -> Result<Vec<Session>, SeedError>;
}

/// Parse a seed document (a JSON array of sessions).
///
/// # Errors
///
/// Returns `SeedError::Malformed` if the text is not a session array.
pub fn parse_catalog(raw: &str) -> Result<Vec<Session>, SeedError> {
    Ok(serde_json::from_str(raw)?)
}

/// Seed source that serves a fixed catalog, or a fixed failure.
#[derive(Debug, Clone, Default)]
pub struct StaticSeedSource {
    sessions: Option<Vec<Session>>,
}

impl StaticSeedSource {
    #[must_use]
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Some(sessions),
        }
    }

    /// A source that always fails, as if offline.
    #[must_use]
    pub fn offline() -> Self {
        Self { sessions: None }
    }
}

#[async_trait]
impl SeedSource for StaticSeedSource {
    async fn fetch_sessions(&self) -> Result<Vec<Session>, SeedError> {
        self.sessions
            .clone()
            .ok_or_else(|| SeedError::Unavailable("offline".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_non_array_payload() {
        let err = parse_catalog(r#"{"sessions": []}"#).unwrap_err();
        assert!(matches!(err, SeedError::Malformed(_)));
    }

    #[test]
    fn parse_accepts_minimal_sessions() {
        let sessions =
            parse_catalog(r#"[{"id":"a","week":1,"day":"Saturday","title":"t","topic":"t"}]"#)
                .unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn offline_source_fails() {
        let err = StaticSeedSource::offline().fetch_sessions().await.unwrap_err();
        assert!(matches!(err, SeedError::Unavailable(_)));
    }
}
