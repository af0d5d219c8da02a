use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use storage::seed::{SeedError, SeedSource, parse_catalog};
use study_core::model::Session;

/// Request timeout used when the front end does not configure one.
pub const DEFAULT_SEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the seed document over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpSeedSource {
    client: Client,
    url: String,
}

impl HttpSeedSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Same as `new`, but gives up on the request after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    async fn fetch_sessions(&self) -> Result<Vec<Session>, SeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| SeedError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SeedError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SeedError::Unavailable(err.to_string()))?;
        parse_catalog(&body)
    }
}

/// Reads the seed document from a local JSON file.
#[derive(Clone, Debug)]
pub struct FileSeedSource {
    path: PathBuf,
}

impl FileSeedSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SeedSource for FileSeedSource {
    async fn fetch_sessions(&self) -> Result<Vec<Session>, SeedError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| match err.kind() {
                io::ErrorKind::InvalidData => SeedError::Malformed(err.to_string()),
                _ => SeedError::Unavailable(format!("{}: {err}", self.path.display())),
            })?;
        parse_catalog(&raw)
    }
}

/// Pick a seed source for a location: `http(s)://` URLs are fetched with the
/// given request timeout, anything else is read as a file path.
///
/// # Errors
///
/// Returns `reqwest::Error` if the HTTP client cannot be built.
pub fn seed_source_for(
    location: &str,
    timeout: Duration,
) -> Result<Arc<dyn SeedSource>, reqwest::Error> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(Arc::new(HttpSeedSource::with_timeout(trimmed, timeout)?))
    } else {
        Ok(Arc::new(FileSeedSource::new(trimmed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CATALOG: &str = r#"[
        {"id":"w1-fri","week":1,"day":"Friday","title":"Foundations","topic":"Cloud",
         "tasks":[{"text":"Read","completed":false}]}
    ]"#;

    #[tokio::test]
    async fn http_source_parses_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/sessions.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG))
            .mount(&server)
            .await;

        let source = HttpSeedSource::new(format!("{}/data/sessions.json", server.uri()));
        let sessions = source.fetch_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id().as_str(), "w1-fri");
    }

    #[tokio::test]
    async fn http_source_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSeedSource::new(format!("{}/missing.json", server.uri()));
        let err = source.fetch_sessions().await.unwrap_err();
        assert!(matches!(err, SeedError::Status(404)));
    }

    #[tokio::test]
    async fn http_source_reports_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let source = HttpSeedSource::new(server.uri());
        let err = source.fetch_sessions().await.unwrap_err();
        assert!(matches!(err, SeedError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(CATALOG)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let source = seed_source_for(
            &format!("{}/data/sessions.json", server.uri()),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = source.fetch_sessions().await.unwrap_err();
        assert!(matches!(err, SeedError::Unavailable(_)));
    }

    #[tokio::test]
    async fn http_location_within_timeout_is_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG))
            .mount(&server)
            .await;

        let source = seed_source_for(&format!("  {}/s.json ", server.uri()), DEFAULT_SEED_TIMEOUT)
            .unwrap();
        assert_eq!(source.fetch_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let source = FileSeedSource::new("/definitely/not/here/sessions.json");
        let err = source.fetch_sessions().await.unwrap_err();
        assert!(matches!(err, SeedError::Unavailable(_)));
    }

    #[tokio::test]
    async fn file_source_reads_catalog() {
        let path = std::env::temp_dir().join(format!("study-seed-{}.json", std::process::id()));
        tokio::fs::write(&path, CATALOG).await.unwrap();
        let sessions = seed_source_for(path.to_str().unwrap(), DEFAULT_SEED_TIMEOUT)
            .unwrap()
            .fetch_sessions()
            .await
            .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }
}
