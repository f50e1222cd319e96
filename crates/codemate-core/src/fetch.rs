use async_trait::async_trait;
use reqwest::Client;

use crate::error::{CodemateError, FetchError};
use crate::settings::Settings;

/// Retrieves raw markup for a pricing page. No parsing, no retries.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain HTTP GET with a browser-like user agent and a bounded timeout.
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> crate::error::Result<Self> {
        let http = Client::builder()
            .timeout(settings.fetch_timeout())
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| CodemateError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        let settings = Settings {
            fetch_timeout_secs: timeout_secs,
            ..Settings::default()
        };
        HttpFetcher::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn returns_body_and_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pricing"))
            .and(header_regex("user-agent", "^Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let body = fetcher(5)
            .fetch(&format!("{}/pricing", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = fetcher(5).fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err, FetchError::Status { status: 403 });
    }

    #[tokio::test]
    async fn slow_upstream_hits_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = fetcher(1).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Port 9 (discard) is almost never listening locally.
        let err = fetcher(2).fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
