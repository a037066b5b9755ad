use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use reqwest::{Client, Url, redirect};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, warn};

use crate::domain::errors::ResolveError;
use crate::domain::ports::LinkResolver;

/// Default number of redirect lookups in flight across the whole process.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;
const MAX_REDIRECTS: usize = 10;

/// Process-wide cap on concurrent redirect lookups.
///
/// Clones share the same permits, so every resolver built from one limiter
/// competes for the same slots.
#[derive(Debug, Clone)]
pub struct ResolveLimiter {
    semaphore: Arc<Semaphore>,
}

impl ResolveLimiter {
    /// Creates limiter with `max_concurrent` permits (at least one).
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Returns number of free permits.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>, ResolveError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| ResolveError::unavailable("resolver pool closed"))
    }
}

impl Default for ResolveLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// Per-resolver HTTP settings.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Whole-request timeout, redirects included.
    pub timeout: Duration,
    /// `User-Agent` header sent with every lookup.
    pub user_agent: String,
}

/// Follows redirects with a plain GET and reports where each URL lands.
#[derive(Debug, Clone)]
pub struct HttpRedirectResolver {
    client: Client,
    limiter: ResolveLimiter,
}

impl HttpRedirectResolver {
    /// Creates resolver drawing permits from `limiter`.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(limiter: ResolveLimiter, options: &ResolverOptions) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .timeout(options.timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ResolveError::unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, limiter })
    }

    async fn resolve_one(&self, link: &str) -> Result<String, ResolveError> {
        let url = Url::parse(link).map_err(|e| ResolveError::invalid_url(link, e.to_string()))?;

        let _permit = self.limiter.acquire().await?;
        debug!(url = link, "Following link");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::timeout(link)
            } else {
                ResolveError::network(link, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = link, %status, "Link resolved with non-success status");
        }

        let mut followed = response.url().clone();
        followed.set_query(None);
        let followed = followed.to_string();

        debug!(url = link, followed = %followed, "Followed link");
        Ok(followed)
    }
}

#[async_trait]
impl LinkResolver for HttpRedirectResolver {
    async fn resolve_all(&self, urls: Vec<String>) -> Result<Vec<String>, ResolveError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        try_join_all(urls.iter().map(|url| self.resolve_one(url))).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn make_resolver(timeout: Duration, limiter: ResolveLimiter) -> HttpRedirectResolver {
        let options = ResolverOptions {
            timeout,
            user_agent: "oxilinks-test".to_string(),
        };
        HttpRedirectResolver::new(limiter, &options).unwrap()
    }

    fn redirect_to(location: &str) -> ResponseTemplate {
        ResponseTemplate::new(302).insert_header("location", location)
    }

    #[tokio::test]
    async fn test_follows_redirect_and_strips_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short"))
            .respond_with(redirect_to(&format!("{}/@user/video/42?is_copy_url=1", server.uri())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/@user/video/42"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let resolver = make_resolver(Duration::from_secs(5), ResolveLimiter::default());
        let resolved = resolver
            .resolve_all(vec![format!("{}/short", server.uri())])
            .await
            .unwrap();

        assert_eq!(resolved, vec![format!("{}/@user/video/42", server.uri())]);
    }

    #[tokio::test]
    async fn test_preserves_input_order() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                redirect_to(&format!("{}/first", server.uri()))
                    .set_delay(Duration::from_millis(150)),
            )
            .mount(&server)
            .await;
        Mock::given(path("/fast"))
            .respond_with(redirect_to(&format!("{}/second", server.uri())))
            .mount(&server)
            .await;
        Mock::given(path("/first"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/second"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let resolver = make_resolver(Duration::from_secs(5), ResolveLimiter::default());
        let resolved = resolver
            .resolve_all(vec![
                format!("{}/slow", server.uri()),
                format!("{}/fast", server.uri()),
            ])
            .await
            .unwrap();

        assert_eq!(
            resolved,
            vec![
                format!("{}/first", server.uri()),
                format!("{}/second", server.uri()),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_still_resolves() {
        let server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = make_resolver(Duration::from_secs(5), ResolveLimiter::default());
        let resolved = resolver
            .resolve_all(vec![format!("{}/gone?ref=share", server.uri())])
            .await
            .unwrap();

        assert_eq!(resolved, vec![format!("{}/gone", server.uri())]);
    }

    #[tokio::test]
    async fn test_timeout_fails_whole_batch() {
        let server = MockServer::start().await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/hang"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let resolver = make_resolver(Duration::from_millis(100), ResolveLimiter::default());
        let result = resolver
            .resolve_all(vec![
                format!("{}/ok", server.uri()),
                format!("{}/hang", server.uri()),
            ])
            .await;

        let error = result.unwrap_err();
        assert!(error.is_timeout());
        assert_eq!(error.url(), Some(format!("{}/hang", server.uri()).as_str()));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let resolver = make_resolver(Duration::from_secs(1), ResolveLimiter::default());

        let result = resolver.resolve_all(vec!["not a url".to_string()]).await;

        assert!(matches!(result, Err(ResolveError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let resolver = make_resolver(Duration::from_secs(1), ResolveLimiter::default());

        assert!(resolver.resolve_all(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_limiter_is_shared_between_resolvers() {
        let server = MockServer::start().await;
        Mock::given(path("/wait"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
            .mount(&server)
            .await;

        let limiter = ResolveLimiter::new(1);
        let first = make_resolver(Duration::from_secs(5), limiter.clone());
        let second = make_resolver(Duration::from_secs(5), limiter.clone());
        let url = format!("{}/wait", server.uri());

        let started = Instant::now();
        let (a, b) = tokio::join!(
            first.resolve_all(vec![url.clone()]),
            second.resolve_all(vec![url.clone()]),
        );

        assert!(a.is_ok() && b.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(limiter.available(), 1);
    }
}
