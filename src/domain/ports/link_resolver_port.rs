//! Redirect resolution port definition.

use async_trait::async_trait;

use crate::domain::errors::ResolveError;

/// Port for following URLs to their final destination.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Resolves every URL in the batch, returning final URLs in input order
    /// with the query string removed.
    ///
    /// # Errors
    /// Returns the first failure; the rest of the batch is abandoned.
    async fn resolve_all(&self, urls: Vec<String>) -> Result<Vec<String>, ResolveError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Resolver backed by a fixed redirect table.
    #[derive(Default)]
    pub struct StaticResolver {
        redirects: HashMap<String, Result<String, ResolveError>>,
        calls: RwLock<Vec<Vec<String>>>,
    }

    impl StaticResolver {
        /// Creates resolver with no known redirects; unknown URLs resolve to themselves.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a redirect target.
        #[must_use]
        pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), Ok(to.to_string()));
            self
        }

        /// Registers a failing URL.
        #[must_use]
        pub fn with_failure(mut self, url: &str, error: ResolveError) -> Self {
            self.redirects.insert(url.to_string(), Err(error));
            self
        }

        /// Returns every batch this resolver was asked for.
        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl LinkResolver for StaticResolver {
        async fn resolve_all(&self, urls: Vec<String>) -> Result<Vec<String>, ResolveError> {
            self.calls.write().unwrap().push(urls.clone());

            urls.into_iter()
                .map(|url| match self.redirects.get(&url) {
                    Some(result) => result.clone(),
                    None => Ok(url),
                })
                .collect()
        }
    }
}
