use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::rewrite::{Rewrite, has_spoiler, spoiler_wrap};
use crate::domain::errors::TransformError;
use crate::domain::ports::LinkResolver;

/// Follows recognized links through their redirects, then optionally rewrites
/// the destination.
#[derive(Clone)]
pub struct Follow {
    name: String,
    follow: Regex,
    destination: Option<Rewrite>,
    reject: Option<Regex>,
    resolver: Arc<dyn LinkResolver>,
}

impl Follow {
    /// Creates a transform that follows links matched by `follow` and keeps
    /// the resolved URLs unchanged.
    #[must_use]
    pub fn new(name: impl Into<String>, follow: Regex, resolver: Arc<dyn LinkResolver>) -> Self {
        Self {
            name: name.into(),
            follow,
            destination: None,
            reject: None,
            resolver,
        }
    }

    /// Rewrites each resolved URL through `template`. URLs `pattern` does not
    /// match are kept as resolved.
    #[must_use]
    pub fn with_destination(mut self, pattern: Regex, template: impl Into<String>) -> Self {
        self.destination = Some(Rewrite::new(pattern, template));
        self
    }

    /// Drops resolved URLs that `pattern` matches.
    #[must_use]
    pub fn rejecting(mut self, pattern: Regex) -> Self {
        self.reject = Some(pattern);
        self
    }

    /// Returns the transform name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `text` holds a link to follow.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.follow.is_match(text)
    }

    /// Resolves every recognized link and returns the results, one per line,
    /// in source order.
    ///
    /// # Errors
    /// Returns `TransformError::NoMatch` when nothing is recognized or every
    /// destination is rejected, and `TransformError::Resolution` when any
    /// link in the batch cannot be followed.
    pub async fn apply(&self, text: &str) -> Result<String, TransformError> {
        let candidates: Vec<String> = self
            .follow
            .find_iter(text)
            .map(|found| found.as_str().to_string())
            .collect();

        if candidates.is_empty() {
            return Err(TransformError::NoMatch);
        }

        debug!(transform = %self.name, links = candidates.len(), "Following links");

        let resolved = self.resolver.resolve_all(candidates).await?;
        let spoiler = has_spoiler(text);

        let links: Vec<String> = resolved
            .into_iter()
            .filter(|url| !self.is_rejected(url))
            .map(|url| self.rewrite_destination(url, spoiler))
            .collect();

        if links.is_empty() {
            return Err(TransformError::NoMatch);
        }

        Ok(links.join("\n"))
    }

    fn is_rejected(&self, url: &str) -> bool {
        let rejected = self
            .reject
            .as_ref()
            .is_some_and(|reject| reject.is_match(url));

        if rejected {
            debug!(transform = %self.name, url, "Dropping rejected destination");
        }
        rejected
    }

    fn rewrite_destination(&self, url: String, spoiler: bool) -> String {
        match &self.destination {
            Some(destination) => match destination.rewrite_first(&url) {
                Some(rewritten) => spoiler_wrap(rewritten, spoiler),
                None => url,
            },
            None => url,
        }
    }
}

impl fmt::Debug for Follow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Follow")
            .field("name", &self.name)
            .field("follow", &self.follow.as_str())
            .field("destination", &self.destination)
            .field("reject", &self.reject.as_ref().map(Regex::as_str))
            .finish_non_exhaustive()
    }
}
