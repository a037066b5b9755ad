use futures_util::future::BoxFuture;

use super::Transform;
use super::rewrite::{has_spoiler, spoiler_wrap};
use crate::domain::errors::TransformError;

/// Runs an inner transform, then applies literal string replacements to its output.
///
/// Lines of a spoilered input come back spoilered, whether or not the inner
/// transform wrapped them.
#[derive(Debug, Clone)]
pub struct Deferred {
    inner: Box<Transform>,
    replacements: Vec<(String, String)>,
}

impl Deferred {
    /// Wraps `inner` with no replacements.
    #[must_use]
    pub fn new(inner: impl Into<Transform>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            replacements: Vec::new(),
        }
    }

    /// Appends a replacement pair; pairs run in the order added.
    #[must_use]
    pub fn replacing(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replacements.push((from.into(), to.into()));
        self
    }

    /// Returns the wrapped transform.
    #[must_use]
    pub fn inner(&self) -> &Transform {
        &self.inner
    }

    /// # Errors
    /// Returns the inner transform's error unchanged.
    pub fn apply<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, TransformError>> {
        Box::pin(async move {
            let output = self.substitute(self.inner.apply(text).await?);
            if has_spoiler(text) {
                Ok(Self::wrap_lines(&output))
            } else {
                Ok(output)
            }
        })
    }

    fn wrap_lines(output: &str) -> String {
        output
            .lines()
            .map(|line| {
                if has_spoiler(line) {
                    line.to_string()
                } else {
                    spoiler_wrap(line.to_string(), true)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn substitute(&self, text: String) -> String {
        self.replacements
            .iter()
            .fold(text, |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use regex::Regex;

    use super::*;
    use crate::application::transforms::{Follow, Substitute};
    use crate::domain::errors::ResolveError;
    use crate::domain::ports::mocks::StaticResolver;

    #[tokio::test]
    async fn test_replacements_apply_in_order() {
        let inner = Substitute::new("word", Regex::new(r"alpha").unwrap(), "alpha");
        let deferred = Deferred::new(inner)
            .replacing("alpha", "beta")
            .replacing("beta", "gamma");

        assert_eq!(deferred.apply("alpha").await.unwrap(), "gamma");
    }

    #[tokio::test]
    async fn test_spoiler_restored_on_unwrapped_output() {
        let resolver = Arc::new(
            StaticResolver::new()
                .with_redirect("https://s.example/a", "https://long.example/a")
                .with_redirect("https://s.example/b", "https://long.example/b"),
        );
        let follow = Follow::new("short", Regex::new(r"https://s\.example/\w+").unwrap(), resolver);
        let deferred = Deferred::new(follow).replacing("long.example", "mirror.example");

        assert_eq!(
            deferred
                .apply("||https://s.example/a|| ||https://s.example/b||")
                .await
                .unwrap(),
            "||https://mirror.example/a||\n||https://mirror.example/b||"
        );
    }

    #[tokio::test]
    async fn test_already_spoilered_output_is_not_wrapped_twice() {
        let inner = Substitute::new("word", Regex::new(r"alpha").unwrap(), "alpha");
        let deferred = Deferred::new(inner).replacing("alpha", "beta");

        assert_eq!(deferred.apply("||alpha||").await.unwrap(), "||beta||");
    }

    #[test]
    fn test_delegates_name_and_matches() {
        let inner = Substitute::new("word", Regex::new(r"alpha").unwrap(), "alpha");
        let transform = Transform::from(Deferred::new(inner).replacing("a", "b"));

        assert_eq!(transform.name(), "word");
        assert!(transform.matches("alpha"));
        assert!(!transform.matches("omega"));
    }

    #[tokio::test]
    async fn test_inner_error_propagates_unchanged() {
        let resolver = Arc::new(
            StaticResolver::new()
                .with_failure("https://s.example/a", ResolveError::timeout("https://s.example/a")),
        );
        let follow = Follow::new("short", Regex::new(r"https://s\.example/\w+").unwrap(), resolver);
        let deferred = Deferred::new(follow).replacing("example", "mirror");

        assert_eq!(
            deferred.apply("https://s.example/a").await,
            Err(TransformError::Resolution(ResolveError::timeout(
                "https://s.example/a"
            )))
        );
        assert_eq!(
            deferred.apply("no links").await,
            Err(TransformError::NoMatch)
        );
    }
}
