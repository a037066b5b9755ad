use regex::{Captures, Regex};

use super::rewrite::{Rewrite, has_spoiler, spoiler_wrap};
use crate::domain::errors::TransformError;

/// Rewrites every recognized link through a capture template, without network access.
#[derive(Debug, Clone)]
pub struct Substitute {
    name: String,
    rewrite: Rewrite,
    exclude: Option<Regex>,
}

impl Substitute {
    /// Creates a transform that rewrites `pattern` matches through `template`.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: Regex, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rewrite: Rewrite::new(pattern, template),
            exclude: None,
        }
    }

    /// Ignores matches that `pattern` also matches.
    #[must_use]
    pub fn excluding(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    /// Returns the transform name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Captures<'a>> + 'a {
        self.rewrite
            .pattern()
            .captures_iter(text)
            .filter(move |captures| {
                self.exclude
                    .as_ref()
                    .is_none_or(|exclude| !exclude.is_match(&captures[0]))
            })
    }

    /// Returns whether `text` has a candidate that is not excluded.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.candidates(text).next().is_some()
    }

    /// Returns the rewritten links, one per line, in source order.
    ///
    /// # Errors
    /// Returns `TransformError::NoMatch` when no candidate link is present.
    pub fn apply(&self, text: &str) -> Result<String, TransformError> {
        let spoiler = has_spoiler(text);

        let links: Vec<String> = self
            .candidates(text)
            .map(|captures| spoiler_wrap(self.rewrite.expand(&captures), spoiler))
            .collect();

        if links.is_empty() {
            return Err(TransformError::NoMatch);
        }

        Ok(links.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_substitute() -> Substitute {
        Substitute::new(
            "files",
            Regex::new(r"https://files\.example/(\w+)\.(\w+)").unwrap(),
            "https://cdn.example/$1.$2",
        )
        .excluding(Regex::new(r"\.gif$").unwrap())
    }

    #[test]
    fn test_apply_rewrites_each_match_in_order() {
        let output = make_substitute()
            .apply("https://files.example/a.png and https://files.example/b.mp4")
            .unwrap();

        assert_eq!(output, "https://cdn.example/a.png\nhttps://cdn.example/b.mp4");
    }

    #[test]
    fn test_excluded_match_is_not_a_candidate() {
        let substitute = make_substitute();

        assert!(!substitute.matches("https://files.example/a.gif"));
        assert_eq!(
            substitute.apply("https://files.example/a.gif"),
            Err(TransformError::NoMatch)
        );
        assert_eq!(
            substitute
                .apply("https://files.example/a.gif https://files.example/b.png")
                .unwrap(),
            "https://cdn.example/b.png"
        );
    }

    #[test]
    fn test_spoilered_input_wraps_every_link() {
        let output = make_substitute()
            .apply("||https://files.example/a.png|| ||https://files.example/b.png||")
            .unwrap();

        assert_eq!(
            output,
            "||https://cdn.example/a.png||\n||https://cdn.example/b.png||"
        );
    }

    #[test]
    fn test_no_match_on_plain_text() {
        assert_eq!(
            make_substitute().apply("just words"),
            Err(TransformError::NoMatch)
        );
    }
}
