use regex::{Captures, Regex};

/// Discord spoiler delimiter.
pub const SPOILER: &str = "||";

/// A pattern plus a capture template (`$1`, `${name}`).
#[derive(Debug, Clone)]
pub struct Rewrite {
    pattern: Regex,
    template: String,
}

impl Rewrite {
    /// Creates a rewrite of `pattern` matches through `template`.
    #[must_use]
    pub fn new(pattern: Regex, template: impl Into<String>) -> Self {
        Self {
            pattern,
            template: template.into(),
        }
    }

    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Renders the template against one match.
    #[must_use]
    pub fn expand(&self, captures: &Captures<'_>) -> String {
        let mut rendered = String::new();
        captures.expand(&self.template, &mut rendered);
        rendered
    }

    /// Renders the template against the first match in `link`.
    #[must_use]
    pub fn rewrite_first(&self, link: &str) -> Option<String> {
        self.pattern
            .captures(link)
            .map(|captures| self.expand(&captures))
    }
}

#[must_use]
pub fn has_spoiler(text: &str) -> bool {
    text.contains(SPOILER)
}

#[must_use]
pub fn spoiler_wrap(link: String, spoiler: bool) -> String {
    if spoiler {
        format!("{SPOILER}{link}{SPOILER}")
    } else {
        link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_numbered_and_named_groups() {
        let rewrite = Rewrite::new(
            Regex::new(r"https://(?P<host>\w+)\.example/(\d+)").unwrap(),
            "https://mirror.example/${host}/$2",
        );

        assert_eq!(
            rewrite.rewrite_first("see https://foo.example/42 now"),
            Some("https://mirror.example/foo/42".to_string())
        );
        assert_eq!(rewrite.rewrite_first("nothing here"), None);
    }

    #[test]
    fn test_spoiler_wrap() {
        assert!(has_spoiler("||secret||"));
        assert!(!has_spoiler("a | b"));
        assert_eq!(spoiler_wrap("x".to_string(), true), "||x||");
        assert_eq!(spoiler_wrap("x".to_string(), false), "x");
    }
}
