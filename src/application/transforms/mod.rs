//! Link transforms: named rules that recognize one provider's links and
//! rewrite them into embed-friendly equivalents.
//!
//! Three shapes exist:
//! - [`Substitute`] rewrites matches through a capture template, offline.
//! - [`Follow`] resolves matches through their HTTP redirects first.
//! - [`Deferred`] post-processes another transform's output with literal
//!   replacements.

/// Built-in provider transforms.
pub mod catalog;
mod deferred;
mod follow;
mod rewrite;
mod substitute;

pub use catalog::{ResolverSet, default_transforms};
pub use deferred::Deferred;
pub use follow::Follow;
pub use substitute::Substitute;

use crate::domain::errors::TransformError;

/// A named link rewriting rule.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Offline capture-template rewrite.
    Substitute(Substitute),
    /// Redirect-following rewrite.
    Follow(Follow),
    /// Inner transform plus literal replacements.
    Deferred(Deferred),
}

impl Transform {
    /// Returns the stable name used for lookup and diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Substitute(substitute) => substitute.name(),
            Self::Follow(follow) => follow.name(),
            Self::Deferred(deferred) => deferred.inner().name(),
        }
    }

    /// Returns whether `text` holds a link this transform recognizes.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Substitute(substitute) => substitute.matches(text),
            Self::Follow(follow) => follow.matches(text),
            Self::Deferred(deferred) => deferred.inner().matches(text),
        }
    }

    /// Produces the rewritten links found in `text`.
    ///
    /// # Errors
    /// Returns `TransformError::NoMatch` for text this transform does not
    /// recognize, or `TransformError::Resolution` if a redirect cannot be followed.
    pub async fn apply(&self, text: &str) -> Result<String, TransformError> {
        match self {
            Self::Substitute(substitute) => substitute.apply(text),
            Self::Follow(follow) => follow.apply(text).await,
            Self::Deferred(deferred) => deferred.apply(text).await,
        }
    }
}

impl From<Substitute> for Transform {
    fn from(substitute: Substitute) -> Self {
        Self::Substitute(substitute)
    }
}

impl From<Follow> for Transform {
    fn from(follow: Follow) -> Self {
        Self::Follow(follow)
    }
}

impl From<Deferred> for Transform {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}
