//! HTTP redirect resolution.

mod http_resolver;

pub use http_resolver::{
    DEFAULT_MAX_CONCURRENT, HttpRedirectResolver, ResolveLimiter, ResolverOptions,
};
