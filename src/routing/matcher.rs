//! Route matching logic.
//!
//! # Responsibilities
//! - Match request paths exactly or by prefix
//! - Resolve a path to the first route in precedence order
//!
//! # Design Decisions
//! - Path matching is case-sensitive and ignores the query string
//! - No regex to guarantee O(n) matching
//! - Order matters: `/api/search` is a prefix of `/api/search_v2`, so the
//!   longer route is listed first

/// How a route compares against the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatcher {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(expected) => path == *expected,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix),
        }
    }
}

/// Handlers the router can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Metrics,
    ClientInfo,
    SearchV2,
    Search,
}

/// Routes in precedence order; the first match wins.
pub const ROUTES: &[(PathMatcher, Route)] = &[
    (PathMatcher::Exact("/health"), Route::Health),
    (PathMatcher::Prefix("/metrics"), Route::Metrics),
    (PathMatcher::Prefix("/api/client_info"), Route::ClientInfo),
    (PathMatcher::Prefix("/api/search_v2"), Route::SearchV2),
    (PathMatcher::Prefix("/api/search"), Route::Search),
];

/// First route matching `path`, or `None` for static content.
pub fn resolve(path: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(matcher, _)| matcher.matches(path))
        .map(|&(_, route)| route)
}
