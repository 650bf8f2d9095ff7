//! Structural matching of requests against mock definitions.
//!
//! A definition matches when its `method` equals the request method and its
//! `url` equals the request's `scheme://host/path`. Query and fragment are not
//! part of the comparison and there are no wildcards.

use crate::definition::MockDefinition;
use hyper::{Method, Uri};

/// The `scheme://host[:port]/path` a request is addressed to.
///
/// Proxied requests carry an absolute URI. Origin-form requests have neither
/// scheme nor host, so their target is `://` followed by the path and never
/// matches a definition.
pub fn request_target(uri: &Uri) -> String {
    format!("{}://{}{}", uri.scheme_str().unwrap_or(""), target_host(uri), uri.path())
}

/// `host[:port]` of an absolute URI, without user info. Empty for origin-form URIs.
pub fn target_host(uri: &Uri) -> String {
    match uri.authority() {
        Some(authority) => match authority.port() {
            Some(port) => format!("{}:{}", authority.host(), port),
            None => authority.host().to_string(),
        },
        None => String::new(),
    }
}

/// Whether `definition` is declared for this method and target.
pub fn matches(definition: &MockDefinition, method: &Method, target: &str) -> bool {
    definition.method == method.as_str() && definition.url == target
}

/// Return the first definition that structurally matches the request.
///
/// Scanning stops at the first match; later definitions are never looked at,
/// even for the same method and URL.
pub fn find_match<I>(definitions: I, method: &Method, uri: &Uri) -> Option<MockDefinition>
where
    I: IntoIterator<Item = MockDefinition>,
{
    let target = request_target(uri);
    definitions
        .into_iter()
        .find(|definition| matches(definition, method, &target))
}
