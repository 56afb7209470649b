//! Mapping of `(method, url)` pairs to vend operations

use thiserror::Error;

use crate::{RequestKind, RequestMethod};

/// Path prefix all counter URLs share
pub const VEND_PREFIX: &str = "/vend/";

/// Reason a request could not be routed to an operation
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum RouteError {
    /// The path does not name a counter
    #[error("no counter at {0}, expected /vend/<key>")]
    NotFound(String),
    /// The path names a counter, but the method has no meaning for it
    #[error("method {0} is not supported, use GET, HEAD or POST")]
    MethodNotAllowed(RequestMethod),
}

impl RouteError {
    /// HTTP status to answer with
    pub fn status(&self) -> u16 {
        match self {
            RouteError::NotFound(_) => 404,
            RouteError::MethodNotAllowed(_) => 405,
        }
    }
}

/// Route a request to its operation and counter key
///
/// The key is everything after [`VEND_PREFIX`] up to an optional query string
/// and must not be empty.
pub fn route(method: &RequestMethod, url: &str) -> Result<(RequestKind, String), RouteError> {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    let key = match path.strip_prefix(VEND_PREFIX) {
        Some(key) if !key.is_empty() => key,
        _ => return Err(RouteError::NotFound(url.to_owned())),
    };

    let kind = match method {
        RequestMethod::Get => RequestKind::Vend,
        RequestMethod::Head => RequestKind::Peek,
        RequestMethod::Post => RequestKind::Set,
        other => return Err(RouteError::MethodNotAllowed(other.clone())),
    };

    Ok((kind, key.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_verbs_to_operations() {
        assert_eq!(
            route(&RequestMethod::Get, "/vend/foo"),
            Ok((RequestKind::Vend, "foo".into()))
        );
        assert_eq!(
            route(&RequestMethod::Head, "/vend/foo"),
            Ok((RequestKind::Peek, "foo".into()))
        );
        assert_eq!(
            route(&RequestMethod::Post, "/vend/bar"),
            Ok((RequestKind::Set, "bar".into()))
        );
    }

    #[test]
    fn query_string_is_not_part_of_key() {
        assert_eq!(
            route(&RequestMethod::Get, "/vend/job-a?cache=no"),
            Ok((RequestKind::Vend, "job-a".into()))
        );
    }

    #[test]
    fn key_keeps_inner_slashes() {
        assert_eq!(
            route(&RequestMethod::Get, "/vend/org/repo"),
            Ok((RequestKind::Vend, "org/repo".into()))
        );
    }

    #[test]
    fn unknown_paths_are_not_found() {
        for url in ["/", "/vend", "/vend/", "/vend/?x=1", "/vendor/foo", "/api/vend/foo"] {
            let err = route(&RequestMethod::Get, url).unwrap_err();
            assert_eq!(err, RouteError::NotFound(url.into()));
            assert_eq!(err.status(), 404);
        }
    }

    #[test]
    fn other_methods_are_not_allowed() {
        let err = route(&RequestMethod::Other("PUT".into()), "/vend/foo").unwrap_err();
        assert_eq!(err, RouteError::MethodNotAllowed(RequestMethod::Other("PUT".into())));
        assert_eq!(err.status(), 405);
    }

    #[test]
    fn path_is_checked_before_method() {
        let err = route(&RequestMethod::Other("PUT".into()), "/nope").unwrap_err();
        assert_eq!(err.status(), 404);
    }
}
