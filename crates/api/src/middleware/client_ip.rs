//! Client identity used to key the submission rate limit.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN: &str = "unknown";

/// Identity of the calling client.
///
/// The first `X-Forwarded-For` entry wins; otherwise the peer IP without its
/// port. Requests with neither share the `unknown` identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    /// Returns the identity key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First non-empty entry of the `X-Forwarded-For` header.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = forwarded_for(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        Ok(Self(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use rstest::rstest;

    async fn identity_of(forwarded: Option<&str>, peer: Option<SocketAddr>) -> String {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header(FORWARDED_FOR, value);
        }
        let mut request = builder.body(()).unwrap();
        if let Some(addr) = peer {
            request.extensions_mut().insert(ConnectInfo(addr));
        }

        let (mut parts, ()) = request.into_parts();
        ClientIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap()
            .0
    }

    #[rstest]
    #[case(Some("203.0.113.7"), "203.0.113.7")]
    #[case(Some("203.0.113.7, 10.0.0.1, 10.0.0.2"), "203.0.113.7")]
    #[case(Some("  198.51.100.4 ,10.0.0.1"), "198.51.100.4")]
    #[case(Some(""), "192.0.2.10")]
    #[case(None, "192.0.2.10")]
    #[tokio::test]
    async fn test_identity_with_peer(#[case] forwarded: Option<&str>, #[case] expected: &str) {
        let peer: SocketAddr = "192.0.2.10:54321".parse().unwrap();
        assert_eq!(identity_of(forwarded, Some(peer)).await, expected);
    }

    #[tokio::test]
    async fn test_ipv6_peer_port_is_stripped() {
        let peer: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        assert_eq!(identity_of(None, Some(peer)).await, "2001:db8::1");
    }

    #[tokio::test]
    async fn test_unknown_without_peer() {
        assert_eq!(identity_of(None, None).await, UNKNOWN);
    }
}
