//! Client identification utilities
//!
//! Resolves the client address used as the rate-limit key.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract client IP address from reverse proxy headers
///
/// Checks `X-Forwarded-For` (first hop) and then `X-Real-IP`. Both are
/// client-controlled unless a trusted proxy overwrites them.
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip)
}

/// Extract client IP address
///
/// Forwarded headers are read only when `trust_proxy` is set; otherwise the
/// direct connection IP is authoritative.
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trust_proxy: bool,
) -> Option<IpAddr> {
    if trust_proxy {
        forwarded_client_ip(headers).or(direct_ip)
    } else {
        direct_ip
    }
}

/// Stable key for per-client accounting
///
/// Clients whose address cannot be determined share the `unknown` bucket.
pub fn client_key(headers: &HeaderMap, direct_ip: Option<IpAddr>, trust_proxy: bool) -> String {
    extract_client_ip(headers, direct_ip, trust_proxy)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn proxied_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        headers
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let ip = extract_client_ip(&proxied_headers(), None, true);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));

        let ip = extract_client_ip(&headers, None, true);
        assert_eq!(ip, Some("10.9.9.9".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct), true), Some(direct));
    }

    #[test]
    fn test_forwarded_headers_ignored_without_trusted_proxy() {
        let direct: IpAddr = "203.0.113.7".parse().unwrap();

        assert_eq!(
            extract_client_ip(&proxied_headers(), Some(direct), false),
            Some(direct)
        );
        assert_eq!(client_key(&proxied_headers(), None, false), "unknown");
    }

    #[test]
    fn test_client_key_unknown() {
        assert_eq!(client_key(&HeaderMap::new(), None, true), "unknown");
    }
}
