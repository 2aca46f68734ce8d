//! Cookie Management Infrastructure
//!
//! Parsing of the `Cookie` request header, HMAC signing of cookie values and
//! `Set-Cookie` construction.
//!
//! Signed values use the `s:<value>.<signature>` layout, where the signature
//! is the unpadded base64url HMAC-SHA256 of `<value>` under the server secret.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};

const SIGNED_PREFIX: &str = "s:";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes used when issuing a `Set-Cookie` header
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "sid".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        cookie.push_str(&format!("; Path={}", self.path));
        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));

        cookie
    }

    /// Build Set-Cookie header that expires the cookie immediately
    pub fn build_delete_cookie(&self) -> String {
        let mut cookie = format!("{}=; Path={}; Max-Age=0; HttpOnly", self.name, self.path);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie
    }
}

/// Create a Set-Cookie header value
pub fn set_cookie_header(cookie: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(cookie).ok()
}

/// Parse every `name=value` pair of the `Cookie` header(s)
///
/// Malformed pairs are skipped. When a name repeats, the first value wins.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() || pairs.iter().any(|(k, _)| k == key) {
                continue;
            }
            let value = value.trim().trim_matches('"');
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    pairs
}

/// Extract a single cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    parse_cookies(headers)
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

/// HMAC signer for cookie values
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
}

impl CookieSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a value: `s:<value>.<signature>`
    pub fn sign(&self, value: &str) -> String {
        let signature = hmac_sha256(&self.secret, value.as_bytes());
        format!("{SIGNED_PREFIX}{value}.{}", to_base64url(&signature))
    }

    /// Verify a signed value and return the inner value
    ///
    /// Returns `None` for unsigned values, malformed layouts and bad signatures.
    pub fn unsign(&self, raw: &str) -> Option<String> {
        let signed = raw.strip_prefix(SIGNED_PREFIX)?;
        let (value, signature) = signed.rsplit_once('.')?;
        let signature = from_base64url(signature).ok()?;

        verify_hmac_sha256(&self.secret, value.as_bytes(), &signature).then(|| value.to_string())
    }

    /// Whether the raw value uses the signed layout at all
    pub fn is_signed_layout(raw: &str) -> bool {
        raw.starts_with(SIGNED_PREFIX)
    }
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}
