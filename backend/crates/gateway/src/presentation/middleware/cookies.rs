//! Cookie Parsing Stage

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{CookieSigner, parse_cookies};

use crate::presentation::context::RequestCookies;

/// Split the request's cookies into plain and verified signed values
///
/// A value in the signed layout whose signature does not verify is dropped.
pub fn read_cookies(headers: &HeaderMap, signer: &CookieSigner) -> RequestCookies {
    let mut plain = HashMap::new();
    let mut signed = HashMap::new();

    for (name, value) in parse_cookies(headers) {
        if !CookieSigner::is_signed_layout(&value) {
            plain.insert(name, value);
            continue;
        }
        match signer.unsign(&value) {
            Some(inner) => {
                signed.insert(name, inner);
            }
            None => tracing::debug!(cookie = %name, "Ignoring cookie with invalid signature"),
        }
    }

    RequestCookies::new(plain, signed)
}

pub async fn parse_request_cookies(
    State(signer): State<Arc<CookieSigner>>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookies = read_cookies(req.headers(), &signer);
    req.extensions_mut().insert(cookies);
    next.run(req).await
}
