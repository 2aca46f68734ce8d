//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations for the gateway:
//! - Cryptographic utilities (HMAC-SHA256, random tokens, Base64url)
//! - Cookie parsing, signing and `Set-Cookie` construction
//! - Client address resolution behind reverse proxies
//! - Rate limiting infrastructure

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod rate_limit;
