use axum::http::{header, HeaderMap};
use std::collections::HashMap;

use crate::models::OwnerId;

/// Maps bearer tokens to owner identities.
///
/// An unknown or absent token is not an error: the caller is treated as
/// anonymous, may still analyze text, and gets nothing persisted.
#[derive(Debug, Clone, Default)]
pub struct TokenResolver {
    tokens: HashMap<String, OwnerId>,
}

impl TokenResolver {
    pub fn new(tokens: &HashMap<String, String>) -> Self {
        let tokens = tokens
            .iter()
            .filter(|(token, owner)| !token.trim().is_empty() && !owner.trim().is_empty())
            .map(|(token, owner)| (token.trim().to_string(), OwnerId(owner.trim().to_string())))
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve the owner behind an `Authorization: Bearer <token>` header.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<OwnerId> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        self.tokens.get(token.trim()).cloned()
    }
}
