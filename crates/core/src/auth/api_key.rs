//! Shared-secret authentication for dashboard callers.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Validates requests against a configured API key.
///
/// The key may arrive as `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    expected_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: String) -> Self {
        Self {
            expected_key: api_key,
        }
    }

    fn presented_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some((scheme, key)) = request
            .header("authorization")
            .and_then(|value| value.split_once(' '))
        {
            if scheme.eq_ignore_ascii_case("bearer") {
                return Some(key.trim());
            }
        }
        request.header("x-api-key")
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let presented = self
            .presented_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(presented.as_bytes(), self.expected_key.as_bytes()) {
            Ok(Identity {
                subject: "dashboard".to_string(),
                method: "api_key",
            })
        } else {
            Err(AuthError::InvalidCredentials("API key mismatch".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
