use {
    agenda_scheduling::Identity,
    axum::{
        extract::FromRequestParts,
        http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    },
};

use crate::{error::ApiError, server::AppState};

/// Axum extractor for the optional caller identity.
///
/// A missing header, a malformed token, or a token naming an unknown user
/// all yield `Caller(None)`; the service decides whether that is enough.
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.service.identify(bearer_token(&parts.headers)).await?;
        Ok(Caller(identity))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use {super::*, axum::http::HeaderValue};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(
            bearer_token(&headers("Bearer token_u1_1.0")),
            Some("token_u1_1.0")
        );
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
