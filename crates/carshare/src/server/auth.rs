use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{ApiError, AppState};
use crate::error::Error;
use crate::identity::{self, Actor};

/// The actor named by the request's HTTP Basic credentials.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let (username, password) =
            basic_credentials(&parts.headers).ok_or(Error::Unauthenticated)?;
        let actor = state
            .blocking(move |storage, _| identity::authenticate(storage, &username, &password))
            .await?;
        Ok(Self(actor))
    }
}

/// Decode `Authorization: Basic <base64(user:password)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials_decodes() {
        let encoded = STANDARD.encode("rick:pickle:rick");
        let (user, password) = basic_credentials(&headers(&format!("Basic {encoded}"))).unwrap();
        assert_eq!(user, "rick");
        assert_eq!(password, "pickle:rick");
    }

    #[test]
    fn test_basic_credentials_rejects_other_schemes() {
        assert!(basic_credentials(&headers("Bearer abc")).is_none());
        assert!(basic_credentials(&headers("Basic !!!")).is_none());
        let no_colon = STANDARD.encode("rick");
        assert!(basic_credentials(&headers(&format!("Basic {no_colon}"))).is_none());
        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }
}
