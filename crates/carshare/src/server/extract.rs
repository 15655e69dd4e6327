use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::error::{Error, Result};

/// A JSON request body whose rejections render as [`ApiError`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_error(&rejection).into()),
        }
    }
}

fn rejection_error(rejection: &JsonRejection) -> Error {
    Error::validation("body", format!("is not valid: {}", rejection.body_text()))
}

/// Decode a raw JSON body, for handlers that must check access first.
///
/// # Errors
///
/// Returns a validation error on `body` when the JSON is malformed or does
/// not fit `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|err| Error::validation("body", format!("is not valid: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RentalChanges;

    #[test]
    fn test_decode_partial_changes() {
        let changes: RentalChanges = decode(br#"{"terms": "no pets"}"#).unwrap();
        assert_eq!(changes.terms.as_deref(), Some("no pets"));
        assert!(changes.price.is_none());
    }

    #[test]
    fn test_decode_bad_field_is_validation_error() {
        let err = decode::<RentalChanges>(br#"{"price": -1}"#).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("body is not valid: "));
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn test_decode_syntax_error_is_validation_error() {
        assert!(decode::<RentalChanges>(b"{price").unwrap_err().is_validation());
        assert!(decode::<RentalChanges>(b"").unwrap_err().is_validation());
    }
}
