use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::{AppError, ErrorCode};

/// JSON body extractor that runs `validator` rules before the handler sees
/// the payload. Malformed JSON and rule violations both become a
/// `ValidationError` in the standard error envelope; rule violations also
/// carry the per-field errors as `details`.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::new(ErrorCode::ValidationError, rejection.body_text()))?;

        value.validate().map_err(|e| match serde_json::to_value(&e) {
            Ok(fields) => AppError::with_details(ErrorCode::ValidationError, e.to_string(), fields),
            Err(_) => AppError::new(ErrorCode::ValidationError, e.to_string()),
        })?;

        Ok(Self(value))
    }
}
