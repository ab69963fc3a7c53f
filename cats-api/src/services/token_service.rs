use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use cats_shared::errors::AppError;
use cats_shared::types::auth::Claims;

/// Signs an HS256 access token for the user, valid for `ttl_secs`.
pub fn create_access_token(
    user_id: Uuid,
    name: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, name, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}
