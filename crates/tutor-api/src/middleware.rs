use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;
use uuid::Uuid;

use tutor_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, with_db};

/// Identity of the caller, attached to the request by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Extract and validate the bearer token, then resolve it to a stored user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized("No token provided"))?;

    let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
        debug!("Token rejected: {}", e);
        ApiError::Unauthorized("Invalid token")
    })?;

    let uid = claims.sub.to_string();
    let user = with_db(&state, move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::Unauthorized("User not found"))?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: user.email,
    });
    Ok(next.run(req).await)
}
