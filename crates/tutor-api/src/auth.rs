use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Extension, Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use tutor_types::api::{AuthResponse, Claims, LoginRequest, MeResponse, RegisterRequest, UserSummary};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    // Passwords are checked for presence untrimmed.
    let password = req.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password), Some(name)) = (present(req.email), password, present(req.name)) else {
        return Err(ApiError::BadRequest("Please provide all required fields".into()));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    let email = normalize_email(&email);

    let lookup = email.clone();
    if with_db(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    let created = {
        let (uid, email, name) = (user_id.to_string(), email.clone(), name.clone());
        with_db(&state, move |db| db.create_user(&uid, &email, &password_hash, &name, now)).await?
    };
    // Lost a race with a concurrent registration for the same email.
    if !created {
        return Err(ApiError::BadRequest("Email already registered".into()));
    }

    let token = create_token(&state.config.jwt_secret, state.config.jwt_ttl_days, user_id, &email)?;
    info!("Registered user {}", user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserSummary { id: user_id, email, name },
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(email), Some(password)) = (present(req.email), req.password.filter(|p| !p.is_empty())) else {
        return Err(ApiError::BadRequest("Please provide email and password".into()));
    };
    let email = normalize_email(&email);

    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials"))?;

    let user = user.into_model()?;
    let token = create_token(&state.config.jwt_secret, state.config.jwt_ttl_days, user.id, &user.email)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let uid = auth.id.to_string();
    let user = with_db(&state, move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?
        .into_model()?;

    Ok(Json(MeResponse { user }))
}

pub fn create_token(secret: &str, ttl_days: i64, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::verify_token;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let id = Uuid::new_v4();
        let token = create_token("secret-a", 7, id, "a@b.com").unwrap();
        let claims = verify_token("secret-a", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "a@b.com");

        assert!(verify_token("secret-b", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("secret-a", -2, Uuid::new_v4(), "a@b.com").unwrap();
        assert!(verify_token("secret-a", &token).is_err());
    }

    #[test]
    fn blank_fields_are_absent() {
        assert_eq!(present(Some("  A ".into())), Some("A".into()));
        assert_eq!(present(Some("   ".into())), None);
        assert_eq!(present(None), None);
        assert_eq!(normalize_email(" Kid@Example.COM "), "kid@example.com");
    }
}
