// ABOUTME: Password registration and login issuing signed bearer tokens
// ABOUTME: Argon2 for password hashes, JWT (HS256) for identity tokens

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::user::Role;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::types::{AuthResponse, LoginRequest, RefreshResponse, RegisterRequest};

// Token payload: identity plus role, enough to authorize without a
// database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthState {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

impl AuthState {
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            token_ttl_secs,
        }
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_secs
    }

    pub fn issue_token(&self, id: Uuid, role: Role, email: &str, username: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id,
            role,
            email: email.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AppError::Internal(format!("Failed to sign token: {}", err)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("Password hashing failed: {}", err)))
}

pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| AppError::Internal(format!("Invalid stored password hash: {}", err)))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}

fn valid_email(email: &str) -> bool {
    // Same shape the registration form enforced: something@something.something,
    // no whitespace.
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn parse_role(role: &str) -> Result<Role> {
    match role {
        "employee" => Ok(Role::Employee),
        "storekeeper" => Ok(Role::Storekeeper),
        other => Err(AppError::Validation(format!("Unknown role: {}", other))),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (username, email, password) = match (&req.username, &req.email, &req.password) {
        (Some(u), Some(e), Some(p)) => (u.as_str(), e.as_str(), p.as_str()),
        _ => {
            return Err(AppError::Validation(
                "Please provide username, email, and password".to_string(),
            ));
        }
    };

    if username.len() < 4 || username.len() > 20 {
        return Err(AppError::Validation(
            "Username must be 4 to 20 characters".to_string(),
        ));
    }
    if !valid_email(email) {
        return Err(AppError::Validation("Email is invalid".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    let role = req
        .role
        .as_deref()
        .ok_or_else(|| AppError::Validation("Please provide a role".to_string()))
        .and_then(parse_role)?;

    if state.storage.user_taken(username, email).await? {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = state
        .storage
        .create_user(username, email, &password_hash, role)
        .await?;

    let token = state
        .auth
        .issue_token(user.id, user.role, &user.email, &user.username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user,
            expires_in: state.auth.token_ttl_secs(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (email, password) = match (&req.email, &req.password) {
        (Some(e), Some(p)) => (e.as_str(), p.as_str()),
        _ => {
            return Err(AppError::Validation(
                "Please provide email and password".to_string(),
            ));
        }
    };

    // One message for both unknown user and wrong password.
    let user = state
        .storage
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid credentials".to_string()))?;

    if !verify_password(&user.password_hash, password)? {
        return Err(AppError::Validation("Invalid credentials".to_string()));
    }

    let token = state
        .auth
        .issue_token(user.id, user.role, &user.email, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user,
        expires_in: state.auth.token_ttl_secs(),
    }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<RefreshResponse>> {
    let token = state
        .auth
        .issue_token(claims.id, claims.role, &claims.email, &claims.username)?;

    Ok(Json(RefreshResponse {
        token,
        expires_in: state.auth.token_ttl_secs(),
    }))
}
