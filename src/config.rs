// ABOUTME: Environment-driven configuration with development defaults
// ABOUTME: Holds the assign/reassign authorization policy as an explicit setting

use std::env;

use crate::auth::Claims;
use crate::entities::user::Role;
use crate::error::{AppError, Result};

// Who may assign and reassign items. The policy is configuration, never
// inferred per route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignPolicy {
    Storekeeper,
    AnyAuthenticated,
}

impl AssignPolicy {
    pub fn authorize(&self, claims: &Claims) -> Result<()> {
        match self {
            AssignPolicy::AnyAuthenticated => Ok(()),
            AssignPolicy::Storekeeper if claims.role == Role::Storekeeper => Ok(()),
            AssignPolicy::Storekeeper => Err(AppError::Forbidden(
                "Storekeeper role required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub assign_policy: AssignPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:storekeep.db?mode=rwc".to_string());
        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| "storekeep-dev-secret".to_string());
        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24 * 60 * 60);
        let assign_policy = match env::var("ASSIGN_POLICY").as_deref() {
            Ok("any") => AssignPolicy::AnyAuthenticated,
            _ => AssignPolicy::Storekeeper,
        };

        Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_ttl_secs,
            assign_policy,
        }
    }
}
