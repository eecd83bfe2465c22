//! Authentication and authorization.
//!
//! JWT bearer tokens (HS256) plus ranked role checks. The auth middleware
//! validates the token and stashes an [`AuthUser`] in request extensions;
//! role gates are applied per-router via [`AuthRouterExt::with_role`].

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::errors::ServiceError;

const TOKEN_ISSUER: &str = "cartfleet-api";
const TOKEN_AUDIENCE: &str = "cartfleet";

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn has_role(&self, required: Role) -> bool {
        self.role.allows(required)
    }

    /// Handler-level role gate for routes where methods on one path need
    /// different ranks.
    pub fn require(&self, required: Role) -> Result<(), ServiceError> {
        if self.has_role(required) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "Requires '{}' role or higher",
                required.as_str()
            )))
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }
}

/// Issues and validates tokens, and owns user lookup for login.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verify credentials and issue a token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(TokenResponse, user::Model), ServiceError> {
        let account = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid username or password".into()))?;

        if !account.active {
            return Err(ServiceError::Unauthorized("Account is disabled".into()));
        }

        let valid = bcrypt::verify(password, &account.password_hash)
            .map_err(|e| ServiceError::InternalError(format!("Password verification: {}", e)))?;
        if !valid {
            warn!(username = %username, "failed login attempt");
            return Err(ServiceError::Unauthorized("Invalid username or password".into()));
        }

        let token = self.generate_token(&account)?;
        Ok((token, account))
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, account: &user::Model) -> Result<TokenResponse, ServiceError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".into()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token creation: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT and map its claims onto an [`AuthUser`].
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("token validation failed: {}", e);
            ServiceError::Unauthorized("Invalid or expired token".into())
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".into()))?;
        let role = Role::parse(&data.claims.role)
            .ok_or_else(|| ServiceError::Unauthorized("Invalid token role".into()))?;

        Ok(AuthUser {
            user_id,
            username: data.claims.username,
            role,
        })
    }

    /// Create a user account with a bcrypt-hashed password.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<user::Model, ServiceError> {
        let existing = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| ServiceError::InternalError(format!("Password hashing: {}", e)))?;

        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(account.insert(&*self.db).await?)
    }
}

/// Authentication middleware: validates the bearer token and injects the
/// authenticated user into request extensions. The [`AuthService`] itself
/// is injected at the top of the router stack.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return ServiceError::InternalError("Authentication service not available".into())
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => {
            return ServiceError::Unauthorized("Missing bearer token".into()).into_response();
        }
    };

    match auth_service.validate_token(token) {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Role middleware: rejects the request unless the authenticated user's
/// role clears the required rank.
pub async fn role_middleware(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Response {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => {
            return ServiceError::Unauthorized("Missing authentication".into()).into_response();
        }
    };

    if !user.has_role(required) {
        return ServiceError::Forbidden(format!(
            "Requires '{}' role or higher",
            required.as_str()
        ))
        .into_response();
    }

    next.run(request).await
}

/// Router extension for role gating
pub trait AuthRouterExt {
    fn with_role(self, role: Role) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_role(self, role: Role) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        // The db handle is unused by the token paths under test.
        let db = Arc::new(DatabaseConnection::Disconnected);
        AuthService::new(
            AuthConfig::new(
                "a_sufficiently_long_testing_secret_string".into(),
                Duration::from_secs(3600),
            ),
            db,
        )
    }

    fn test_account(role: &str) -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            username: "mechanic1".into(),
            email: "mechanic1@example.com".into(),
            password_hash: String::new(),
            role: role.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trip() {
        let service = test_service();
        let account = test_account("supervisor");

        let token = service.generate_token(&account).unwrap();
        let auth_user = service.validate_token(&token.access_token).unwrap();

        assert_eq!(auth_user.user_id, account.id);
        assert_eq!(auth_user.username, "mechanic1");
        assert_eq!(auth_user.role, Role::Supervisor);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let account = test_account("staff");
        let token = service.generate_token(&account).unwrap();

        let mut tampered = token.access_token;
        tampered.push('x');
        assert!(service.validate_token(&tampered).is_err());
        assert!(service.validate_token("not-a-token").is_err());
    }
}
