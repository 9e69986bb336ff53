//! Auth Service - Registration, Login, and Token Lifecycle
//!
//! Issues HS256 JWTs on register/login, tracks live token ids in the
//! session registry so logout invalidates a token before expiry, and
//! records auth outcome metrics. Password hashes use bcrypt and are
//! computed on the blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::error::{ServiceError, ServiceResult};
use crate::domain::metrics::names;
use crate::domain::user::{AuthClaims, AuthUser, Role, User, UserId, UserRole};
use crate::ports::store::UserStore;
use crate::usecases::metrics_pipeline::MetricBus;

/// A logged-in user together with their bearer token.
#[derive(Debug, Clone)]
pub struct Session {
  /// The authenticated user.
  pub user: User,
  /// Signed bearer token.
  pub token: String,
}

/// Signs and verifies bearer tokens.
pub struct TokenIssuer {
  /// HS256 signing key.
  encoding: EncodingKey,
  /// HS256 verification key.
  decoding: DecodingKey,
  /// Issued token lifetime.
  ttl: chrono::Duration,
}

impl TokenIssuer {
  /// Build an issuer from a raw secret.
  pub fn new(secret: &[u8], ttl_hours: u64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      ttl: chrono::Duration::hours(ttl_hours as i64),
    }
  }

  /// Load the signing secret from the PIZZA_JWT_SECRET env var.
  ///
  /// The secret MUST be set in the environment (never in config.toml).
  pub fn from_env(ttl_hours: u64) -> Result<Self> {
    let secret = std::env::var("PIZZA_JWT_SECRET").context("PIZZA_JWT_SECRET not set")?;
    anyhow::ensure!(
      secret.len() >= 32,
      "PIZZA_JWT_SECRET must be at least 32 bytes"
    );
    Ok(Self::new(secret.as_bytes(), ttl_hours))
  }

  /// Issue a token for the user with a fresh `jti`.
  pub fn issue(&self, user: &User) -> Result<(String, AuthClaims)> {
    let now = Utc::now();
    let claims = AuthClaims {
      sub: user.id,
      name: user.name.clone(),
      email: user.email.clone(),
      roles: user.roles.clone(),
      jti: Uuid::new_v4(),
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .context("Failed to sign token")?;
    Ok((token, claims))
  }

  /// Verify signature and expiry, returning the claims.
  pub fn verify(&self, token: &str) -> Result<AuthClaims, ServiceError> {
    decode::<AuthClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
      .map(|data| data.claims)
      .map_err(|_| ServiceError::Unauthorized)
  }
}

/// Registration, login, logout, and token verification.
pub struct AuthService {
  /// User and session persistence.
  users: Arc<dyn UserStore>,
  /// Token signer/verifier.
  issuer: TokenIssuer,
  /// Metric event emitter.
  metrics: MetricBus,
}

impl AuthService {
  /// Wire the service from its ports.
  pub fn new(users: Arc<dyn UserStore>, issuer: TokenIssuer, metrics: MetricBus) -> Self {
    Self {
      users,
      issuer,
      metrics,
    }
  }

  /// Register a new diner and open a session.
  #[instrument(skip(self, password))]
  pub async fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<Session> {
    if name.is_empty() || email.is_empty() || password.is_empty() {
      return Err(ServiceError::BadRequest(
        "name, email, and password are required".to_string(),
      ));
    }
    if self.users.user_by_email(email).await?.is_some() {
      return Err(ServiceError::BadRequest(
        "email already registered".to_string(),
      ));
    }

    let hash = hash_password(password).await?;
    let user = self
      .users
      .add_user(
        name.to_string(),
        email.to_string(),
        hash,
        vec![UserRole::global(Role::Diner)],
      )
      .await?;

    info!(user_id = user.id, "User registered");
    self.open_session(user).await
  }

  /// Log an existing user in.
  ///
  /// Unknown email and wrong password are indistinguishable to the
  /// caller; both record a failed attempt.
  #[instrument(skip(self, password))]
  pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
    let Some(user) = self.users.user_by_email(email).await? else {
      self.metrics.increment(names::AUTH_FAILED);
      return Err(ServiceError::NotFound("unknown user".to_string()));
    };

    if !verify_password(password, &user.password_hash).await? {
      self.metrics.increment(names::AUTH_FAILED);
      return Err(ServiceError::NotFound("unknown user".to_string()));
    }

    self.metrics.increment(names::AUTH_SUCCESSFUL);
    self.open_session(user).await
  }

  /// Invalidate the caller's token.
  pub async fn logout(&self, caller: &AuthUser) -> ServiceResult<()> {
    self.users.remove_session(caller.jti).await?;
    self.metrics.decrement(names::ACTIVE_USERS);
    Ok(())
  }

  /// Update a user's email and/or password. Users may update
  /// themselves; admins may update anyone.
  pub async fn update_user(
    &self,
    caller: &AuthUser,
    target: UserId,
    email: Option<String>,
    password: Option<String>,
  ) -> ServiceResult<User> {
    if caller.id != target && !caller.is_role(Role::Admin) {
      return Err(ServiceError::Forbidden("unauthorized".to_string()));
    }

    let password_hash = match password.filter(|p| !p.is_empty()) {
      Some(p) => Some(hash_password(&p).await?),
      None => None,
    };

    self
      .users
      .update_user(target, email.filter(|e| !e.is_empty()), password_hash)
      .await?
      .ok_or_else(|| ServiceError::NotFound("unknown user".to_string()))
  }

  /// Verify a bearer token and check its session is still live.
  pub async fn authenticate(&self, token: &str) -> ServiceResult<AuthUser> {
    let claims = self.issuer.verify(token)?;
    if !self.users.is_logged_in(claims.jti).await? {
      return Err(ServiceError::Unauthorized);
    }
    Ok(AuthUser::from(claims))
  }

  /// Seed the configured admin account if it does not exist yet.
  pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<()> {
    if self.users.user_by_email(email).await?.is_some() {
      return Ok(());
    }
    let hash = hash_password(password).await?;
    self
      .users
      .add_user(
        name.to_string(),
        email.to_string(),
        hash,
        vec![UserRole::global(Role::Admin)],
      )
      .await?;
    info!(email, "Seeded default admin account");
    Ok(())
  }

  async fn open_session(&self, user: User) -> ServiceResult<Session> {
    let (token, claims) = self.issuer.issue(&user)?;
    self.users.register_session(claims.jti).await?;
    self.metrics.increment(names::ACTIVE_USERS);
    Ok(Session { user, token })
  }
}

/// bcrypt-hash a password on the blocking pool.
async fn hash_password(password: &str) -> Result<String> {
  let password = password.to_string();
  tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
    .await
    .context("Password hashing task failed")?
    .context("Password hashing failed")
}

/// Verify a password against a bcrypt hash on the blocking pool.
async fn verify_password(password: &str, hash: &str) -> Result<bool> {
  let password = password.to_string();
  let hash = hash.to_string();
  tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
    .await
    .context("Password verification task failed")?
    .context("Password verification failed")
}
