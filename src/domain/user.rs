//! User, role, and token claim domain types.
//!
//! Users carry a list of role grants. The `franchisee` role is scoped to
//! a franchise id; `diner` and `admin` are global. Tokens are HS256 JWTs
//! whose claims mirror the user identity plus a `jti` that the session
//! registry tracks so logout can invalidate a live token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lightweight user identifier used across ports and adapters.
pub type UserId = u64;

/// Global role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer placing orders.
    Diner,
    /// Administrator of one franchise (scoped grant).
    Franchisee,
    /// Global administrator.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diner => write!(f, "diner"),
            Self::Franchisee => write!(f, "franchisee"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// One role grant, optionally scoped to an object.
///
/// For `Franchisee` the `object_id` is the franchise the user
/// administers; global roles leave it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Granted role.
    pub role: Role,
    /// Scope object (franchise id) for scoped roles.
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none", default)]
    pub object_id: Option<u64>,
}

impl UserRole {
    /// Unscoped grant of a global role.
    pub fn global(role: Role) -> Self {
        Self {
            role,
            object_id: None,
        }
    }

    /// Franchisee grant scoped to one franchise.
    pub fn franchisee(franchise_id: u64) -> Self {
        Self {
            role: Role::Franchisee,
            object_id: Some(franchise_id),
        }
    }
}

/// A registered user.
///
/// The password hash never serializes into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Assigned user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: String,
    /// bcrypt hash of the password.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Role grants.
    pub roles: Vec<UserRole>,
}

impl User {
    /// Whether the user holds the given global role.
    pub fn is_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }
}

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject: the user id.
    pub sub: UserId,
    /// Display name at issuance time.
    pub name: String,
    /// Email at issuance time.
    pub email: String,
    /// Role grants at issuance time.
    pub roles: Vec<UserRole>,
    /// Token id tracked by the session registry.
    pub jti: Uuid,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Authenticated caller extracted from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role grants.
    pub roles: Vec<UserRole>,
    /// Token id of the presented token.
    pub jti: Uuid,
}

impl AuthUser {
    /// Whether the caller holds the given global role.
    pub fn is_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }

    /// Whether the caller administers the given franchise (directly or
    /// as a global admin).
    pub fn administers(&self, franchise_id: u64) -> bool {
        self.is_role(Role::Admin)
            || self
                .roles
                .iter()
                .any(|r| r.role == Role::Franchisee && r.object_id == Some(franchise_id))
    }
}

impl From<AuthClaims> for AuthUser {
    fn from(claims: AuthClaims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            jti: claims.jti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diner() -> User {
        User {
            id: 7,
            name: "pizza diner".to_string(),
            email: "d@test.com".to_string(),
            password_hash: "$2b$fake".to_string(),
            roles: vec![UserRole::global(Role::Diner)],
        }
    }

    #[test]
    fn test_role_display() {
        assert_eq!(format!("{}", Role::Diner), "diner");
        assert_eq!(format!("{}", Role::Franchisee), "franchisee");
        assert_eq!(format!("{}", Role::Admin), "admin");
    }

    #[test]
    fn test_is_role() {
        let user = diner();
        assert!(user.is_role(Role::Diner));
        assert!(!user.is_role(Role::Admin));
    }

    #[test]
    fn test_password_hash_never_serializes() {
        let json = serde_json::to_string(&diner()).unwrap();
        assert!(!json.contains("$2b$fake"));
        assert!(json.contains("\"roles\":[{\"role\":\"diner\"}]"));
    }

    #[test]
    fn test_administers_scoped_and_global() {
        let mut user = AuthUser {
            id: 1,
            name: "f".to_string(),
            email: "f@test.com".to_string(),
            roles: vec![UserRole::franchisee(42)],
            jti: Uuid::new_v4(),
        };
        assert!(user.administers(42));
        assert!(!user.administers(43));

        user.roles.push(UserRole::global(Role::Admin));
        assert!(user.administers(43));
    }
}
