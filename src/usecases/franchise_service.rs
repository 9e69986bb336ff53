//! Franchise Service - Franchise and Store Administration
//!
//! Franchise creation/deletion is restricted to global admins. Store
//! management is open to global admins and that franchise's own
//! administrators; authorization is checked against the stored admin
//! list, not the caller's token, so grants made after token issuance
//! take effect immediately.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::error::{ServiceError, ServiceResult};
use crate::domain::franchise::{Franchise, FranchiseAdmin, Store};
use crate::domain::user::{AuthUser, Role, UserId, UserRole};
use crate::ports::store::{FranchiseStore, UserStore};

/// Franchise and store CRUD with role-based authorization.
pub struct FranchiseService {
  /// Franchise persistence.
  franchises: Arc<dyn FranchiseStore>,
  /// User lookup for admin email resolution and role grants.
  users: Arc<dyn UserStore>,
}

impl FranchiseService {
  /// Wire the service from its ports.
  pub fn new(franchises: Arc<dyn FranchiseStore>, users: Arc<dyn UserStore>) -> Self {
    Self { franchises, users }
  }

  /// Every franchise with its stores.
  pub async fn list(&self) -> ServiceResult<Vec<Franchise>> {
    Ok(self.franchises.franchises().await?)
  }

  /// Franchises the given user administers.
  ///
  /// Callers may only ask about themselves unless they are admins;
  /// asking about someone else yields an empty list rather than an
  /// error.
  pub async fn user_franchises(
    &self,
    caller: &AuthUser,
    user_id: UserId,
  ) -> ServiceResult<Vec<Franchise>> {
    if caller.id != user_id && !caller.is_role(Role::Admin) {
      return Ok(Vec::new());
    }
    Ok(self.franchises.user_franchises(user_id).await?)
  }

  /// Create a franchise (admin only). Each named admin must be a
  /// registered user; they receive a franchisee grant for the new
  /// franchise.
  #[instrument(skip(self, caller), fields(caller_id = caller.id))]
  pub async fn create(
    &self,
    caller: &AuthUser,
    name: String,
    admin_emails: Vec<String>,
  ) -> ServiceResult<Franchise> {
    if !caller.is_role(Role::Admin) {
      return Err(ServiceError::Forbidden(
        "unable to create a franchise".to_string(),
      ));
    }
    if name.is_empty() {
      return Err(ServiceError::BadRequest(
        "franchise name is required".to_string(),
      ));
    }

    let mut admins = Vec::with_capacity(admin_emails.len());
    for email in &admin_emails {
      let Some(user) = self.users.user_by_email(email).await? else {
        return Err(ServiceError::NotFound(format!(
          "unknown user for franchise admin: {email}"
        )));
      };
      admins.push(FranchiseAdmin {
        id: user.id,
        name: user.name,
        email: user.email,
      });
    }

    let franchise = self.franchises.create_franchise(name, admins).await?;

    for admin in &franchise.admins {
      self
        .users
        .grant_role(admin.id, UserRole::franchisee(franchise.id))
        .await?;
    }

    info!(franchise_id = franchise.id, "Franchise created");
    Ok(franchise)
  }

  /// Delete a franchise and its stores (admin only).
  pub async fn delete(&self, caller: &AuthUser, id: u64) -> ServiceResult<()> {
    if !caller.is_role(Role::Admin) {
      return Err(ServiceError::Forbidden(
        "unable to delete a franchise".to_string(),
      ));
    }
    if !self.franchises.delete_franchise(id).await? {
      return Err(ServiceError::NotFound("unknown franchise".to_string()));
    }
    info!(franchise_id = id, "Franchise deleted");
    Ok(())
  }

  /// Add a store to a franchise (admin or franchise admin).
  pub async fn create_store(
    &self,
    caller: &AuthUser,
    franchise_id: u64,
    name: String,
  ) -> ServiceResult<Store> {
    self.authorize_store_op(caller, franchise_id, "unable to create a store").await?;

    self
      .franchises
      .create_store(franchise_id, name)
      .await?
      .ok_or_else(|| ServiceError::NotFound("unknown franchise".to_string()))
  }

  /// Remove a store from a franchise (admin or franchise admin).
  pub async fn delete_store(
    &self,
    caller: &AuthUser,
    franchise_id: u64,
    store_id: u64,
  ) -> ServiceResult<()> {
    self.authorize_store_op(caller, franchise_id, "unable to delete a store").await?;

    if !self.franchises.delete_store(franchise_id, store_id).await? {
      return Err(ServiceError::NotFound("unknown store".to_string()));
    }
    Ok(())
  }

  async fn authorize_store_op(
    &self,
    caller: &AuthUser,
    franchise_id: u64,
    denial: &str,
  ) -> ServiceResult<()> {
    let franchise = self
      .franchises
      .franchise_by_id(franchise_id)
      .await?
      .ok_or_else(|| ServiceError::NotFound("unknown franchise".to_string()))?;

    if caller.is_role(Role::Admin) || franchise.has_admin(caller.id) {
      Ok(())
    } else {
      Err(ServiceError::Forbidden(denial.to_string()))
    }
  }
}
