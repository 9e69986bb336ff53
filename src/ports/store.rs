//! Store Ports - In-memory CRUD Persistence Interfaces
//!
//! Defines the traits the use-case layer requires for user, franchise,
//! and order state. State is process-lifetime only: reinitialized on
//! restart, lost on crash. Implementors live in
//! `crate::adapters::persistence`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::franchise::{Franchise, FranchiseAdmin, Store};
use crate::domain::order::{MenuItem, Order, OrderItem};
use crate::domain::user::{User, UserId, UserRole};

/// Trait for user and session persistence.
///
/// The session registry tracks the `jti` of every live token so logout
/// can invalidate a token before its expiry.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
  /// Insert a new user and assign an id.
  ///
  /// # Errors
  /// Returns an error if the email is already registered.
  async fn add_user(
    &self,
    name: String,
    email: String,
    password_hash: String,
    roles: Vec<UserRole>,
  ) -> anyhow::Result<User>;

  /// Look up a user by login email.
  async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

  /// Look up a user by id.
  async fn user_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;

  /// Update a user's email and/or password hash. Returns the updated
  /// user, or `None` if the id is unknown.
  async fn update_user(
    &self,
    id: UserId,
    email: Option<String>,
    password_hash: Option<String>,
  ) -> anyhow::Result<Option<User>>;

  /// Attach an additional role grant to a user.
  async fn grant_role(&self, id: UserId, role: UserRole) -> anyhow::Result<()>;

  /// Record a live token id at login.
  async fn register_session(&self, jti: Uuid) -> anyhow::Result<()>;

  /// Whether the token id is still live.
  async fn is_logged_in(&self, jti: Uuid) -> anyhow::Result<bool>;

  /// Drop a token id at logout.
  async fn remove_session(&self, jti: Uuid) -> anyhow::Result<()>;
}

/// Trait for franchise and store persistence.
#[async_trait]
pub trait FranchiseStore: Send + Sync + 'static {
  /// Insert a new franchise with the given administrators.
  async fn create_franchise(
    &self,
    name: String,
    admins: Vec<FranchiseAdmin>,
  ) -> anyhow::Result<Franchise>;

  /// Delete a franchise and its stores. Returns whether it existed.
  async fn delete_franchise(&self, id: u64) -> anyhow::Result<bool>;

  /// List every franchise.
  async fn franchises(&self) -> anyhow::Result<Vec<Franchise>>;

  /// Look up one franchise.
  async fn franchise_by_id(&self, id: u64) -> anyhow::Result<Option<Franchise>>;

  /// List the franchises a user administers.
  async fn user_franchises(&self, user_id: UserId) -> anyhow::Result<Vec<Franchise>>;

  /// Add a store to a franchise. Returns `None` if the franchise is
  /// unknown.
  async fn create_store(
    &self,
    franchise_id: u64,
    name: String,
  ) -> anyhow::Result<Option<Store>>;

  /// Remove a store from a franchise. Returns whether it existed.
  async fn delete_store(&self, franchise_id: u64, store_id: u64) -> anyhow::Result<bool>;
}

/// Trait for menu and diner-order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
  /// Add an item to the menu and assign an id.
  async fn add_menu_item(
    &self,
    title: String,
    description: String,
    image: String,
    price: Decimal,
  ) -> anyhow::Result<MenuItem>;

  /// The full menu.
  async fn menu(&self) -> anyhow::Result<Vec<MenuItem>>;

  /// Persist a diner order and assign an id.
  async fn add_diner_order(
    &self,
    diner_id: UserId,
    franchise_id: u64,
    store_id: u64,
    items: Vec<OrderItem>,
  ) -> anyhow::Result<Order>;

  /// A page of the diner's order history (oldest first).
  async fn diner_orders(&self, diner_id: UserId, page: u32) -> anyhow::Result<Vec<Order>>;
}
