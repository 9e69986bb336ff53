//! In-memory Store - Single Adapter for All Store Ports
//!
//! One struct implements `UserStore`, `FranchiseStore`, and
//! `OrderStore` over RwLock-guarded maps. Ids come from one shared
//! atomic sequence. The session set tracks live token `jti`s for the
//! logout-invalidates-token check.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::franchise::{Franchise, FranchiseAdmin, Store};
use crate::domain::order::{MenuItem, Order, OrderItem};
use crate::domain::user::{User, UserId, UserRole};
use crate::ports::store::{FranchiseStore, OrderStore, UserStore};

/// Orders returned per history page.
const ORDERS_PER_PAGE: usize = 10;

/// Process-lifetime storage for users, franchises, menu, and orders.
pub struct InMemoryStore {
    /// Users by id.
    users: RwLock<HashMap<UserId, User>>,
    /// Live token ids.
    sessions: RwLock<HashSet<Uuid>>,
    /// Franchises by id, iterated in id order.
    franchises: RwLock<BTreeMap<u64, Franchise>>,
    /// The menu.
    menu: RwLock<Vec<MenuItem>>,
    /// Order history per diner.
    orders: RwLock<HashMap<UserId, Vec<Order>>>,
    /// Shared id sequence.
    next_id: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashSet::new()),
            franchises: RwLock::new(BTreeMap::new()),
            menu: RwLock::new(Vec::new()),
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn assign_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn add_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        roles: Vec<UserRole>,
    ) -> Result<User> {
        let mut users = self.users.write().await;
        anyhow::ensure!(
            !users.values().any(|u| u.email == email),
            "email already registered: {email}"
        );

        let user = User {
            id: self.assign_id(),
            name,
            email,
            password_hash,
            roles,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: UserId,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn grant_role(&self, id: UserId, role: UserRole) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("unknown user id: {id}"))?;
        if !user.roles.contains(&role) {
            user.roles.push(role);
        }
        Ok(())
    }

    async fn register_session(&self, jti: Uuid) -> Result<()> {
        self.sessions.write().await.insert(jti);
        Ok(())
    }

    async fn is_logged_in(&self, jti: Uuid) -> Result<bool> {
        Ok(self.sessions.read().await.contains(&jti))
    }

    async fn remove_session(&self, jti: Uuid) -> Result<()> {
        self.sessions.write().await.remove(&jti);
        Ok(())
    }
}

#[async_trait]
impl FranchiseStore for InMemoryStore {
    async fn create_franchise(
        &self,
        name: String,
        admins: Vec<FranchiseAdmin>,
    ) -> Result<Franchise> {
        let franchise = Franchise {
            id: self.assign_id(),
            name,
            admins,
            stores: Vec::new(),
        };
        self.franchises
            .write()
            .await
            .insert(franchise.id, franchise.clone());
        Ok(franchise)
    }

    async fn delete_franchise(&self, id: u64) -> Result<bool> {
        Ok(self.franchises.write().await.remove(&id).is_some())
    }

    async fn franchises(&self) -> Result<Vec<Franchise>> {
        Ok(self.franchises.read().await.values().cloned().collect())
    }

    async fn franchise_by_id(&self, id: u64) -> Result<Option<Franchise>> {
        Ok(self.franchises.read().await.get(&id).cloned())
    }

    async fn user_franchises(&self, user_id: UserId) -> Result<Vec<Franchise>> {
        Ok(self
            .franchises
            .read()
            .await
            .values()
            .filter(|f| f.has_admin(user_id))
            .cloned()
            .collect())
    }

    async fn create_store(&self, franchise_id: u64, name: String) -> Result<Option<Store>> {
        let mut franchises = self.franchises.write().await;
        let Some(franchise) = franchises.get_mut(&franchise_id) else {
            return Ok(None);
        };

        let store = Store {
            id: self.assign_id(),
            name,
        };
        franchise.stores.push(store.clone());
        Ok(Some(store))
    }

    async fn delete_store(&self, franchise_id: u64, store_id: u64) -> Result<bool> {
        let mut franchises = self.franchises.write().await;
        let Some(franchise) = franchises.get_mut(&franchise_id) else {
            return Ok(false);
        };

        let before = franchise.stores.len();
        franchise.stores.retain(|s| s.id != store_id);
        Ok(franchise.stores.len() < before)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn add_menu_item(
        &self,
        title: String,
        description: String,
        image: String,
        price: Decimal,
    ) -> Result<MenuItem> {
        let item = MenuItem {
            id: self.assign_id(),
            title,
            description,
            image,
            price,
        };
        self.menu.write().await.push(item.clone());
        Ok(item)
    }

    async fn menu(&self) -> Result<Vec<MenuItem>> {
        Ok(self.menu.read().await.clone())
    }

    async fn add_diner_order(
        &self,
        diner_id: UserId,
        franchise_id: u64,
        store_id: u64,
        items: Vec<OrderItem>,
    ) -> Result<Order> {
        let order = Order {
            id: self.assign_id(),
            diner_id,
            franchise_id,
            store_id,
            items,
            date: Utc::now(),
        };
        self.orders
            .write()
            .await
            .entry(diner_id)
            .or_default()
            .push(order.clone());
        Ok(order)
    }

    async fn diner_orders(&self, diner_id: UserId, page: u32) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .get(&diner_id)
            .map(|history| {
                history
                    .iter()
                    .skip(page as usize * ORDERS_PER_PAGE)
                    .take(ORDERS_PER_PAGE)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::user::Role;

    fn store() -> InMemoryStore {
        InMemoryStore::new()
    }

    #[tokio::test]
    async fn test_add_user_rejects_duplicate_email() {
        let store = store();
        store
            .add_user(
                "a".to_string(),
                "dup@test.com".to_string(),
                "h".to_string(),
                vec![UserRole::global(Role::Diner)],
            )
            .await
            .unwrap();

        let result = store
            .add_user(
                "b".to_string(),
                "dup@test.com".to_string(),
                "h".to_string(),
                vec![UserRole::global(Role::Diner)],
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_user_email() {
        let store = store();
        let user = store
            .add_user(
                "u".to_string(),
                "old@test.com".to_string(),
                "h".to_string(),
                vec![UserRole::global(Role::Diner)],
            )
            .await
            .unwrap();

        let updated = store
            .update_user(user.id, Some("new@test.com".to_string()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "new@test.com");
        assert_eq!(updated.password_hash, "h");
    }

    #[tokio::test]
    async fn test_session_registry_login_logout() {
        let store = store();
        let jti = Uuid::new_v4();

        store.register_session(jti).await.unwrap();
        assert!(store.is_logged_in(jti).await.unwrap());

        store.remove_session(jti).await.unwrap();
        assert!(!store.is_logged_in(jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_franchise_and_store_lifecycle() {
        let store = store();
        let franchise = store
            .create_franchise("best test franchise ever".to_string(), Vec::new())
            .await
            .unwrap();

        let created = store
            .create_store(franchise.id, "Test Store".to_string())
            .await
            .unwrap()
            .unwrap();

        let loaded = store.franchise_by_id(franchise.id).await.unwrap().unwrap();
        assert_eq!(loaded.stores, vec![created.clone()]);

        assert!(store.delete_store(franchise.id, created.id).await.unwrap());
        assert!(!store.delete_store(franchise.id, created.id).await.unwrap());

        assert!(store.delete_franchise(franchise.id).await.unwrap());
        assert!(store.franchise_by_id(franchise.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_franchises_filters_by_admin() {
        let store = store();
        let admin = FranchiseAdmin {
            id: 99,
            name: "f".to_string(),
            email: "f@test.com".to_string(),
        };
        store
            .create_franchise("mine".to_string(), vec![admin])
            .await
            .unwrap();
        store
            .create_franchise("not mine".to_string(), Vec::new())
            .await
            .unwrap();

        let mine = store.user_franchises(99).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "mine");
        assert!(store.user_franchises(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orders_page_and_persist() {
        let store = store();
        let item = OrderItem {
            menu_id: 1,
            description: "Margherita".to_string(),
            price: dec!(9.99),
        };

        for _ in 0..12 {
            store
                .add_diner_order(5, 1, 2, vec![item.clone()])
                .await
                .unwrap();
        }

        let first = store.diner_orders(5, 0).await.unwrap();
        let second = store.diner_orders(5, 1).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 2);
        assert!(store.diner_orders(5, 2).await.unwrap().is_empty());
        assert!(store.diner_orders(6, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_menu_roundtrip() {
        let store = store();
        let item = store
            .add_menu_item(
                "Margherita Pizza".to_string(),
                "Classic pizza with tomatoes and mozzarella cheese".to_string(),
                "image_url".to_string(),
                dec!(9.99),
            )
            .await
            .unwrap();

        let menu = store.menu().await.unwrap();
        assert_eq!(menu, vec![item]);
    }
}
