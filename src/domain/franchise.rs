//! Franchise and store domain types.

use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Summary of a user administering a franchise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseAdmin {
    /// User id of the admin.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email the franchise was created with.
    pub email: String,
}

/// A store belonging to a franchise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Assigned store id.
    pub id: u64,
    /// Store name.
    pub name: String,
}

/// A franchise with its administrators and stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    /// Assigned franchise id.
    pub id: u64,
    /// Franchise name.
    pub name: String,
    /// Users administering this franchise.
    pub admins: Vec<FranchiseAdmin>,
    /// Stores operated under this franchise.
    pub stores: Vec<Store>,
}

impl Franchise {
    /// Whether the given user administers this franchise.
    pub fn has_admin(&self, user_id: UserId) -> bool {
        self.admins.iter().any(|a| a.id == user_id)
    }
}
