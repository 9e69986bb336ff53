//! Menu and order domain types.
//!
//! Prices use `rust_decimal::Decimal` internally and only convert to
//! `f64` at the metrics boundary (revenue counter).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// A pizza on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Assigned menu item id.
    pub id: u64,
    /// Pizza name.
    pub title: String,
    /// Menu description.
    pub description: String,
    /// Image asset name.
    pub image: String,
    /// Price in the store currency.
    pub price: Decimal,
}

/// One line of a diner order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Menu item ordered.
    pub menu_id: u64,
    /// Description captured at order time.
    pub description: String,
    /// Price captured at order time.
    pub price: Decimal,
}

/// A placed diner order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Assigned order id.
    pub id: u64,
    /// Diner who placed the order.
    pub diner_id: UserId,
    /// Franchise the order was placed with.
    pub franchise_id: u64,
    /// Store the order was placed at.
    pub store_id: u64,
    /// Ordered items.
    pub items: Vec<OrderItem>,
    /// Placement timestamp.
    pub date: DateTime<Utc>,
}

impl Order {
    /// Sum of the item prices.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|i| i.price).sum()
    }
}
