//! Order Fulfillment Port - Pizza Factory Interface
//!
//! Defines the trait for handing a persisted order to the external
//! pizza factory. The factory returns a signed receipt (JWT) the diner
//! can verify, plus an optional URL for reporting slow deliveries.

use async_trait::async_trait;

use crate::domain::order::Order;
use crate::domain::user::UserId;

/// Diner identity forwarded to the factory with each order.
#[derive(Debug, Clone)]
pub struct DinerInfo {
  /// Diner user id.
  pub id: UserId,
  /// Display name.
  pub name: String,
  /// Contact email.
  pub email: String,
}

/// Receipt returned by the factory for a fulfilled order.
#[derive(Debug, Clone)]
pub struct FactoryReport {
  /// Signed order receipt.
  pub jwt: String,
  /// URL for reporting fulfillment problems, when the factory
  /// provides one.
  pub report_url: Option<String>,
}

/// Trait for order fulfillment providers.
#[async_trait]
pub trait OrderFulfillment: Send + Sync + 'static {
  /// Submit an order for fulfillment.
  ///
  /// # Errors
  /// Returns an error when the factory rejects the order or the
  /// transport fails; the caller records the failure metric and maps
  /// this to a 500.
  async fn fulfill(&self, diner: &DinerInfo, order: &Order) -> anyhow::Result<FactoryReport>;
}
