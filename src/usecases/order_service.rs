//! Order Service - Menu Management and Order Placement
//!
//! Orders are persisted first, then handed to the pizza factory through
//! the fulfillment port. Sale metrics (sold count, revenue, factory
//! latency) are emitted only on successful fulfillment; a factory
//! failure records a creation failure and surfaces a 500 to the diner.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::domain::error::{ServiceError, ServiceResult};
use crate::domain::metrics::names;
use crate::domain::order::{MenuItem, Order, OrderItem};
use crate::domain::user::{AuthUser, Role};
use crate::ports::fulfillment::{DinerInfo, OrderFulfillment};
use crate::ports::store::OrderStore;
use crate::usecases::metrics_pipeline::MetricBus;

/// A fulfilled order together with the factory receipt.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
  /// The persisted order.
  pub order: Order,
  /// Signed factory receipt.
  pub jwt: String,
  /// Factory problem-report URL, when provided.
  pub report_url: Option<String>,
}

/// Menu CRUD and diner order placement.
pub struct OrderService {
  /// Menu and order persistence.
  orders: Arc<dyn OrderStore>,
  /// Factory hand-off.
  factory: Arc<dyn OrderFulfillment>,
  /// Metric event emitter.
  metrics: MetricBus,
}

impl OrderService {
  /// Wire the service from its ports.
  pub fn new(
    orders: Arc<dyn OrderStore>,
    factory: Arc<dyn OrderFulfillment>,
    metrics: MetricBus,
  ) -> Self {
    Self {
      orders,
      factory,
      metrics,
    }
  }

  /// The full menu.
  pub async fn menu(&self) -> ServiceResult<Vec<MenuItem>> {
    Ok(self.orders.menu().await?)
  }

  /// Add a menu item (admin only) and return the updated menu.
  pub async fn add_menu_item(
    &self,
    caller: &AuthUser,
    title: String,
    description: String,
    image: String,
    price: Decimal,
  ) -> ServiceResult<Vec<MenuItem>> {
    if !caller.is_role(Role::Admin) {
      return Err(ServiceError::Forbidden(
        "unable to add menu item".to_string(),
      ));
    }
    if title.is_empty() {
      return Err(ServiceError::BadRequest(
        "menu item title is required".to_string(),
      ));
    }

    self
      .orders
      .add_menu_item(title, description, image, price)
      .await?;
    Ok(self.orders.menu().await?)
  }

  /// A page of the caller's order history.
  pub async fn diner_orders(&self, caller: &AuthUser, page: u32) -> ServiceResult<Vec<Order>> {
    Ok(self.orders.diner_orders(caller.id, page).await?)
  }

  /// Persist an order and hand it to the factory.
  #[instrument(skip(self, caller, items), fields(diner = caller.id, items = items.len()))]
  pub async fn place_order(
    &self,
    caller: &AuthUser,
    franchise_id: u64,
    store_id: u64,
    items: Vec<OrderItem>,
  ) -> ServiceResult<PlacedOrder> {
    if items.is_empty() {
      return Err(ServiceError::BadRequest(
        "order must contain at least one item".to_string(),
      ));
    }

    let order = self
      .orders
      .add_diner_order(caller.id, franchise_id, store_id, items)
      .await?;

    let diner = DinerInfo {
      id: caller.id,
      name: caller.name.clone(),
      email: caller.email.clone(),
    };

    let start = Instant::now();
    match self.factory.fulfill(&diner, &order).await {
      Ok(report) => {
        self
          .metrics
          .set(names::PIZZA_LATENCY, start.elapsed().as_millis() as f64);
        self
          .metrics
          .increment_by(names::PIZZAS_SOLD, order.items.len() as f64);
        self
          .metrics
          .increment_by(names::PIZZA_REVENUE, order.total().to_f64().unwrap_or(0.0));

        info!(order_id = order.id, "Order fulfilled by factory");
        Ok(PlacedOrder {
          order,
          jwt: report.jwt,
          report_url: report.report_url,
        })
      }
      Err(e) => {
        self.metrics.increment(names::PIZZA_FAILURES);
        warn!(order_id = order.id, error = %e, "Factory failed to fulfill order");
        Err(ServiceError::FactoryFailure(e))
      }
    }
  }
}
