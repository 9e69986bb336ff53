//! Pizza Factory Adapter
//!
//! Outbound REST client implementing the `OrderFulfillment` port.

pub mod client;

pub use client::PizzaFactoryClient;
