//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP server and clients, host sampling,
//! in-memory storage). Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `http`: Inbound axum API (routes, auth extraction, tracking)
//! - `factory`: Outbound pizza-factory REST client
//! - `metrics`: Host probe and remote time-series push sink
//! - `persistence`: In-memory user/franchise/order storage

pub mod factory;
pub mod http;
pub mod metrics;
pub mod persistence;
