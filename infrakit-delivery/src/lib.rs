//! # infrakit-delivery
//!
//! Argo CD REST client implementing [`infrakit_core::DeliveryController`].
//!
//! ```text
//! POST /api/v1/applications?upsert=true     create or update
//! POST /api/v1/applications/<name>/sync     trigger reconciliation
//! GET  /api/v1/applications/<name>          health + sync status
//! ```
//!
//! Every call carries basic authentication. Non-2xx responses surface as
//! [`infrakit_core::DeliveryError::Http`] with the response body; the client
//! never retries.

pub mod application;
pub mod client;

pub use application::{Application, ApplicationStatusResponse};
pub use client::ArgoCdClient;
