//! # Outreach CRM API Library
//!
//! Companies, engagements, learning activities, files, tags and shareable
//! resources for an educational-outreach programme, served over HTTP.
//! The [`ids`] and [`codec`] modules hold the wire conversions that any client
//! of the API needs as well.

pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod distribution;
pub mod error;
pub mod error_tracking;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
