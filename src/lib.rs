//! # Leadpipe CRM Library
//!
//! This library provides the core functionality for the Leadpipe CRM
//! service: the lead pipeline state machine, the activity ledger, assignment,
//! reporting, bulk import, and the HTTP surface over them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod import;
pub mod lifecycle;
pub mod models;
pub mod reporting;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
