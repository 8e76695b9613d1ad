//! # Data Models
//!
//! This module contains the SeaORM entities and closed domain enums used
//! throughout the Leadpipe CRM API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod lead;
pub mod lead_activity;
pub mod note;
pub mod user;

pub use lead::Entity as Lead;
pub use lead::{LeadSource, LeadStatus};
pub use lead_activity::ActivityType;
pub use lead_activity::Entity as LeadActivity;
pub use note::Entity as Note;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "leadpipe".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
