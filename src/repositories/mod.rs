//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities. Mutations that must stay consistent with
//! the activity ledger run inside a single transaction here.

pub mod activity;
pub mod lead;
pub mod note;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity::ActivityRepository;
pub use lead::LeadRepository;
pub use note::NoteRepository;
pub use user::UserRepository;
