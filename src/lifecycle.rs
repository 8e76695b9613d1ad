//! Pipeline lifecycle rules.
//!
//! The pure transition table for [`LeadStatus`]. Mutation lives in
//! [`crate::repositories::lead`]; this module only answers which movements
//! are legal and which milestone column a stage stamps.
//!
//! Stage progression:
//! `new -> assigned -> contacted -> awaiting -> closed | lost`, with
//! `closed` and `lost` terminal. Entering `assigned` is reserved for the
//! assignment engine, which is allowed to force it from any prior stage.

use crate::models::LeadStatus;

/// Stages an agent may move a lead into from `from`.
///
/// `assigned` never appears in any result: only the assignment engine puts a
/// lead there, and it does so without consulting this table.
pub fn allowed_transitions(from: LeadStatus) -> &'static [LeadStatus] {
    match from {
        LeadStatus::New => &[],
        LeadStatus::Assigned => &[LeadStatus::Contacted],
        LeadStatus::Contacted => &[LeadStatus::Awaiting],
        LeadStatus::Awaiting => &[LeadStatus::Closed, LeadStatus::Lost],
        LeadStatus::Closed | LeadStatus::Lost => &[],
    }
}

/// Whether an agent-driven move from `from` to `to` is legal.
pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Terminal stages admit no further agent-driven progression.
pub fn is_terminal(status: LeadStatus) -> bool {
    matches!(status, LeadStatus::Closed | LeadStatus::Lost)
}

/// Active leads are those still in the pipeline (not closed, not lost).
pub fn is_active(status: LeadStatus) -> bool {
    !is_terminal(status)
}

/// Milestone column a stage stamps when entered, if any.
///
/// `lost` stamps `closed_at` as well: the single terminal timestamp records
/// when the lead left the pipeline either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    AssignedAt,
    ContactedAt,
    AwaitingAt,
    ClosedAt,
}

pub fn milestone_for(status: LeadStatus) -> Option<Milestone> {
    match status {
        LeadStatus::New => None,
        LeadStatus::Assigned => Some(Milestone::AssignedAt),
        LeadStatus::Contacted => Some(Milestone::ContactedAt),
        LeadStatus::Awaiting => Some(Milestone::AwaitingAt),
        LeadStatus::Closed | LeadStatus::Lost => Some(Milestone::ClosedAt),
    }
}
