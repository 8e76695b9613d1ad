//! # Lead Repository
//!
//! Data access and pipeline mutations for leads. Every status change runs in
//! a single transaction together with its activity ledger row, so the ledger
//! never disagrees with the lead's stage.
//!
//! Visibility rule: a sales agent only ever sees leads assigned to them.
//! Lookups on behalf of a non-owner fail with NotFound rather than Forbidden,
//! so the existence of other agents' leads is not leaked.

use crate::auth::Principal;
use crate::error::RepositoryError;
use crate::lifecycle::{self, Milestone};
use crate::models::lead::{ActiveModel as LeadActiveModel, Column, Entity as Lead, Model};
use crate::models::lead_activity::{ActivityType, Model as ActivityModel};
use crate::models::user::Entity as User;
use crate::models::{LeadSource, LeadStatus};
use crate::repositories::activity;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

const LEAD_NOT_VISIBLE: &str = "Lead not found or not assigned to you";

/// Repository for Lead database operations
pub struct LeadRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeadRepository<'a> {
    /// Create a new LeadRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a lead by id without any visibility check
    pub async fn get_lead(&self, lead_id: Uuid) -> Result<Option<Model>, RepositoryError> {
        let lead = Lead::find_by_id(lead_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(lead)
    }

    /// Fetch a lead the actor is allowed to see. Admins see every lead;
    /// agents only their own. Both "does not exist" and "not yours" collapse
    /// into the same NotFound.
    pub async fn require_visible(
        &self,
        lead_id: Uuid,
        actor: &Principal,
    ) -> Result<Model, RepositoryError> {
        let lead = self.get_lead(lead_id).await?;
        ensure_visible(lead, actor)
    }

    /// Fetch a lead by its phone number
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Model>, RepositoryError> {
        let lead = Lead::find()
            .filter(Column::Phone.eq(phone))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(lead)
    }

    /// Create a new, unassigned lead in the `new` stage.
    ///
    /// Names and phones are trimmed; an empty trimmed value fails validation.
    /// A duplicate phone surfaces as a conflict via the unique index.
    pub async fn create_lead(
        &self,
        full_name: &str,
        email: Option<&str>,
        phone: &str,
        source: LeadSource,
    ) -> Result<Model, RepositoryError> {
        let full_name = full_name.trim();
        let phone = phone.trim();
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        if full_name.is_empty() {
            return Err(RepositoryError::Validation(
                "Full name is required".to_string(),
            ));
        }
        if phone.is_empty() {
            return Err(RepositoryError::Validation("Phone is required".to_string()));
        }

        let now = Utc::now();
        let lead = LeadActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(full_name.to_string()),
            email: Set(email.map(str::to_string)),
            phone: Set(phone.to_string()),
            source: Set(source),
            status: Set(LeadStatus::New),
            assigned_to: Set(None),
            assigned_at: Set(None),
            contacted_at: Set(None),
            awaiting_at: Set(None),
            closed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = lead.insert(self.db).await.map_err(|err| {
            match RepositoryError::database_error(err) {
                RepositoryError::Conflict(_) => RepositoryError::Conflict(
                    "A lead with this phone number already exists".to_string(),
                ),
                other => other,
            }
        })?;

        Ok(inserted)
    }

    /// Assign or reassign a lead to a sales agent. Admin capability only.
    ///
    /// This is the only path into the `assigned` stage and it may force the
    /// move from any prior stage, terminal ones included. `assigned_at` is
    /// re-stamped on every call so it always reflects the latest handover.
    pub async fn assign(
        &self,
        lead_id: Uuid,
        agent_id: Uuid,
        actor: &Principal,
    ) -> Result<Model, RepositoryError> {
        if !actor.is_admin {
            return Err(RepositoryError::Forbidden(
                "Admin access required".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let lead = Lead::find_by_id(lead_id)
            .one(&txn)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("Lead not found".to_string()))?;

        let agent = User::find_by_id(agent_id)
            .one(&txn)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;

        if !agent.is_sales_agent {
            return Err(RepositoryError::Validation(
                "Assignee must hold the sales agent role".to_string(),
            ));
        }

        let message = match lead.assigned_to {
            Some(previous_id) if previous_id != agent.id => {
                let previous = User::find_by_id(previous_id)
                    .one(&txn)
                    .await
                    .map_err(RepositoryError::database_error)?;
                let previous_name = previous
                    .map(|u| u.display_name)
                    .unwrap_or_else(|| "a former agent".to_string());
                format!(
                    "Lead reassigned from {} to {}",
                    previous_name, agent.display_name
                )
            }
            _ => format!("Lead assigned to {}", agent.display_name),
        };

        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut active: LeadActiveModel = lead.into();
        active.status = Set(LeadStatus::Assigned);
        active.assigned_to = Set(Some(agent.id));
        active.assigned_at = Set(Some(now));
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        activity::append(&txn, updated.id, Some(actor.id), ActivityType::Status, message)
            .await
            .map_err(RepositoryError::database_error)?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        tracing::info!(lead_id = %updated.id, agent_id = %agent.id, "Lead assigned");

        Ok(updated)
    }

    /// Move a lead to the next pipeline stage on behalf of its owner.
    ///
    /// Illegal movements fail with InvalidTransition and leave both the lead
    /// and the ledger untouched.
    pub async fn advance(
        &self,
        lead_id: Uuid,
        target: LeadStatus,
        actor: &Principal,
    ) -> Result<Model, RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let lead = find_visible(&txn, lead_id, actor).await?;

        let message = format!("Stage changed from {} to {}", lead.status, target);
        let updated = transition(&txn, lead, target, actor, message).await?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok(updated)
    }

    /// Record first contact with a lead. Only legal from the `assigned`
    /// stage; the ledger row reads "Lead was contacted" rather than the
    /// generic stage-change wording.
    pub async fn mark_contacted(
        &self,
        lead_id: Uuid,
        actor: &Principal,
    ) -> Result<Model, RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let lead = find_visible(&txn, lead_id, actor).await?;

        let updated = transition(
            &txn,
            lead,
            LeadStatus::Contacted,
            actor,
            "Lead was contacted".to_string(),
        )
        .await?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok(updated)
    }

    /// Log an interaction with a lead, optionally moving it to a new stage in
    /// the same transaction.
    ///
    /// When a stage is given the transition is applied first and writes its
    /// own status ledger row; the interaction row is appended after, so the
    /// ledger reads in cause-then-effect order when listed newest first.
    pub async fn record_activity(
        &self,
        lead_id: Uuid,
        activity_type: ActivityType,
        message: &str,
        new_stage: Option<LeadStatus>,
        actor: &Principal,
    ) -> Result<(Model, ActivityModel), RepositoryError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(RepositoryError::Validation(
                "Message is required".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;

        let lead = find_visible(&txn, lead_id, actor).await?;

        let lead = match new_stage {
            Some(target) => {
                let note = format!("Stage changed from {} to {}", lead.status, target);
                transition(&txn, lead, target, actor, note).await?
            }
            None => lead,
        };

        let entry = activity::append(
            &txn,
            lead.id,
            Some(actor.id),
            activity_type,
            message.to_string(),
        )
        .await
        .map_err(RepositoryError::database_error)?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok((lead, entry))
    }
}

fn ensure_visible(lead: Option<Model>, actor: &Principal) -> Result<Model, RepositoryError> {
    match lead {
        Some(lead) if actor.is_admin || lead.assigned_to == Some(actor.id) => Ok(lead),
        _ => Err(RepositoryError::NotFound(LEAD_NOT_VISIBLE.to_string())),
    }
}

pub(crate) async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    lead_id: Uuid,
    actor: &Principal,
) -> Result<Model, RepositoryError> {
    let lead = Lead::find_by_id(lead_id)
        .one(conn)
        .await
        .map_err(RepositoryError::database_error)?;

    ensure_visible(lead, actor)
}

/// Apply one legal stage movement and its ledger row on the caller's
/// transaction.
///
/// The update is conditioned on the stage the movement was validated
/// against, so a concurrent writer that already moved the lead matches zero
/// rows and the stale attempt fails instead of overwriting.
async fn transition<C: ConnectionTrait>(
    conn: &C,
    lead: Model,
    target: LeadStatus,
    actor: &Principal,
    message: String,
) -> Result<Model, RepositoryError> {
    if !lifecycle::can_transition(lead.status, target) {
        return Err(RepositoryError::InvalidTransition(format!(
            "Cannot move from '{}' to '{}'",
            lead.status, target
        )));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let lead_id = lead.id;
    let prior = lead.status;

    let mut active = LeadActiveModel {
        status: Set(target),
        updated_at: Set(now),
        ..Default::default()
    };
    match lifecycle::milestone_for(target) {
        Some(Milestone::AssignedAt) => active.assigned_at = Set(Some(now)),
        Some(Milestone::ContactedAt) => active.contacted_at = Set(Some(now)),
        Some(Milestone::AwaitingAt) => active.awaiting_at = Set(Some(now)),
        Some(Milestone::ClosedAt) => active.closed_at = Set(Some(now)),
        None => {}
    }

    let result = Lead::update_many()
        .set(active)
        .filter(Column::Id.eq(lead_id))
        .filter(Column::Status.eq(prior))
        .exec(conn)
        .await
        .map_err(RepositoryError::database_error)?;

    if result.rows_affected == 0 {
        return Err(RepositoryError::InvalidTransition(format!(
            "Lead is no longer in '{}', cannot move to '{}'",
            prior, target
        )));
    }

    let updated = Lead::find_by_id(lead_id)
        .one(conn)
        .await
        .map_err(RepositoryError::database_error)?
        .ok_or_else(|| RepositoryError::NotFound("Lead not found".to_string()))?;

    activity::append(conn, lead_id, Some(actor.id), ActivityType::Status, message)
        .await
        .map_err(RepositoryError::database_error)?;

    Ok(updated)
}
