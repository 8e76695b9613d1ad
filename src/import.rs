//! # Bulk Lead Import
//!
//! Batch intake of leads with per-row isolation: one bad row never aborts the
//! batch, it is reported and the rest proceed. Rows are processed in order,
//! so a phone duplicated inside the batch creates the first occurrence and
//! rejects the later ones.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RepositoryError;
use crate::models::LeadSource;
use crate::repositories::LeadRepository;

/// Cap on how many row errors the summary carries back to the caller.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// One incoming lead row.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LeadImportRow {
    /// Full name of the prospect
    pub full_name: String,
    /// Contact email, if known
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number
    pub phone: String,
    /// Intake channel; unknown or missing values fall back to manual
    #[serde(default)]
    pub source: Option<String>,
}

/// A rejected row: its position in the batch (zero-based) and why.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of an import batch.
///
/// `error_count` is the true number of failures; `errors` holds at most
/// [`MAX_REPORTED_ERRORS`] of them.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportSummary {
    pub created: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

/// Import a batch of lead rows, one insert per row.
pub async fn import_rows(
    db: &DatabaseConnection,
    rows: &[LeadImportRow],
) -> Result<ImportSummary, RepositoryError> {
    let repo = LeadRepository::new(db);

    let mut created = 0;
    let mut error_count = 0;
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let source = row
            .source
            .as_deref()
            .map(LeadSource::parse_or_manual)
            .unwrap_or(LeadSource::Manual);

        let result = insert_row(&repo, row, source).await;

        match result {
            Ok(_) => created += 1,
            Err(RepositoryError::Database(err)) => {
                // Infrastructure failure, not a data problem: abort the batch.
                return Err(RepositoryError::Database(err));
            }
            Err(err) => {
                error_count += 1;
                if errors.len() < MAX_REPORTED_ERRORS {
                    errors.push(RowError {
                        row: index,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(created, error_count, total = rows.len(), "Lead import finished");

    Ok(ImportSummary {
        created,
        error_count,
        errors,
    })
}

/// Insert one row. The phone pre-check produces a row-specific message; the
/// unique index still backstops races with concurrent writers.
async fn insert_row(
    repo: &LeadRepository<'_>,
    row: &LeadImportRow,
    source: LeadSource,
) -> Result<(), RepositoryError> {
    let phone = row.phone.trim();
    if !phone.is_empty() && repo.find_by_phone(phone).await?.is_some() {
        return Err(RepositoryError::Conflict(format!(
            "A lead with phone {} already exists",
            phone
        )));
    }

    repo.create_lead(&row.full_name, row.email.as_deref(), phone, source)
        .await?;

    Ok(())
}
