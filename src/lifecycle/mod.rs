//! State machines of the engagement entities and the rules tying them together.

pub mod applications;
pub mod contracts;
pub mod evaluations;
pub mod invitations;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::{companies as company_db, freelances as freelance_db};
use crate::effects::Recipient;
use crate::error::{EngagementError, EngagementResult};
use crate::models::{companies, freelances};

pub(crate) async fn require_freelance(
    db: &DatabaseConnection,
    id: Uuid,
) -> EngagementResult<freelances::Model> {
    freelance_db::get_freelance_by_id(db, id)
        .await?
        .ok_or(EngagementError::not_found("Freelance", id))
}

pub(crate) async fn require_company(
    db: &DatabaseConnection,
    id: Uuid,
) -> EngagementResult<companies::Model> {
    company_db::get_company_by_id(db, id)
        .await?
        .ok_or(EngagementError::not_found("Company", id))
}

/// Look up a freelance only to address a notice. The state write already
/// happened, so a failed read is logged instead of failing the operation.
pub(crate) async fn freelance_recipient(db: &DatabaseConnection, id: Uuid) -> Option<Recipient> {
    match freelance_db::get_freelance_by_id(db, id).await {
        Ok(Some(freelance)) => Some(Recipient::from(&freelance)),
        Ok(None) => {
            tracing::warn!(freelance_id = %id, "notice skipped: freelance no longer exists");
            None
        }
        Err(e) => {
            tracing::warn!(freelance_id = %id, error = %e, "notice skipped: freelance lookup failed");
            None
        }
    }
}

pub(crate) async fn company_recipient(db: &DatabaseConnection, id: Uuid) -> Option<Recipient> {
    match company_db::get_company_by_id(db, id).await {
        Ok(Some(company)) => Some(Recipient::from(&company)),
        Ok(None) => {
            tracing::warn!(company_id = %id, "notice skipped: company no longer exists");
            None
        }
        Err(e) => {
            tracing::warn!(company_id = %id, error = %e, "notice skipped: company lookup failed");
            None
        }
    }
}

pub(crate) fn ensure_amount(field: &str, value: Option<f64>) -> EngagementResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(EngagementError::validation(format!(
            "{field} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}
