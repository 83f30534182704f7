use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::applications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "viewed")]
    Viewed,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl InvitationStatus {
    /// Statuses a freelance can still answer.
    pub const PENDING: [InvitationStatus; 2] = [InvitationStatus::Sent, InvitationStatus::Viewed];

    pub fn is_pending(self) -> bool {
        Self::PENDING.contains(&self)
    }
}

/// SeaORM entity for the `project_invitations` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    pub company_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub sent_at: DateTimeUtc,
    pub responded_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvitation {
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    pub company_id: Uuid,
    pub message: Option<String>,
    pub expires_at: Option<DateTimeUtc>,
}

/// Result of accepting an invitation: the answered invitation and the
/// candidacy it produced (or reused).
#[derive(Debug, Clone, Serialize)]
pub struct InvitationAcceptance {
    pub invitation: Model,
    pub application: applications::Model,
    pub application_created: bool,
}
