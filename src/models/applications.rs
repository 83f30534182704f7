use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::freelances::FreelanceSummary;
use super::projects::ProjectSummary;

/// Application status stored as a lowercase string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "withdrawn")]
    Withdrawn,
}

impl ApplicationStatus {
    /// Statuses that block a new submission for the same (freelance, project).
    pub const ACTIVE: [ApplicationStatus; 3] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Accepted,
    ];

    /// Statuses a resubmission may reactivate in place.
    pub const REOPENABLE: [ApplicationStatus; 2] =
        [ApplicationStatus::Rejected, ApplicationStatus::Withdrawn];

    /// Statuses still waiting on a company decision.
    pub const OPEN: [ApplicationStatus; 2] =
        [ApplicationStatus::Submitted, ApplicationStatus::UnderReview];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_reopenable(self) -> bool {
        Self::REOPENABLE.contains(&self)
    }

    /// Whether `updateApplicationStatus` may move an application from `self` to `next`.
    ///
    /// Decided applications (accepted, rejected, withdrawn) only come back to life
    /// through a resubmission, never through a status update.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (_, Submitted) => false,
            (Submitted, UnderReview | Accepted | Rejected | Withdrawn) => true,
            (UnderReview, Accepted | Rejected | Withdrawn) => true,
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

/// SeaORM entity for the `applications` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    #[sea_orm(column_type = "Double")]
    pub proposed_rate: f64,
    #[sea_orm(column_type = "Text")]
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub submission_date: DateTimeUtc,
    pub response_date: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::freelances::Entity",
        from = "Column::FreelanceId",
        to = "super::freelances::Column::Id"
    )]
    Freelance,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::freelances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Freelance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    pub proposed_rate: f64,
    pub cover_letter: String,
}

/// Fields a freelance may edit while the application is still submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationContentPatch {
    pub proposed_rate: Option<f64>,
    pub cover_letter: Option<String>,
}

/// Application joined with the summaries clients display next to it.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Model,
    pub project: Option<ProjectSummary>,
    pub freelance: Option<FreelanceSummary>,
}

/// Application counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: u64,
    pub submitted: u64,
    pub under_review: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub withdrawn: u64,
}

impl ApplicationStats {
    pub fn record(&mut self, status: ApplicationStatus, count: u64) {
        self.total += count;
        match status {
            ApplicationStatus::Submitted => self.submitted += count,
            ApplicationStatus::UnderReview => self.under_review += count,
            ApplicationStatus::Accepted => self.accepted += count,
            ApplicationStatus::Rejected => self.rejected += count,
            ApplicationStatus::Withdrawn => self.withdrawn += count,
        }
    }
}
