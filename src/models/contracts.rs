use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the freelance is paid under a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    #[sea_orm(string_value = "fixed_price")]
    FixedPrice,
    #[sea_orm(string_value = "daily_rate")]
    DailyRate,
    #[sea_orm(string_value = "by_milestone")]
    ByMilestone,
}

/// Contract status stored as a lowercase string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl ContractStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ContractStatus::Completed | ContractStatus::Cancelled)
    }
}

/// SeaORM entity for the `contracts` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub application_id: Uuid,
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    pub company_id: Uuid,
    pub payment_mode: PaymentMode,
    #[sea_orm(column_type = "Double", nullable)]
    pub total_amount: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub tjm: Option<f64>,
    pub estimated_days: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub status: ContractStatus,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::applications::Entity",
        from = "Column::ApplicationId",
        to = "super::applications::Column::Id"
    )]
    Application,
    #[sea_orm(
        belongs_to = "super::freelances::Entity",
        from = "Column::FreelanceId",
        to = "super::freelances::Column::Id"
    )]
    Freelance,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Company,
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Application.def()
    }
}

impl Related<super::freelances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Freelance.def()
    }
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct NewContract {
    pub application_id: Uuid,
    pub project_id: Uuid,
    pub freelance_id: Uuid,
    pub company_id: Uuid,
    pub payment_mode: PaymentMode,
    pub total_amount: Option<f64>,
    pub tjm: Option<f64>,
    pub estimated_days: Option<i32>,
    pub terms: Option<String>,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    /// Defaults to `Draft` when absent.
    pub status: Option<ContractStatus>,
}

/// Editable commercial terms of a contract that has not started yet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractTermsPatch {
    pub total_amount: Option<f64>,
    pub tjm: Option<f64>,
    pub estimated_days: Option<i32>,
    pub terms: Option<String>,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
}
