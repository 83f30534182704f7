use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which side of a contract a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    #[sea_orm(string_value = "freelance")]
    Freelance,
    #[sea_orm(string_value = "company")]
    Company,
}

impl PartyType {
    pub fn counterpart(self) -> PartyType {
        match self {
            PartyType::Freelance => PartyType::Company,
            PartyType::Company => PartyType::Freelance,
        }
    }
}

/// SeaORM entity for the `evaluations` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contract_id: Uuid,
    pub evaluator_id: Uuid,
    pub evaluated_id: Uuid,
    pub evaluator_type: PartyType,
    pub evaluated_type: PartyType,
    pub rating: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contracts::Entity",
        from = "Column::ContractId",
        to = "super::contracts::Column::Id"
    )]
    Contract,
}

impl Related<super::contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contract.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvaluation {
    pub contract_id: Uuid,
    pub evaluator_id: Uuid,
    pub evaluated_id: Uuid,
    pub evaluator_type: PartyType,
    pub evaluated_type: PartyType,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationPatch {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// The other party of a contract, as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetUser {
    pub id: Uuid,
    pub party_type: PartyType,
    pub display_name: String,
}

/// Answer of the eligibility check clients run before showing the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationEligibility {
    pub can_evaluate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user: Option<TargetUser>,
}

impl EvaluationEligibility {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            can_evaluate: false,
            reason: Some(reason.into()),
            target_user: None,
        }
    }

    pub fn granted(target_user: TargetUser) -> Self {
        Self {
            can_evaluate: true,
            reason: None,
            target_user: Some(target_user),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub user_id: Uuid,
    pub count: u64,
    pub average: Option<f64>,
}
