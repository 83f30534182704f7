use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of in-app notification, used by clients to pick an icon and a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[sea_orm(string_value = "application_received")]
    ApplicationReceived,
    #[sea_orm(string_value = "application_withdrawn")]
    ApplicationWithdrawn,
    #[sea_orm(string_value = "application_accepted")]
    ApplicationAccepted,
    #[sea_orm(string_value = "application_rejected")]
    ApplicationRejected,
    #[sea_orm(string_value = "application_auto_rejected")]
    ApplicationAutoRejected,
    #[sea_orm(string_value = "contract_proposed")]
    ContractProposed,
    #[sea_orm(string_value = "contract_updated")]
    ContractUpdated,
    #[sea_orm(string_value = "contract_accepted")]
    ContractAccepted,
    #[sea_orm(string_value = "contract_rejected")]
    ContractRejected,
    #[sea_orm(string_value = "contract_completed")]
    ContractCompleted,
    #[sea_orm(string_value = "evaluation_received")]
    EvaluationReceived,
    #[sea_orm(string_value = "invitation_received")]
    InvitationReceived,
    #[sea_orm(string_value = "invitation_accepted")]
    InvitationAccepted,
    #[sea_orm(string_value = "invitation_declined")]
    InvitationDeclined,
}

/// SeaORM entity for the `notifications` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub kind: NotificationKind,
    pub metadata: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_notifications::Entity")]
    UserNotifications,
}

impl Related<super::user_notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserNotifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Notification content before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub metadata: serde_json::Value,
}
