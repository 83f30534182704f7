use sea_orm::*;
use uuid::Uuid;

use crate::models::conversations::{self, ConversationKey};

pub async fn find_conversation<C: ConnectionTrait>(
    db: &C,
    key: ConversationKey,
) -> Result<Option<conversations::Model>, DbErr> {
    let application_filter = match key.application_id {
        Some(application_id) => conversations::Column::ApplicationId.eq(application_id),
        None => conversations::Column::ApplicationId.is_null(),
    };

    conversations::Entity::find()
        .filter(conversations::Column::FreelanceId.eq(key.freelance_id))
        .filter(conversations::Column::CompanyId.eq(key.company_id))
        .filter(application_filter)
        .one(db)
        .await
}

pub async fn insert_conversation<C: ConnectionTrait>(
    db: &C,
    key: ConversationKey,
) -> Result<conversations::Model, DbErr> {
    let new_conversation = conversations::ActiveModel {
        id: Set(Uuid::new_v4()),
        freelance_id: Set(key.freelance_id),
        company_id: Set(key.company_id),
        application_id: Set(key.application_id),
        created_at: Set(chrono::Utc::now()),
    };

    new_conversation.insert(db).await
}
