use async_trait::async_trait;
use sea_orm::{DatabaseConnection, SqlErr};

use super::{ConversationService, DispatchError};
use crate::db::conversations as conversation_db;
use crate::models::conversations::{ConversationKey, Model};

/// Conversation service backed by the `conversations` table.
#[derive(Clone)]
pub struct DbConversationService {
    db: DatabaseConnection,
}

impl DbConversationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationService for DbConversationService {
    async fn create_or_get(&self, key: ConversationKey) -> Result<Model, DispatchError> {
        if let Some(existing) = conversation_db::find_conversation(&self.db, key).await? {
            return Ok(existing);
        }

        let conversation = match conversation_db::insert_conversation(&self.db, key).await {
            Ok(conversation) => conversation,
            // Another caller opened it between the lookup and the insert.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return conversation_db::find_conversation(&self.db, key)
                    .await?
                    .ok_or(DispatchError::Database(e));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            conversation_id = %conversation.id,
            freelance_id = %key.freelance_id,
            company_id = %key.company_id,
            "conversation opened"
        );
        Ok(conversation)
    }
}
