use sea_orm::*;
use uuid::Uuid;

use crate::models::notifications::{self, NotificationDraft};
use crate::models::user_notifications;

/// Persist a notification (not yet addressed to anyone).
pub async fn insert_notification<C: ConnectionTrait>(
    db: &C,
    draft: NotificationDraft,
) -> Result<notifications::Model, DbErr> {
    let new_notification = notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(draft.title),
        message: Set(draft.message),
        kind: Set(draft.kind),
        metadata: Set(draft.metadata),
        created_at: Set(chrono::Utc::now()),
    };

    new_notification.insert(db).await
}

/// Address a notification to a user. Linking twice is a no-op.
///
/// Returns `true` when a new link was written.
pub async fn link_to_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    notification_id: Uuid,
) -> Result<bool, DbErr> {
    let existing = user_notifications::Entity::find()
        .filter(user_notifications::Column::UserId.eq(user_id))
        .filter(user_notifications::Column::NotificationId.eq(notification_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let link = user_notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        notification_id: Set(notification_id),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
    };

    match link.insert(db).await {
        Ok(_) => Ok(true),
        // Lost a race against an identical link.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Notifications addressed to a user, newest first.
pub async fn get_notifications_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Vec<notifications::Model>, DbErr> {
    notifications::Entity::find()
        .inner_join(user_notifications::Entity)
        .filter(user_notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .all(db)
        .await
}
