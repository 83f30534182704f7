use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::{DispatchError, NotificationSink};
use crate::db::notifications as notification_db;
use crate::models::notifications::{Model, NotificationDraft};

/// Publishes "you have a new notification" pings on a per-user redis channel.
#[derive(Clone)]
pub struct RealtimePublisher {
    connection: ConnectionManager,
}

impl RealtimePublisher {
    pub async fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    /// Publish on `notifications:{user_id}`; returns the number of listeners.
    pub async fn publish(&self, user_id: Uuid, notification_id: Uuid) -> redis::RedisResult<i64> {
        let payload = serde_json::json!({
            "user_id": user_id,
            "notification_id": notification_id,
        });

        redis::cmd("PUBLISH")
            .arg(channel(user_id))
            .arg(payload.to_string())
            .query_async(&mut self.connection.clone())
            .await
    }
}

pub fn channel(user_id: Uuid) -> String {
    format!("notifications:{}", user_id)
}

/// Notification sink backed by the `notifications` / `user_notifications` tables.
#[derive(Clone)]
pub struct DbNotificationSink {
    db: DatabaseConnection,
    realtime: Option<RealtimePublisher>,
}

impl DbNotificationSink {
    pub fn new(db: DatabaseConnection, realtime: Option<RealtimePublisher>) -> Self {
        Self { db, realtime }
    }
}

#[async_trait]
impl NotificationSink for DbNotificationSink {
    async fn create_notification(&self, draft: NotificationDraft) -> Result<Model, DispatchError> {
        Ok(notification_db::insert_notification(&self.db, draft).await?)
    }

    async fn link_to_user(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), DispatchError> {
        let linked = notification_db::link_to_user(&self.db, user_id, notification_id).await?;

        if let (true, Some(realtime)) = (linked, &self.realtime) {
            // The stored link is what counts; a missed ping only delays the badge.
            if let Err(e) = realtime.publish(user_id, notification_id).await {
                tracing::debug!(%user_id, error = %e, "realtime publish failed");
            }
        }
        Ok(())
    }
}
