//! Best-effort side effects: in-app notifications, emails and conversations.
//!
//! Every collaborator call runs under the dispatcher's timeout. Failures are
//! logged and swallowed; they never change the outcome of the state write that
//! triggered them.

pub mod conversations;
pub mod email;
pub mod moderation;
pub mod notifications;

use async_trait::async_trait;
use futures_util::future::{join, join_all};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::companies;
use crate::models::conversations::{self as conversation_model, ConversationKey};
use crate::models::freelances;
use crate::models::notifications::{self as notification_model, NotificationDraft, NotificationKind};

/// Failure of a best-effort collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Realtime channel error: {0}")]
    Realtime(#[from] redis::RedisError),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<notification_model::Model, DispatchError>;

    /// Address a notification to a user. Must be idempotent.
    async fn link_to_user(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn create_or_get(
        &self,
        key: ConversationKey,
    ) -> Result<conversation_model::Model, DispatchError>;
}

/// Verdict of the content moderation service on a piece of free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub is_appropriate: bool,
    pub reason: Option<String>,
}

impl ModerationVerdict {
    pub fn approved() -> Self {
        Self {
            is_appropriate: true,
            reason: None,
        }
    }
}

#[async_trait]
pub trait ContentModerator: Send + Sync {
    async fn check(&self, text: &str) -> Result<ModerationVerdict, DispatchError>;
}

/// A templated email ready for the email provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub template: String,
    pub args: serde_json::Value,
}

/// Who a notice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&freelances::Model> for Recipient {
    fn from(m: &freelances::Model) -> Self {
        Self {
            user_id: m.id,
            email: m.email.clone(),
            name: m.full_name(),
        }
    }
}

impl From<&companies::Model> for Recipient {
    fn from(m: &companies::Model) -> Self {
        Self {
            user_id: m.id,
            email: m.email.clone(),
            name: m.name.clone(),
        }
    }
}

/// One user-facing event: an in-app notification and, optionally, an email.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub draft: NotificationDraft,
    pub email: Option<(&'static str, serde_json::Value)>,
}

impl Notice {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            draft: NotificationDraft {
                title: title.into(),
                message: message.into(),
                kind,
                metadata,
            },
            email: None,
        }
    }

    pub fn with_email(mut self, template: &'static str, args: serde_json::Value) -> Self {
        self.email = Some((template, args));
        self
    }
}

/// Fans notices out to the notification sink and the email sender.
pub struct Dispatcher {
    notifications: Arc<dyn NotificationSink>,
    email: Arc<dyn EmailSender>,
    conversations: Arc<dyn ConversationService>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationSink>,
        email: Arc<dyn EmailSender>,
        conversations: Arc<dyn ConversationService>,
        timeout: Duration,
    ) -> Self {
        Self {
            notifications,
            email,
            conversations,
            timeout,
        }
    }

    /// Deliver `notice` to `recipient`. Returns whether every channel succeeded.
    pub async fn notify(&self, recipient: &Recipient, notice: Notice) -> bool {
        let kind = notice.draft.kind;
        let in_app = self.bounded("notification", self.deliver_in_app(recipient.user_id, notice.draft));
        let email = async {
            match notice.email {
                Some((template, args)) => {
                    let message = EmailMessage {
                        to: recipient.email.clone(),
                        template: template.to_string(),
                        args,
                    };
                    self.bounded("email", self.email.send(message)).await
                }
                None => Ok(()),
            }
        };

        let (in_app, email) = join(in_app, email).await;
        let mut delivered = true;
        if let Err(e) = in_app {
            tracing::warn!(user_id = %recipient.user_id, ?kind, error = %e, "in-app notification failed");
            delivered = false;
        }
        if let Err(e) = email {
            tracing::warn!(user_id = %recipient.user_id, ?kind, error = %e, "email notification failed");
            delivered = false;
        }
        delivered
    }

    /// Deliver several notices concurrently; returns how many fully succeeded.
    pub async fn notify_all(&self, notices: Vec<(Recipient, Notice)>) -> usize {
        let deliveries = notices
            .into_iter()
            .map(|(recipient, notice)| async move { self.notify(&recipient, notice).await });
        join_all(deliveries).await.into_iter().filter(|ok| *ok).count()
    }

    /// Open (or reuse) the conversation for `key`; `None` if the service failed.
    pub async fn open_conversation(&self, key: ConversationKey) -> Option<conversation_model::Model> {
        match self
            .bounded("conversation", self.conversations.create_or_get(key))
            .await
        {
            Ok(conversation) => Some(conversation),
            Err(e) => {
                tracing::warn!(
                    freelance_id = %key.freelance_id,
                    company_id = %key.company_id,
                    error = %e,
                    "could not open conversation"
                );
                None
            }
        }
    }

    async fn deliver_in_app(&self, user_id: Uuid, draft: NotificationDraft) -> Result<(), DispatchError> {
        let notification = self.notifications.create_notification(draft).await?;
        self.notifications
            .link_to_user(user_id, notification.id)
            .await
    }

    async fn bounded<T, F>(&self, label: &'static str, fut: F) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, DispatchError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| DispatchError::Timeout(label, self.timeout))?
    }
}
