//! Shared fixtures for the integration tests: a migrated SQLite database per
//! test and in-memory fakes for the external collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use engagement_core::config::OrchestratorOptions;
use engagement_core::db::create_pool;
use engagement_core::effects::{
    ContentModerator, ConversationService, DispatchError, EmailMessage, EmailSender,
    ModerationVerdict, NotificationSink,
};
use engagement_core::models::applications::NewApplication;
use engagement_core::models::conversations::{self, ConversationKey};
use engagement_core::models::notifications::{self, NotificationDraft, NotificationKind};
use engagement_core::models::{companies, freelances, projects};
use engagement_core::{Collaborators, EngagementOrchestrator};

/// Fresh database file under the temp dir, migrated to the latest schema.
pub async fn test_db() -> DatabaseConnection {
    engagement_core::telemetry::init_tracing();
    let path = std::env::temp_dir().join(format!("engagement-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = create_pool(&url).await.expect("Failed to open test database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

// ── Fakes ──

#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub metadata: serde_json::Value,
}

#[derive(Default)]
pub struct RecordingSink {
    drafts: Mutex<Vec<notifications::Model>>,
    delivered: Mutex<Vec<Delivered>>,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_to(&self, user_id: Uuid) -> Vec<NotificationKind> {
        self.delivered()
            .into_iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.kind)
            .collect()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.delivered().iter().filter(|d| d.kind == kind).count()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<notifications::Model, DispatchError> {
        let notification = notifications::Model {
            id: Uuid::new_v4(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            metadata: draft.metadata,
            created_at: Utc::now(),
        };
        self.drafts.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn link_to_user(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), DispatchError> {
        let drafts = self.drafts.lock().unwrap();
        let notification = drafts
            .iter()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| DispatchError::Transport("unknown notification".to_string()))?;
        self.delivered.lock().unwrap().push(Delivered {
            user_id,
            kind: notification.kind,
            metadata: notification.metadata.clone(),
        });
        Ok(())
    }
}

/// Sink that always fails, or hangs past any reasonable timeout.
pub enum BrokenSink {
    Failing,
    Hanging,
}

#[async_trait]
impl NotificationSink for BrokenSink {
    async fn create_notification(
        &self,
        _draft: NotificationDraft,
    ) -> Result<notifications::Model, DispatchError> {
        match self {
            BrokenSink::Failing => Err(DispatchError::Transport("sink unavailable".to_string())),
            BrokenSink::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(DispatchError::Transport("unreachable".to_string()))
            }
        }
    }

    async fn link_to_user(&self, _user_id: Uuid, _notification_id: Uuid) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("sink unavailable".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn templates_sent_to(&self, email: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == email)
            .map(|m| m.template)
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// How a conversation service misbehaves.
#[derive(Clone, Copy)]
pub enum Outage {
    Failing,
    Hanging,
}

#[derive(Default)]
pub struct RecordingConversations {
    opened: Mutex<Vec<conversations::Model>>,
    outage: Option<Outage>,
}

impl RecordingConversations {
    pub fn broken(outage: Outage) -> Self {
        Self {
            opened: Mutex::default(),
            outage: Some(outage),
        }
    }

    pub fn opened(&self) -> Vec<conversations::Model> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationService for RecordingConversations {
    async fn create_or_get(&self, key: ConversationKey) -> Result<conversations::Model, DispatchError> {
        match self.outage {
            Some(Outage::Failing) => {
                return Err(DispatchError::Transport("messaging unavailable".to_string()));
            }
            Some(Outage::Hanging) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return Err(DispatchError::Transport("unreachable".to_string()));
            }
            None => {}
        }

        let mut opened = self.opened.lock().unwrap();
        if let Some(existing) = opened.iter().find(|c| {
            c.freelance_id == key.freelance_id
                && c.company_id == key.company_id
                && c.application_id == key.application_id
        }) {
            return Ok(existing.clone());
        }
        let conversation = conversations::Model {
            id: Uuid::new_v4(),
            freelance_id: key.freelance_id,
            company_id: key.company_id,
            application_id: key.application_id,
            created_at: Utc::now(),
        };
        opened.push(conversation.clone());
        Ok(conversation)
    }
}

/// Rejects any text containing one of its banned words.
pub struct KeywordModerator {
    banned: Vec<&'static str>,
    unavailable: bool,
}

impl KeywordModerator {
    pub fn banning(banned: Vec<&'static str>) -> Self {
        Self {
            banned,
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            banned: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl ContentModerator for KeywordModerator {
    async fn check(&self, text: &str) -> Result<ModerationVerdict, DispatchError> {
        if self.unavailable {
            return Err(DispatchError::Transport("moderation down".to_string()));
        }
        match self.banned.iter().find(|word| text.contains(*word)) {
            Some(word) => Ok(ModerationVerdict {
                is_appropriate: false,
                reason: Some(format!("contains \"{word}\"")),
            }),
            None => Ok(ModerationVerdict::approved()),
        }
    }
}

// ── Harness ──

pub struct Harness {
    pub db: DatabaseConnection,
    pub core: EngagementOrchestrator,
    pub sink: Arc<RecordingSink>,
    pub mailer: Arc<RecordingMailer>,
    pub conversations: Arc<RecordingConversations>,
}

pub fn fast_options() -> OrchestratorOptions {
    OrchestratorOptions {
        dispatch_timeout: Duration::from_millis(200),
        ..OrchestratorOptions::default()
    }
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_moderator(Arc::new(KeywordModerator::banning(vec!["scam"]))).await
    }

    pub async fn with_moderator(moderator: Arc<dyn ContentModerator>) -> Self {
        Self::build(moderator, RecordingConversations::default()).await
    }

    pub async fn with_conversations(conversations: RecordingConversations) -> Self {
        Self::build(Arc::new(KeywordModerator::banning(vec!["scam"])), conversations).await
    }

    async fn build(
        moderator: Arc<dyn ContentModerator>,
        conversations: RecordingConversations,
    ) -> Self {
        let db = test_db().await;
        let sink = Arc::new(RecordingSink::default());
        let mailer = Arc::new(RecordingMailer::default());
        let conversations = Arc::new(conversations);
        let collaborators = Collaborators {
            notifications: sink.clone(),
            email: mailer.clone(),
            conversations: conversations.clone(),
            moderator,
        };
        let core = EngagementOrchestrator::new(db.clone(), collaborators, fast_options());
        Self {
            db,
            core,
            sink,
            mailer,
            conversations,
        }
    }
}

// ── Seed data ──

pub async fn seed_company(db: &DatabaseConnection, name: &str) -> companies::Model {
    companies::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(format!("{}-{}@company.test", name.to_lowercase(), Uuid::new_v4())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed company")
}

pub async fn seed_freelance(db: &DatabaseConnection, first_name: &str) -> freelances::Model {
    freelances::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name.to_string()),
        last_name: Set("Martin".to_string()),
        email: Set(format!("{}-{}@freelance.test", first_name.to_lowercase(), Uuid::new_v4())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed freelance")
}

pub async fn seed_project(
    db: &DatabaseConnection,
    company: &companies::Model,
    allow_multiple_hires: bool,
) -> projects::Model {
    projects::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company.id),
        title: Set("Rust backend rewrite".to_string()),
        description: Set("Port the billing service".to_string()),
        allow_multiple_hires: Set(allow_multiple_hires),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed project")
}

pub fn application_for(project: &projects::Model, freelance: &freelances::Model) -> NewApplication {
    NewApplication {
        project_id: project.id,
        freelance_id: freelance.id,
        proposed_rate: 550.0,
        cover_letter: "Five years of async Rust in production.".to_string(),
    }
}

/// A project with `freelance`'s application already accepted, ready for a contract.
pub async fn accepted_engagement(
    h: &Harness,
) -> (
    companies::Model,
    projects::Model,
    freelances::Model,
    engagement_core::models::applications::Model,
) {
    let company = seed_company(&h.db, "Acme").await;
    let project = seed_project(&h.db, &company, false).await;
    let freelance = seed_freelance(&h.db, "Alice").await;
    let application = h
        .core
        .create_application(application_for(&project, &freelance))
        .await
        .expect("Failed to submit application")
        .application;
    let change = h
        .core
        .accept_application(application.id)
        .await
        .expect("Failed to accept application");
    (company, project, freelance, change.application)
}

pub fn contract_for(
    application: &engagement_core::models::applications::Model,
    company: &companies::Model,
) -> engagement_core::models::contracts::NewContract {
    engagement_core::models::contracts::NewContract {
        application_id: application.id,
        project_id: application.project_id,
        freelance_id: application.freelance_id,
        company_id: company.id,
        payment_mode: engagement_core::models::contracts::PaymentMode::DailyRate,
        total_amount: None,
        tjm: Some(550.0),
        estimated_days: Some(20),
        terms: Some("Net 30".to_string()),
        start_date: None,
        end_date: None,
        status: None,
    }
}

/// Contract between the seeded company and freelance, walked up to `Completed`.
pub async fn completed_contract(
    h: &Harness,
) -> (
    companies::Model,
    freelances::Model,
    engagement_core::models::contracts::Model,
) {
    use engagement_core::models::contracts::ContractStatus;

    let (company, _project, freelance, application) = accepted_engagement(h).await;
    let contract = h
        .core
        .create_contract(contract_for(&application, &company))
        .await
        .expect("Failed to create contract");
    for status in [
        ContractStatus::Pending,
        ContractStatus::Active,
        ContractStatus::Completed,
    ] {
        h.core
            .transition_contract(contract.id, status)
            .await
            .expect("Failed to move contract forward");
    }
    let contract = h.core.get_contract(contract.id).await.expect("Contract vanished");
    (company, freelance, contract)
}
