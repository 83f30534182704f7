use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{ConfigError, EngagementConfig, OrchestratorOptions};
use crate::db;
use crate::directory::Directory;
use crate::effects::conversations::DbConversationService;
use crate::effects::email::{DisabledEmailSender, HttpEmailSender};
use crate::effects::moderation::{AllowAllModerator, HttpContentModerator};
use crate::effects::notifications::{DbNotificationSink, RealtimePublisher};
use crate::effects::{ContentModerator, ConversationService, Dispatcher, EmailSender, NotificationSink};
use crate::error::EngagementResult;
use crate::lifecycle::applications::{ApplicationLifecycle, StatusChange, Submission};
use crate::lifecycle::contracts::ContractLifecycle;
use crate::lifecycle::evaluations::EvaluationManager;
use crate::lifecycle::invitations::InvitationBridge;
use crate::models::applications::{
    self, ApplicationContentPatch, ApplicationStats, ApplicationStatus, ApplicationView,
    NewApplication,
};
use crate::models::contracts::{self, ContractStatus, ContractTermsPatch, NewContract};
use crate::models::evaluations::{
    self, EvaluationEligibility, EvaluationPatch, NewEvaluation, PartyType, RatingSummary,
};
use crate::models::invitations::{self, InvitationAcceptance, NewInvitation};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// External services the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub notifications: Arc<dyn NotificationSink>,
    pub email: Arc<dyn EmailSender>,
    pub conversations: Arc<dyn ConversationService>,
    pub moderator: Arc<dyn ContentModerator>,
}

/// Entry point of the engagement core: every operation callers may invoke.
#[derive(Clone)]
pub struct EngagementOrchestrator {
    applications: ApplicationLifecycle,
    contracts: ContractLifecycle,
    evaluations: EvaluationManager,
    invitations: InvitationBridge,
    directory: Directory,
}

impl EngagementOrchestrator {
    pub fn new(
        db: DatabaseConnection,
        collaborators: Collaborators,
        options: OrchestratorOptions,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            collaborators.notifications,
            collaborators.email,
            collaborators.conversations,
            options.dispatch_timeout,
        ));

        let applications = ApplicationLifecycle::new(db.clone(), dispatcher.clone());
        let contracts = ContractLifecycle::new(db.clone(), dispatcher.clone());
        let evaluations = EvaluationManager::new(
            db.clone(),
            dispatcher.clone(),
            collaborators.moderator,
            options.dispatch_timeout,
        );
        let invitations = InvitationBridge::new(db.clone(), dispatcher, applications.clone());
        let directory = Directory::new(db, options.directory_cache_ttl);

        Self {
            applications,
            contracts,
            evaluations,
            invitations,
            directory,
        }
    }

    /// Connect to the store, apply pending migrations and wire the concrete collaborators.
    pub async fn bootstrap(config: &EngagementConfig) -> Result<Self, BootstrapError> {
        let db = db::create_pool(&config.database_url).await?;
        Migrator::up(&db, None).await?;
        tracing::info!("database migrations applied");

        let realtime = match &config.redis_url {
            Some(url) => {
                let publisher = RealtimePublisher::new(url).await?;
                tracing::info!("connected to redis for realtime notifications");
                Some(publisher)
            }
            None => None,
        };

        let email: Arc<dyn EmailSender> = match &config.email {
            Some(email) => Arc::new(HttpEmailSender::new(&email.api_url, &email.api_key, &email.from)),
            None => {
                tracing::warn!("EMAIL_API_URL not set, emails are disabled");
                Arc::new(DisabledEmailSender)
            }
        };

        let moderator: Arc<dyn ContentModerator> = match &config.moderation_url {
            Some(url) => Arc::new(HttpContentModerator::new(url)),
            None => Arc::new(AllowAllModerator),
        };

        let collaborators = Collaborators {
            notifications: Arc::new(DbNotificationSink::new(db.clone(), realtime)),
            email,
            conversations: Arc::new(DbConversationService::new(db.clone())),
            moderator,
        };

        Ok(Self::new(db, collaborators, config.options))
    }

    /// [`Self::bootstrap`] with configuration read from the environment (and `.env`).
    pub async fn from_env() -> Result<Self, BootstrapError> {
        let config = EngagementConfig::from_env()?;
        Self::bootstrap(&config).await
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    // ── Applications ──

    pub async fn create_application(&self, input: NewApplication) -> EngagementResult<ApplicationView> {
        let submission = self.applications.create_application(input).await?;
        Ok(self.directory.application_view(submission.into_application()).await)
    }

    /// Like [`Self::create_application`] but tells whether a dead application was reused.
    pub async fn submit_application(&self, input: NewApplication) -> EngagementResult<Submission> {
        self.applications.create_application(input).await
    }

    pub async fn withdraw_application(
        &self,
        application_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<applications::Model> {
        self.applications
            .withdraw_application(application_id, freelance_id)
            .await
    }

    pub async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
        response_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> EngagementResult<StatusChange> {
        self.applications
            .update_application_status(application_id, status, response_date)
            .await
    }

    /// Shorthand for the company accepting an application.
    pub async fn accept_application(&self, application_id: Uuid) -> EngagementResult<StatusChange> {
        self.update_application_status(application_id, ApplicationStatus::Accepted, None)
            .await
    }

    pub async fn update_application_content(
        &self,
        application_id: Uuid,
        patch: ApplicationContentPatch,
        freelance_id: Uuid,
    ) -> EngagementResult<applications::Model> {
        self.applications
            .update_application_content(application_id, patch, freelance_id)
            .await
    }

    pub async fn get_application(&self, application_id: Uuid) -> EngagementResult<ApplicationView> {
        let application = self.applications.get_application(application_id).await?;
        Ok(self.directory.application_view(application).await)
    }

    pub async fn list_project_applications(
        &self,
        project_id: Uuid,
    ) -> EngagementResult<Vec<ApplicationView>> {
        let rows = self.applications.list_project_applications(project_id).await?;
        Ok(self.directory.application_views(rows).await)
    }

    pub async fn list_freelance_applications(
        &self,
        freelance_id: Uuid,
    ) -> EngagementResult<Vec<ApplicationView>> {
        let rows = self.applications.list_freelance_applications(freelance_id).await?;
        Ok(self.directory.application_views(rows).await)
    }

    pub async fn delete_application(&self, application_id: Uuid) -> EngagementResult<()> {
        self.applications.delete_application(application_id).await
    }

    pub async fn application_stats(&self, project_id: Option<Uuid>) -> EngagementResult<ApplicationStats> {
        self.applications.application_stats(project_id).await
    }

    // ── Contracts ──

    pub async fn create_contract(&self, input: NewContract) -> EngagementResult<contracts::Model> {
        self.contracts.create_contract(input).await
    }

    pub async fn transition_contract(
        &self,
        contract_id: Uuid,
        status: ContractStatus,
    ) -> EngagementResult<contracts::Model> {
        self.contracts.update_contract_status(contract_id, status).await
    }

    pub async fn update_contract_terms(
        &self,
        contract_id: Uuid,
        patch: ContractTermsPatch,
    ) -> EngagementResult<contracts::Model> {
        self.contracts.update_contract_terms(contract_id, patch).await
    }

    pub async fn get_contract(&self, contract_id: Uuid) -> EngagementResult<contracts::Model> {
        self.contracts.get_contract(contract_id).await
    }

    pub async fn list_contracts_for_party(
        &self,
        party_id: Uuid,
    ) -> EngagementResult<Vec<contracts::Model>> {
        self.contracts.list_contracts_for_party(party_id).await
    }

    // ── Evaluations ──

    pub async fn create_evaluation(&self, input: NewEvaluation) -> EngagementResult<evaluations::Model> {
        self.evaluations.create_evaluation(input).await
    }

    pub async fn update_evaluation(
        &self,
        evaluation_id: Uuid,
        actor_id: Uuid,
        actor_type: PartyType,
        patch: EvaluationPatch,
    ) -> EngagementResult<evaluations::Model> {
        self.evaluations
            .update_evaluation(evaluation_id, actor_id, actor_type, patch)
            .await
    }

    pub async fn delete_evaluation(
        &self,
        evaluation_id: Uuid,
        actor_id: Uuid,
        actor_type: PartyType,
    ) -> EngagementResult<()> {
        self.evaluations
            .delete_evaluation(evaluation_id, actor_id, actor_type)
            .await
    }

    pub async fn can_user_evaluate(
        &self,
        contract_id: Uuid,
        evaluator_id: Uuid,
        evaluator_type: PartyType,
    ) -> EngagementResult<EvaluationEligibility> {
        self.evaluations
            .can_user_evaluate(contract_id, evaluator_id, evaluator_type)
            .await
    }

    pub async fn list_evaluations_for_user(
        &self,
        user_id: Uuid,
    ) -> EngagementResult<Vec<evaluations::Model>> {
        self.evaluations.list_evaluations_for_user(user_id).await
    }

    pub async fn user_rating_summary(&self, user_id: Uuid) -> EngagementResult<RatingSummary> {
        self.evaluations.rating_summary(user_id).await
    }

    // ── Invitations ──

    pub async fn send_invitation(&self, input: NewInvitation) -> EngagementResult<invitations::Model> {
        self.invitations.send_invitation(input).await
    }

    pub async fn mark_invitation_viewed(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        self.invitations
            .mark_invitation_viewed(invitation_id, freelance_id)
            .await
    }

    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<InvitationAcceptance> {
        self.invitations
            .accept_invitation(invitation_id, freelance_id)
            .await
    }

    pub async fn decline_invitation(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        self.invitations
            .decline_invitation(invitation_id, freelance_id)
            .await
    }

    pub async fn get_invitation(&self, invitation_id: Uuid) -> EngagementResult<invitations::Model> {
        self.invitations.get_invitation(invitation_id).await
    }

    pub async fn expire_invitations(&self) -> EngagementResult<u64> {
        self.invitations.expire_invitations().await
    }
}
