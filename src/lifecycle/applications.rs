use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{company_recipient, ensure_amount, freelance_recipient, require_freelance};
use crate::db::{self, applications as application_db, projects as project_db};
use crate::effects::email::templates;
use crate::effects::{Dispatcher, Notice, Recipient};
use crate::error::{EngagementError, EngagementResult};
use crate::models::applications::{
    self, ApplicationContentPatch, ApplicationStats, ApplicationStatus, NewApplication,
};
use crate::models::conversations::{self, ConversationKey};
use crate::models::notifications::NotificationKind;
use crate::models::projects;

/// Outcome of a submission: a brand new row, or a dead one brought back.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Created(applications::Model),
    Reactivated(applications::Model),
}

impl Submission {
    pub fn application(&self) -> &applications::Model {
        match self {
            Submission::Created(m) | Submission::Reactivated(m) => m,
        }
    }

    pub fn into_application(self) -> applications::Model {
        match self {
            Submission::Created(m) | Submission::Reactivated(m) => m,
        }
    }
}

/// Result of `update_application_status`, including what the acceptance cascade did.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub application: applications::Model,
    /// Peers rejected because this application was accepted.
    pub auto_rejected: Vec<applications::Model>,
    pub conversation: Option<conversations::Model>,
}

/// Owns the application state machine.
#[derive(Clone)]
pub struct ApplicationLifecycle {
    db: DatabaseConnection,
    dispatcher: Arc<Dispatcher>,
}

impl ApplicationLifecycle {
    pub fn new(db: DatabaseConnection, dispatcher: Arc<Dispatcher>) -> Self {
        Self { db, dispatcher }
    }

    /// Submit an application, or reactivate the freelance's dead one on the same project.
    ///
    /// Only a first-time submission notifies the company.
    pub async fn create_application(&self, input: NewApplication) -> EngagementResult<Submission> {
        ensure_amount("proposed_rate", Some(input.proposed_rate))?;

        let project = project_db::get_project_by_id(&self.db, input.project_id)
            .await?
            .ok_or(EngagementError::not_found("Project", input.project_id))?;
        let freelance = require_freelance(&self.db, input.freelance_id).await?;

        let existing = application_db::find_latest_for_freelance_and_project(
            &self.db,
            input.freelance_id,
            input.project_id,
        )
        .await?;

        let submission = match existing {
            None => Submission::Created(application_db::insert_application(&self.db, input).await?),
            Some(current) if current.status == ApplicationStatus::Accepted => {
                return Err(EngagementError::conflict(
                    "Your application to this project has already been accepted",
                ));
            }
            Some(current) if current.status.is_active() => {
                return Err(EngagementError::conflict(
                    "You have already applied to this project",
                ));
            }
            Some(current) => {
                let reactivated = application_db::reactivate(
                    &self.db,
                    current.id,
                    input.proposed_rate,
                    input.cover_letter,
                )
                .await?
                .ok_or_else(|| {
                    EngagementError::conflict("The application was modified concurrently, please retry")
                })?;
                Submission::Reactivated(reactivated)
            }
        };

        match &submission {
            Submission::Created(application) => {
                tracing::info!(
                    application_id = %application.id,
                    project_id = %application.project_id,
                    freelance_id = %application.freelance_id,
                    "application submitted"
                );
                if let Some(company) = company_recipient(&self.db, project.company_id).await {
                    let notice = received_notice(application, &project, &Recipient::from(&freelance));
                    self.dispatcher.notify(&company, notice).await;
                }
            }
            Submission::Reactivated(application) => {
                tracing::info!(
                    application_id = %application.id,
                    project_id = %application.project_id,
                    freelance_id = %application.freelance_id,
                    "application reactivated"
                );
            }
        }

        Ok(submission)
    }

    /// Withdraw an open application on behalf of its freelance.
    pub async fn withdraw_application(
        &self,
        application_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<applications::Model> {
        let application = self.owned_application(application_id, freelance_id).await?;

        match application.status {
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => {
                return Err(EngagementError::conflict(
                    "Cannot withdraw an application that has been accepted or rejected",
                ));
            }
            ApplicationStatus::Withdrawn => {
                return Err(EngagementError::conflict("The application is already withdrawn"));
            }
            ApplicationStatus::Submitted | ApplicationStatus::UnderReview => {}
        }

        let withdrawn = application_db::transition_status(
            &self.db,
            application_id,
            &[application.status],
            ApplicationStatus::Withdrawn,
            Some(chrono::Utc::now()),
        )
        .await?
        .ok_or_else(|| EngagementError::conflict("The application was modified concurrently"))?;

        tracing::info!(application_id = %withdrawn.id, "application withdrawn");

        if let Some(project) = self.project_for_notice(withdrawn.project_id).await {
            if let Some(company) = company_recipient(&self.db, project.company_id).await {
                let notice = Notice::new(
                    NotificationKind::ApplicationWithdrawn,
                    "Application withdrawn",
                    format!("A freelance withdrew their application to \"{}\"", project.title),
                    serde_json::json!({
                        "application_id": withdrawn.id,
                        "project_id": project.id,
                        "freelance_id": withdrawn.freelance_id,
                    }),
                )
                .with_email(
                    templates::APPLICATION_WITHDRAWN,
                    serde_json::json!({ "project_title": project.title }),
                );
                self.dispatcher.notify(&company, notice).await;
            }
        }

        Ok(withdrawn)
    }

    /// Company-side decision on an application.
    ///
    /// Accepting on a project that allows a single hire fails with `Conflict`
    /// when another application is already accepted there. Otherwise it
    /// rejects every other open application in the same transaction, then
    /// opens the conversation and tells each rejected peer why.
    pub async fn update_application_status(
        &self,
        application_id: Uuid,
        next: ApplicationStatus,
        response_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> EngagementResult<StatusChange> {
        if next == ApplicationStatus::Submitted {
            return Err(EngagementError::validation(
                "SUBMITTED is not a valid target status",
            ));
        }

        let application = application_db::get_application_by_id(&self.db, application_id)
            .await?
            .ok_or(EngagementError::not_found("Application", application_id))?;

        if !application.status.can_transition_to(next) {
            return Err(EngagementError::conflict(format!(
                "Cannot move an application from {} to {}",
                application.status.label(),
                next.label()
            )));
        }

        let now = db::store_precision(chrono::Utc::now());
        let response_date = match next {
            ApplicationStatus::UnderReview => response_date,
            _ => Some(response_date.unwrap_or(now)),
        };

        let txn = self.db.begin().await?;
        // Every acceptance on the project queues behind this lock, so the
        // accepted-peer check and the cascade see a settled project.
        let project = project_db::lock_project_by_id(&txn, application.project_id)
            .await?
            .ok_or(EngagementError::not_found("Project", application.project_id))?;
        let cascade = next == ApplicationStatus::Accepted && !project.allow_multiple_hires;

        if cascade
            && application_db::find_accepted_peer(&txn, project.id, application_id)
                .await?
                .is_some()
        {
            return Err(EngagementError::conflict(
                "Another application has already been accepted on this project",
            ));
        }

        let updated = application_db::transition_status(
            &txn,
            application_id,
            &[application.status],
            next,
            response_date,
        )
        .await?
        .ok_or_else(|| EngagementError::conflict("The application was modified concurrently"))?;

        let auto_rejected = if cascade {
            application_db::reject_open_peers(&txn, project.id, application_id, now).await?
        } else {
            Vec::new()
        };
        txn.commit().await?;

        tracing::info!(
            application_id = %updated.id,
            status = next.label(),
            auto_rejected = auto_rejected.len(),
            "application status updated"
        );

        if let Some(notice) = decision_notice(&updated, &project) {
            if let Some(freelance) = freelance_recipient(&self.db, updated.freelance_id).await {
                self.dispatcher.notify(&freelance, notice).await;
            }
        }

        let mut conversation = None;
        if cascade {
            conversation = self
                .dispatcher
                .open_conversation(ConversationKey {
                    freelance_id: updated.freelance_id,
                    company_id: project.company_id,
                    application_id: Some(updated.id),
                })
                .await;

            let mut notices = Vec::with_capacity(auto_rejected.len());
            for peer in &auto_rejected {
                if let Some(recipient) = freelance_recipient(&self.db, peer.freelance_id).await {
                    notices.push((recipient, auto_rejected_notice(peer, &project)));
                }
            }
            let delivered = self.dispatcher.notify_all(notices).await;
            tracing::debug!(
                project_id = %project.id,
                delivered,
                peers = auto_rejected.len(),
                "auto-rejection notices dispatched"
            );
        }

        Ok(StatusChange {
            application: updated,
            auto_rejected,
            conversation,
        })
    }

    /// Edit rate and/or cover letter while the application is still submitted.
    pub async fn update_application_content(
        &self,
        application_id: Uuid,
        patch: ApplicationContentPatch,
        freelance_id: Uuid,
    ) -> EngagementResult<applications::Model> {
        if patch.proposed_rate.is_none() && patch.cover_letter.is_none() {
            return Err(EngagementError::validation("Nothing to update"));
        }
        ensure_amount("proposed_rate", patch.proposed_rate)?;

        let application = self.owned_application(application_id, freelance_id).await?;
        if application.status != ApplicationStatus::Submitted {
            return Err(EngagementError::conflict(format!(
                "Only submitted applications can be edited (current status: {})",
                application.status.label()
            )));
        }

        let updated = application_db::update_content(&self.db, application_id, patch)
            .await?
            .ok_or_else(|| {
                EngagementError::conflict("The application is no longer editable")
            })?;

        tracing::info!(application_id = %updated.id, "application content updated");
        Ok(updated)
    }

    pub async fn get_application(&self, application_id: Uuid) -> EngagementResult<applications::Model> {
        application_db::get_application_by_id(&self.db, application_id)
            .await?
            .ok_or(EngagementError::not_found("Application", application_id))
    }

    pub async fn find_for_freelance_and_project(
        &self,
        freelance_id: Uuid,
        project_id: Uuid,
    ) -> EngagementResult<Option<applications::Model>> {
        Ok(application_db::find_latest_for_freelance_and_project(&self.db, freelance_id, project_id)
            .await?)
    }

    pub async fn list_project_applications(
        &self,
        project_id: Uuid,
    ) -> EngagementResult<Vec<applications::Model>> {
        Ok(application_db::get_applications_by_project(&self.db, project_id).await?)
    }

    pub async fn list_freelance_applications(
        &self,
        freelance_id: Uuid,
    ) -> EngagementResult<Vec<applications::Model>> {
        Ok(application_db::get_applications_by_freelance(&self.db, freelance_id).await?)
    }

    /// Administrative hard delete.
    pub async fn delete_application(&self, application_id: Uuid) -> EngagementResult<()> {
        let result = application_db::delete_application(&self.db, application_id).await?;
        if result.rows_affected == 0 {
            return Err(EngagementError::not_found("Application", application_id));
        }
        tracing::info!(%application_id, "application deleted");
        Ok(())
    }

    pub async fn application_stats(&self, project_id: Option<Uuid>) -> EngagementResult<ApplicationStats> {
        let mut stats = ApplicationStats::default();
        for (status, count) in application_db::count_by_status(&self.db, project_id).await? {
            stats.record(status, count.max(0) as u64);
        }
        Ok(stats)
    }

    /// Fetch an application owned by `freelance_id`. Someone else's
    /// application is reported as missing so its existence does not leak.
    async fn owned_application(
        &self,
        application_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<applications::Model> {
        match application_db::get_application_by_id(&self.db, application_id).await? {
            Some(application) if application.freelance_id == freelance_id => Ok(application),
            _ => Err(EngagementError::not_found("Application", application_id)),
        }
    }

    async fn project_for_notice(&self, project_id: Uuid) -> Option<projects::Model> {
        match project_db::get_project_by_id(&self.db, project_id).await {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(%project_id, error = %e, "notice skipped: project lookup failed");
                None
            }
        }
    }
}

fn received_notice(
    application: &applications::Model,
    project: &projects::Model,
    freelance: &Recipient,
) -> Notice {
    Notice::new(
        NotificationKind::ApplicationReceived,
        "New application",
        format!("{} applied to \"{}\"", freelance.name, project.title),
        serde_json::json!({
            "application_id": application.id,
            "project_id": project.id,
            "freelance_id": application.freelance_id,
        }),
    )
    .with_email(
        templates::FREELANCE_APPLIED,
        serde_json::json!({
            "freelance_name": freelance.name,
            "project_title": project.title,
            "proposed_rate": application.proposed_rate,
        }),
    )
}

/// Notice sent to the freelance when the company decides; `None` for other moves.
fn decision_notice(application: &applications::Model, project: &projects::Model) -> Option<Notice> {
    let metadata = serde_json::json!({
        "application_id": application.id,
        "project_id": project.id,
    });
    let args = serde_json::json!({ "project_title": project.title });

    match application.status {
        ApplicationStatus::Accepted => Some(
            Notice::new(
                NotificationKind::ApplicationAccepted,
                "Application accepted",
                format!("Your application to \"{}\" has been accepted", project.title),
                metadata,
            )
            .with_email(templates::APPLICATION_ACCEPTED, args),
        ),
        ApplicationStatus::Rejected => Some(
            Notice::new(
                NotificationKind::ApplicationRejected,
                "Application rejected",
                format!("Your application to \"{}\" has been declined", project.title),
                metadata,
            )
            .with_email(templates::APPLICATION_REJECTED, args),
        ),
        _ => None,
    }
}

fn auto_rejected_notice(peer: &applications::Model, project: &projects::Model) -> Notice {
    Notice::new(
        NotificationKind::ApplicationAutoRejected,
        "Position filled",
        format!(
            "Another candidate was selected for \"{}\", so your application has been closed",
            project.title
        ),
        serde_json::json!({
            "application_id": peer.id,
            "project_id": project.id,
            "reason": "another_candidate_accepted",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(status: ApplicationStatus) -> applications::Model {
        applications::Model {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            freelance_id: Uuid::new_v4(),
            proposed_rate: 450.0,
            cover_letter: "Hello".to_string(),
            status,
            submission_date: chrono::Utc::now(),
            response_date: None,
        }
    }

    fn project() -> projects::Model {
        projects::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            title: "Data platform".to_string(),
            description: String::new(),
            allow_multiple_hires: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_decision_notice_only_for_accept_and_reject() {
        let project = project();
        assert!(decision_notice(&application(ApplicationStatus::UnderReview), &project).is_none());
        assert!(decision_notice(&application(ApplicationStatus::Withdrawn), &project).is_none());

        let accepted = decision_notice(&application(ApplicationStatus::Accepted), &project).unwrap();
        assert_eq!(accepted.draft.kind, NotificationKind::ApplicationAccepted);
        assert_eq!(accepted.email.unwrap().0, templates::APPLICATION_ACCEPTED);

        let rejected = decision_notice(&application(ApplicationStatus::Rejected), &project).unwrap();
        assert_eq!(rejected.draft.kind, NotificationKind::ApplicationRejected);
    }

    #[test]
    fn test_auto_rejected_notice_is_distinct_and_in_app_only() {
        let notice = auto_rejected_notice(&application(ApplicationStatus::Rejected), &project());
        assert_eq!(notice.draft.kind, NotificationKind::ApplicationAutoRejected);
        assert_eq!(notice.draft.metadata["reason"], "another_candidate_accepted");
        assert!(notice.email.is_none());
    }
}
