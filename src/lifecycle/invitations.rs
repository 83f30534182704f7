use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::applications::{ApplicationLifecycle, Submission};
use super::{company_recipient, require_company, require_freelance};
use crate::db::{invitations as invitation_db, projects as project_db};
use crate::effects::email::templates;
use crate::effects::{Dispatcher, Notice, Recipient};
use crate::error::{EngagementError, EngagementResult};
use crate::models::applications::{self, NewApplication};
use crate::models::invitations::{self, InvitationAcceptance, InvitationStatus, NewInvitation};
use crate::models::notifications::NotificationKind;

/// Turns company invitations into applications.
#[derive(Clone)]
pub struct InvitationBridge {
    db: DatabaseConnection,
    dispatcher: Arc<Dispatcher>,
    applications: ApplicationLifecycle,
}

impl InvitationBridge {
    pub fn new(
        db: DatabaseConnection,
        dispatcher: Arc<Dispatcher>,
        applications: ApplicationLifecycle,
    ) -> Self {
        Self {
            db,
            dispatcher,
            applications,
        }
    }

    /// A company invites a freelance to apply to one of its projects.
    pub async fn send_invitation(&self, input: NewInvitation) -> EngagementResult<invitations::Model> {
        if input.expires_at.is_some_and(|expires_at| expires_at <= Utc::now()) {
            return Err(EngagementError::validation("expires_at must be in the future"));
        }

        let project = project_db::get_project_by_id(&self.db, input.project_id)
            .await?
            .ok_or(EngagementError::not_found("Project", input.project_id))?;
        let company = require_company(&self.db, input.company_id).await?;
        if project.company_id != company.id {
            return Err(EngagementError::unauthorized(
                "Only the company owning the project can invite freelances to it",
            ));
        }
        let freelance = require_freelance(&self.db, input.freelance_id).await?;

        if invitation_db::find_invitation(&self.db, project.id, freelance.id, company.id)
            .await?
            .is_some()
        {
            return Err(EngagementError::conflict(
                "This freelance has already been invited to the project",
            ));
        }

        let invitation = invitation_db::insert_invitation(&self.db, input).await?;
        tracing::info!(
            invitation_id = %invitation.id,
            project_id = %project.id,
            freelance_id = %freelance.id,
            "invitation sent"
        );

        let notice = Notice::new(
            NotificationKind::InvitationReceived,
            "Project invitation",
            format!("{} invited you to apply to \"{}\"", company.name, project.title),
            serde_json::json!({
                "invitation_id": invitation.id,
                "project_id": project.id,
                "company_id": company.id,
            }),
        )
        .with_email(
            templates::PROJECT_INVITATION,
            serde_json::json!({
                "company_name": company.name,
                "project_title": project.title,
                "message": invitation.message,
            }),
        );
        self.dispatcher
            .notify(&Recipient::from(&freelance), notice)
            .await;

        Ok(invitation)
    }

    /// Record that the freelance opened the invitation.
    pub async fn mark_invitation_viewed(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        let invitation = self.addressed_to(invitation_id, freelance_id).await?;
        match invitation.status {
            InvitationStatus::Viewed => Ok(invitation),
            InvitationStatus::Sent => invitation_db::transition_status(
                &self.db,
                invitation_id,
                &[InvitationStatus::Sent],
                InvitationStatus::Viewed,
                None,
            )
            .await?
            .ok_or_else(|| EngagementError::conflict("The invitation was answered concurrently")),
            status => Err(EngagementError::conflict(format!(
                "The invitation has already been answered ({status:?})"
            ))),
        }
    }

    /// Accept an invitation and make sure the freelance has an open application.
    ///
    /// If the application cannot be created the invitation is put back to
    /// `Sent` and the application error is returned.
    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<InvitationAcceptance> {
        let invitation = self.answerable(invitation_id, freelance_id).await?;

        let accepted = invitation_db::transition_status(
            &self.db,
            invitation_id,
            &InvitationStatus::PENDING,
            InvitationStatus::Accepted,
            Some(Utc::now()),
        )
        .await?
        .ok_or_else(|| EngagementError::conflict("The invitation was answered concurrently"))?;

        let (application, application_created) = match self.candidacy_for(&accepted).await {
            Ok(candidacy) => candidacy,
            Err(e) => {
                self.restore_sent(invitation_id).await;
                return Err(e);
            }
        };

        tracing::info!(
            %invitation_id,
            application_id = %application.id,
            application_created,
            "invitation accepted"
        );

        if let Some(company) = company_recipient(&self.db, invitation.company_id).await {
            let message = if application_created {
                "Your invitation was accepted and an application was created automatically"
            } else {
                "Your invitation was accepted"
            };
            let notice = Notice::new(
                NotificationKind::InvitationAccepted,
                "Invitation accepted",
                message,
                serde_json::json!({
                    "invitation_id": accepted.id,
                    "project_id": accepted.project_id,
                    "freelance_id": accepted.freelance_id,
                    "application_id": application.id,
                    "application_created": application_created,
                }),
            );
            self.dispatcher.notify(&company, notice).await;
        }

        Ok(InvitationAcceptance {
            invitation: accepted,
            application,
            application_created,
        })
    }

    pub async fn decline_invitation(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        let invitation = self.answerable(invitation_id, freelance_id).await?;

        let declined = invitation_db::transition_status(
            &self.db,
            invitation_id,
            &InvitationStatus::PENDING,
            InvitationStatus::Declined,
            Some(Utc::now()),
        )
        .await?
        .ok_or_else(|| EngagementError::conflict("The invitation was answered concurrently"))?;

        tracing::info!(%invitation_id, "invitation declined");

        if let Some(company) = company_recipient(&self.db, invitation.company_id).await {
            let notice = Notice::new(
                NotificationKind::InvitationDeclined,
                "Invitation declined",
                "A freelance declined your invitation",
                serde_json::json!({
                    "invitation_id": declined.id,
                    "project_id": declined.project_id,
                    "freelance_id": declined.freelance_id,
                }),
            );
            self.dispatcher.notify(&company, notice).await;
        }

        Ok(declined)
    }

    /// Mark every unanswered invitation past its deadline as expired.
    pub async fn expire_invitations(&self) -> EngagementResult<u64> {
        let expired = invitation_db::expire_overdue(&self.db, Utc::now()).await?;
        if expired > 0 {
            tracing::info!(expired, "invitations expired");
        }
        Ok(expired)
    }

    pub async fn get_invitation(&self, invitation_id: Uuid) -> EngagementResult<invitations::Model> {
        invitation_db::get_invitation_by_id(&self.db, invitation_id)
            .await?
            .ok_or(EngagementError::not_found("Invitation", invitation_id))
    }

    async fn addressed_to(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        let invitation = self.get_invitation(invitation_id).await?;
        if invitation.freelance_id != freelance_id {
            return Err(EngagementError::unauthorized(
                "This invitation was sent to another freelance",
            ));
        }
        Ok(invitation)
    }

    /// Invitation the freelance may still accept or decline.
    async fn answerable(
        &self,
        invitation_id: Uuid,
        freelance_id: Uuid,
    ) -> EngagementResult<invitations::Model> {
        let invitation = self.addressed_to(invitation_id, freelance_id).await?;
        if !invitation.status.is_pending() {
            return Err(EngagementError::conflict(format!(
                "The invitation has already been answered ({:?})",
                invitation.status
            )));
        }
        if invitation.is_expired_at(Utc::now()) {
            return Err(EngagementError::conflict("The invitation has expired"));
        }
        Ok(invitation)
    }

    /// The freelance's application on the invited project. An open or
    /// accepted one is returned as is. A rejected or withdrawn one is reopened
    /// with its own rate and cover letter. Only when none exists is a
    /// placeholder submitted. The flag tells whether a new row was created.
    async fn candidacy_for(
        &self,
        invitation: &invitations::Model,
    ) -> EngagementResult<(applications::Model, bool)> {
        let existing = self
            .applications
            .find_for_freelance_and_project(invitation.freelance_id, invitation.project_id)
            .await?;

        let input = match existing {
            Some(current) if !current.status.is_reopenable() => return Ok((current, false)),
            Some(current) => NewApplication {
                project_id: current.project_id,
                freelance_id: current.freelance_id,
                proposed_rate: current.proposed_rate,
                cover_letter: current.cover_letter,
            },
            None => NewApplication {
                project_id: invitation.project_id,
                freelance_id: invitation.freelance_id,
                proposed_rate: 0.0,
                cover_letter: "Application created automatically after accepting the project invitation."
                    .to_string(),
            },
        };

        let submission = self.applications.create_application(input).await?;
        let created = matches!(submission, Submission::Created(_));
        Ok((submission.into_application(), created))
    }

    async fn restore_sent(&self, invitation_id: Uuid) {
        match invitation_db::transition_status(
            &self.db,
            invitation_id,
            &[InvitationStatus::Accepted],
            InvitationStatus::Sent,
            None,
        )
        .await
        {
            Ok(Some(_)) => {
                tracing::warn!(%invitation_id, "application creation failed, invitation reverted to sent");
            }
            Ok(None) => {
                tracing::error!(%invitation_id, "could not revert invitation: it changed in the meantime");
            }
            Err(e) => {
                tracing::error!(%invitation_id, error = %e, "could not revert invitation");
            }
        }
    }
}
