use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::{company_recipient, ensure_amount, freelance_recipient, require_company, require_freelance};
use crate::db::{applications as application_db, contracts as contract_db, projects as project_db};
use crate::effects::email::templates;
use crate::effects::{Dispatcher, Notice, Recipient};
use crate::error::{EngagementError, EngagementResult};
use crate::models::applications::ApplicationStatus;
use crate::models::contracts::{self, ContractStatus, ContractTermsPatch, NewContract};
use crate::models::notifications::NotificationKind;

/// Which contract party a transition notice goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Company,
    Freelance,
    BothParties,
}

/// Notice owed for a contract status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionNotice {
    pub audience: Audience,
    pub kind: NotificationKind,
    pub template: &'static str,
    pub title: &'static str,
}

/// Notification policy of contract status changes, keyed by the (old, new) pair.
pub fn transition_notice(old: ContractStatus, new: ContractStatus) -> Option<TransitionNotice> {
    use ContractStatus::*;
    let notice = match (old, new) {
        (Pending, Active) => TransitionNotice {
            audience: Audience::Company,
            kind: NotificationKind::ContractAccepted,
            template: templates::CONTRACT_ACCEPTED,
            title: "Contract accepted",
        },
        (Pending, Cancelled) => TransitionNotice {
            audience: Audience::Company,
            kind: NotificationKind::ContractRejected,
            template: templates::CONTRACT_REJECTED,
            title: "Contract rejected",
        },
        (Active, Completed) => TransitionNotice {
            audience: Audience::BothParties,
            kind: NotificationKind::ContractCompleted,
            template: templates::CONTRACT_COMPLETED,
            title: "Contract completed",
        },
        (Draft, Pending) => TransitionNotice {
            audience: Audience::Freelance,
            kind: NotificationKind::ContractUpdated,
            template: templates::CONTRACT_UPDATED,
            title: "Contract updated",
        },
        _ => return None,
    };
    Some(notice)
}

/// Statuses in which the commercial terms may still change.
const EDITABLE: [ContractStatus; 2] = [ContractStatus::Draft, ContractStatus::Pending];

/// Owns the contract state machine.
#[derive(Clone)]
pub struct ContractLifecycle {
    db: DatabaseConnection,
    dispatcher: Arc<Dispatcher>,
}

impl ContractLifecycle {
    pub fn new(db: DatabaseConnection, dispatcher: Arc<Dispatcher>) -> Self {
        Self { db, dispatcher }
    }

    /// Create the contract of an accepted application and propose it to the freelance.
    pub async fn create_contract(&self, input: NewContract) -> EngagementResult<contracts::Model> {
        ensure_amount("total_amount", input.total_amount)?;
        ensure_amount("tjm", input.tjm)?;
        if input.estimated_days.is_some_and(|days| days < 0) {
            return Err(EngagementError::validation("estimated_days must be non-negative"));
        }

        let project = project_db::get_project_by_id(&self.db, input.project_id)
            .await?
            .ok_or(EngagementError::not_found("Project", input.project_id))?;
        let freelance = require_freelance(&self.db, input.freelance_id).await?;
        require_company(&self.db, input.company_id).await?;

        let application = application_db::get_application_by_id(&self.db, input.application_id)
            .await?
            .ok_or(EngagementError::not_found("Application", input.application_id))?;

        if application.project_id != project.id
            || application.freelance_id != freelance.id
            || project.company_id != input.company_id
        {
            return Err(EngagementError::validation(
                "Application, project, freelance and company do not belong together",
            ));
        }
        if application.status != ApplicationStatus::Accepted {
            return Err(EngagementError::conflict(
                "A contract can only be created for an accepted application",
            ));
        }
        if contract_db::get_contract_by_application(&self.db, application.id)
            .await?
            .is_some()
        {
            return Err(EngagementError::conflict(
                "A contract already exists for this application",
            ));
        }

        let contract = contract_db::insert_contract(&self.db, input).await?;
        tracing::info!(
            contract_id = %contract.id,
            application_id = %contract.application_id,
            status = ?contract.status,
            "contract created"
        );

        let notice = Notice::new(
            NotificationKind::ContractProposed,
            "New contract proposal",
            format!("You received a contract proposal for \"{}\"", project.title),
            serde_json::json!({
                "contract_id": contract.id,
                "project_id": project.id,
            }),
        )
        .with_email(
            templates::CONTRACT_PROPOSED,
            serde_json::json!({
                "project_title": project.title,
                "payment_mode": contract.payment_mode,
                "total_amount": contract.total_amount,
                "tjm": contract.tjm,
            }),
        );
        self.dispatcher
            .notify(&Recipient::from(&freelance), notice)
            .await;

        Ok(contract)
    }

    /// Move a contract to `next`; who hears about it depends on where it came from.
    pub async fn update_contract_status(
        &self,
        contract_id: Uuid,
        next: ContractStatus,
    ) -> EngagementResult<contracts::Model> {
        let contract = self.get_contract(contract_id).await?;
        let previous = contract.status;

        let updated = contract_db::transition_status(&self.db, contract_id, previous, next)
            .await?
            .ok_or_else(|| EngagementError::conflict("The contract was modified concurrently"))?;

        tracing::info!(
            %contract_id,
            from = ?previous,
            to = ?next,
            "contract status updated"
        );

        if let Some(policy) = transition_notice(previous, next) {
            self.announce(&updated, policy).await;
        }

        Ok(updated)
    }

    /// Change the commercial terms of a contract that is still a draft or pending.
    pub async fn update_contract_terms(
        &self,
        contract_id: Uuid,
        patch: ContractTermsPatch,
    ) -> EngagementResult<contracts::Model> {
        ensure_amount("total_amount", patch.total_amount)?;
        ensure_amount("tjm", patch.tjm)?;
        if patch.estimated_days.is_some_and(|days| days < 0) {
            return Err(EngagementError::validation("estimated_days must be non-negative"));
        }
        if patch.total_amount.is_none()
            && patch.tjm.is_none()
            && patch.estimated_days.is_none()
            && patch.terms.is_none()
            && patch.start_date.is_none()
            && patch.end_date.is_none()
        {
            return Err(EngagementError::validation("Nothing to update"));
        }

        let contract = self.get_contract(contract_id).await?;
        if !EDITABLE.contains(&contract.status) {
            return Err(EngagementError::conflict(
                "Only draft or pending contracts can be edited",
            ));
        }

        let updated = contract_db::update_terms(&self.db, contract_id, &EDITABLE, patch)
            .await?
            .ok_or_else(|| EngagementError::conflict("The contract is no longer editable"))?;

        tracing::info!(%contract_id, "contract terms updated");
        Ok(updated)
    }

    pub async fn get_contract(&self, contract_id: Uuid) -> EngagementResult<contracts::Model> {
        contract_db::get_contract_by_id(&self.db, contract_id)
            .await?
            .ok_or(EngagementError::not_found("Contract", contract_id))
    }

    pub async fn list_contracts_for_party(
        &self,
        party_id: Uuid,
    ) -> EngagementResult<Vec<contracts::Model>> {
        Ok(contract_db::get_contracts_for_party(&self.db, party_id).await?)
    }

    async fn announce(&self, contract: &contracts::Model, policy: TransitionNotice) {
        let project_title = match project_db::get_project_by_id(&self.db, contract.project_id).await {
            Ok(Some(project)) => project.title,
            _ => "your project".to_string(),
        };

        let mut recipients = Vec::with_capacity(2);
        if matches!(policy.audience, Audience::Company | Audience::BothParties) {
            recipients.extend(company_recipient(&self.db, contract.company_id).await);
        }
        if matches!(policy.audience, Audience::Freelance | Audience::BothParties) {
            recipients.extend(freelance_recipient(&self.db, contract.freelance_id).await);
        }

        let notices = recipients
            .into_iter()
            .map(|recipient| {
                let notice = Notice::new(
                    policy.kind,
                    policy.title,
                    format!("{} for \"{}\"", policy.title, project_title),
                    serde_json::json!({
                        "contract_id": contract.id,
                        "project_id": contract.project_id,
                        "status": contract.status,
                    }),
                )
                .with_email(
                    policy.template,
                    serde_json::json!({
                        "recipient_name": recipient.name,
                        "project_title": project_title,
                    }),
                );
                (recipient, notice)
            })
            .collect();

        self.dispatcher.notify_all(notices).await;
    }
}
