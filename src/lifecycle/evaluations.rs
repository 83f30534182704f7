use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{require_company, require_freelance};
use crate::db::{contracts as contract_db, evaluations as evaluation_db};
use crate::effects::{ContentModerator, Dispatcher, Notice, Recipient};
use crate::error::{EngagementError, EngagementResult};
use crate::models::contracts::{self, ContractStatus};
use crate::models::evaluations::{
    self, EvaluationEligibility, EvaluationPatch, NewEvaluation, PartyType, RatingSummary,
    TargetUser,
};
use crate::models::notifications::NotificationKind;

/// How long an author may edit their evaluation.
pub fn edit_window() -> TimeDelta {
    TimeDelta::days(7)
}

/// How long an author may delete their evaluation.
pub fn delete_window() -> TimeDelta {
    TimeDelta::hours(24)
}

pub fn window_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now - created_at > window
}

fn ensure_rating(rating: i32) -> EngagementResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(EngagementError::validation("rating must be an integer between 1 and 5"));
    }
    Ok(())
}

/// The contract party on `side`.
fn party_id(contract: &contracts::Model, side: PartyType) -> Uuid {
    match side {
        PartyType::Freelance => contract.freelance_id,
        PartyType::Company => contract.company_id,
    }
}

/// Owns evaluation eligibility and the author's edit/delete windows.
#[derive(Clone)]
pub struct EvaluationManager {
    db: DatabaseConnection,
    dispatcher: Arc<Dispatcher>,
    moderator: Arc<dyn ContentModerator>,
    moderation_timeout: Duration,
}

impl EvaluationManager {
    pub fn new(
        db: DatabaseConnection,
        dispatcher: Arc<Dispatcher>,
        moderator: Arc<dyn ContentModerator>,
        moderation_timeout: Duration,
    ) -> Self {
        Self {
            db,
            dispatcher,
            moderator,
            moderation_timeout,
        }
    }

    pub async fn create_evaluation(&self, input: NewEvaluation) -> EngagementResult<evaluations::Model> {
        ensure_rating(input.rating)?;

        let contract = contract_db::get_contract_by_id(&self.db, input.contract_id)
            .await?
            .ok_or(EngagementError::not_found("Contract", input.contract_id))?;

        if contract.status != ContractStatus::Completed {
            return Err(EngagementError::conflict(
                "A contract can only be evaluated once it is completed",
            ));
        }

        if input.evaluator_id == input.evaluated_id || input.evaluator_type == input.evaluated_type {
            return Err(EngagementError::validation("You cannot evaluate yourself"));
        }
        if party_id(&contract, input.evaluator_type) != input.evaluator_id
            || party_id(&contract, input.evaluated_type) != input.evaluated_id
        {
            return Err(EngagementError::validation(
                "Evaluator and evaluated must be the two parties of the contract",
            ));
        }

        if evaluation_db::find_by_contract_and_evaluator(&self.db, contract.id, input.evaluator_id)
            .await?
            .is_some()
        {
            return Err(EngagementError::conflict("You have already evaluated this contract"));
        }

        self.require_party(input.evaluator_type, input.evaluator_id).await?;
        let evaluated = self
            .require_party(input.evaluated_type, input.evaluated_id)
            .await?;

        if let Some(comment) = &input.comment {
            self.moderate(comment).await?;
        }

        let evaluation = evaluation_db::insert_evaluation(&self.db, input).await?;
        tracing::info!(
            evaluation_id = %evaluation.id,
            contract_id = %evaluation.contract_id,
            rating = evaluation.rating,
            "evaluation created"
        );

        let notice = Notice::new(
            NotificationKind::EvaluationReceived,
            "New evaluation",
            format!("You received a {}/5 evaluation", evaluation.rating),
            serde_json::json!({
                "evaluation_id": evaluation.id,
                "contract_id": evaluation.contract_id,
            }),
        );
        self.dispatcher.notify(&evaluated, notice).await;

        Ok(evaluation)
    }

    pub async fn update_evaluation(
        &self,
        evaluation_id: Uuid,
        actor_id: Uuid,
        actor_type: PartyType,
        patch: EvaluationPatch,
    ) -> EngagementResult<evaluations::Model> {
        if patch.rating.is_none() && patch.comment.is_none() {
            return Err(EngagementError::validation("Nothing to update"));
        }
        if let Some(rating) = patch.rating {
            ensure_rating(rating)?;
        }

        let evaluation = self.authored(evaluation_id, actor_id, actor_type).await?;
        if window_expired(evaluation.created_at, Utc::now(), edit_window()) {
            return Err(EngagementError::conflict(
                "The editing window has expired (7 days after creation)",
            ));
        }

        if let Some(comment) = &patch.comment {
            self.moderate(comment).await?;
        }

        let updated = evaluation_db::update_evaluation(&self.db, evaluation, patch).await?;
        tracing::info!(%evaluation_id, "evaluation updated");
        Ok(updated)
    }

    pub async fn delete_evaluation(
        &self,
        evaluation_id: Uuid,
        actor_id: Uuid,
        actor_type: PartyType,
    ) -> EngagementResult<()> {
        let evaluation = self.authored(evaluation_id, actor_id, actor_type).await?;
        if window_expired(evaluation.created_at, Utc::now(), delete_window()) {
            return Err(EngagementError::conflict(
                "The deletion window has expired (24 hours after creation)",
            ));
        }

        let result = evaluation_db::delete_evaluation(&self.db, evaluation_id).await?;
        if result.rows_affected == 0 {
            return Err(EngagementError::not_found("Evaluation", evaluation_id));
        }
        tracing::info!(%evaluation_id, "evaluation deleted");
        Ok(())
    }

    /// Side-effect free version of the `create_evaluation` preconditions.
    pub async fn can_user_evaluate(
        &self,
        contract_id: Uuid,
        evaluator_id: Uuid,
        evaluator_type: PartyType,
    ) -> EngagementResult<EvaluationEligibility> {
        let contract = contract_db::get_contract_by_id(&self.db, contract_id)
            .await?
            .ok_or(EngagementError::not_found("Contract", contract_id))?;

        if contract.status != ContractStatus::Completed {
            return Ok(EvaluationEligibility::denied(
                "The contract must be completed before it can be evaluated",
            ));
        }
        if party_id(&contract, evaluator_type) != evaluator_id {
            return Ok(EvaluationEligibility::denied("You are not a party to this contract"));
        }
        if evaluation_db::find_by_contract_and_evaluator(&self.db, contract_id, evaluator_id)
            .await?
            .is_some()
        {
            return Ok(EvaluationEligibility::denied(
                "You have already evaluated this contract",
            ));
        }

        let target_type = evaluator_type.counterpart();
        let target_id = party_id(&contract, target_type);
        let target = match self.require_party(target_type, target_id).await {
            Ok(target) => target,
            Err(EngagementError::NotFound { .. }) => {
                return Ok(EvaluationEligibility::denied(
                    "The other party of this contract no longer exists",
                ));
            }
            Err(e) => return Err(e),
        };

        Ok(EvaluationEligibility::granted(TargetUser {
            id: target_id,
            party_type: target_type,
            display_name: target.name,
        }))
    }

    pub async fn list_evaluations_for_user(
        &self,
        user_id: Uuid,
    ) -> EngagementResult<Vec<evaluations::Model>> {
        Ok(evaluation_db::get_evaluations_for_user(&self.db, user_id).await?)
    }

    pub async fn rating_summary(&self, user_id: Uuid) -> EngagementResult<RatingSummary> {
        let (count, sum) = evaluation_db::rating_totals(&self.db, user_id).await?;
        let average = match (count, sum) {
            (count, Some(sum)) if count > 0 => Some(sum as f64 / count as f64),
            _ => None,
        };
        Ok(RatingSummary {
            user_id,
            count: count.max(0) as u64,
            average,
        })
    }

    async fn authored(
        &self,
        evaluation_id: Uuid,
        actor_id: Uuid,
        actor_type: PartyType,
    ) -> EngagementResult<evaluations::Model> {
        let evaluation = evaluation_db::get_evaluation_by_id(&self.db, evaluation_id)
            .await?
            .ok_or(EngagementError::not_found("Evaluation", evaluation_id))?;

        if evaluation.evaluator_id != actor_id || evaluation.evaluator_type != actor_type {
            return Err(EngagementError::unauthorized(
                "Only the author of an evaluation can change it",
            ));
        }
        Ok(evaluation)
    }

    async fn require_party(&self, side: PartyType, id: Uuid) -> EngagementResult<Recipient> {
        match side {
            PartyType::Freelance => Ok(Recipient::from(&require_freelance(&self.db, id).await?)),
            PartyType::Company => Ok(Recipient::from(&require_company(&self.db, id).await?)),
        }
    }

    /// Reject text the moderation service flags. An unreachable service does
    /// not block evaluations; the comment is accepted and the failure logged.
    async fn moderate(&self, text: &str) -> EngagementResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        match tokio::time::timeout(self.moderation_timeout, self.moderator.check(text)).await {
            Ok(Ok(verdict)) if verdict.is_appropriate => Ok(()),
            Ok(Ok(verdict)) => Err(EngagementError::validation(
                verdict
                    .reason
                    .unwrap_or_else(|| "The comment was rejected by moderation".to_string()),
            )),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "moderation unavailable, accepting comment");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.moderation_timeout, "moderation timed out, accepting comment");
                Ok(())
            }
        }
    }
}
