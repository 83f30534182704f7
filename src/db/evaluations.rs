use sea_orm::*;
use uuid::Uuid;

use crate::models::evaluations::{self, EvaluationPatch, NewEvaluation};

/// Insert a new evaluation.
pub async fn insert_evaluation<C: ConnectionTrait>(
    db: &C,
    input: NewEvaluation,
) -> Result<evaluations::Model, DbErr> {
    let now = chrono::Utc::now();
    let new_evaluation = evaluations::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_id: Set(input.contract_id),
        evaluator_id: Set(input.evaluator_id),
        evaluated_id: Set(input.evaluated_id),
        evaluator_type: Set(input.evaluator_type),
        evaluated_type: Set(input.evaluated_type),
        rating: Set(input.rating),
        comment: Set(input.comment),
        created_at: Set(now),
        updated_at: Set(now),
    };

    new_evaluation.insert(db).await
}

/// Fetch a single evaluation by ID.
pub async fn get_evaluation_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<evaluations::Model>, DbErr> {
    evaluations::Entity::find_by_id(id).one(db).await
}

pub async fn find_by_contract_and_evaluator<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    evaluator_id: Uuid,
) -> Result<Option<evaluations::Model>, DbErr> {
    evaluations::Entity::find()
        .filter(evaluations::Column::ContractId.eq(contract_id))
        .filter(evaluations::Column::EvaluatorId.eq(evaluator_id))
        .one(db)
        .await
}

/// Evaluations received by a user, newest first.
pub async fn get_evaluations_for_user<C: ConnectionTrait>(
    db: &C,
    evaluated_id: Uuid,
) -> Result<Vec<evaluations::Model>, DbErr> {
    evaluations::Entity::find()
        .filter(evaluations::Column::EvaluatedId.eq(evaluated_id))
        .order_by_desc(evaluations::Column::CreatedAt)
        .all(db)
        .await
}

/// Update rating and/or comment of an evaluation.
pub async fn update_evaluation<C: ConnectionTrait>(
    db: &C,
    evaluation: evaluations::Model,
    patch: EvaluationPatch,
) -> Result<evaluations::Model, DbErr> {
    let mut active: evaluations::ActiveModel = evaluation.into();

    if let Some(rating) = patch.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = patch.comment {
        active.comment = Set(Some(comment));
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await
}

/// Delete an evaluation by ID.
pub async fn delete_evaluation<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<DeleteResult, DbErr> {
    evaluations::Entity::delete_by_id(id).exec(db).await
}

/// `(count, sum of ratings)` of the evaluations a user received.
pub async fn rating_totals<C: ConnectionTrait>(
    db: &C,
    evaluated_id: Uuid,
) -> Result<(i64, Option<i64>), DbErr> {
    let totals = evaluations::Entity::find()
        .select_only()
        .column_as(evaluations::Column::Id.count(), "count")
        .column_as(evaluations::Column::Rating.sum(), "sum")
        .filter(evaluations::Column::EvaluatedId.eq(evaluated_id))
        .into_tuple::<(i64, Option<i64>)>()
        .one(db)
        .await?;

    Ok(totals.unwrap_or((0, None)))
}
