use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::contracts::{self, ContractStatus, ContractTermsPatch, NewContract};

/// Insert a new contract (defaults to Draft status).
pub async fn insert_contract<C: ConnectionTrait>(
    db: &C,
    input: NewContract,
) -> Result<contracts::Model, DbErr> {
    let new_contract = contracts::ActiveModel {
        id: Set(Uuid::new_v4()),
        application_id: Set(input.application_id),
        project_id: Set(input.project_id),
        freelance_id: Set(input.freelance_id),
        company_id: Set(input.company_id),
        payment_mode: Set(input.payment_mode),
        total_amount: Set(input.total_amount),
        tjm: Set(input.tjm),
        estimated_days: Set(input.estimated_days),
        terms: Set(input.terms),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        status: Set(input.status.unwrap_or(ContractStatus::Draft)),
        created_at: Set(chrono::Utc::now()),
    };

    new_contract.insert(db).await
}

/// Fetch a single contract by ID.
pub async fn get_contract_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<contracts::Model>, DbErr> {
    contracts::Entity::find_by_id(id).one(db).await
}

pub async fn get_contract_by_application<C: ConnectionTrait>(
    db: &C,
    application_id: Uuid,
) -> Result<Option<contracts::Model>, DbErr> {
    contracts::Entity::find()
        .filter(contracts::Column::ApplicationId.eq(application_id))
        .one(db)
        .await
}

/// Contracts where `party_id` is either the freelance or the company.
pub async fn get_contracts_for_party<C: ConnectionTrait>(
    db: &C,
    party_id: Uuid,
) -> Result<Vec<contracts::Model>, DbErr> {
    contracts::Entity::find()
        .filter(
            Condition::any()
                .add(contracts::Column::FreelanceId.eq(party_id))
                .add(contracts::Column::CompanyId.eq(party_id)),
        )
        .order_by_desc(contracts::Column::CreatedAt)
        .all(db)
        .await
}

/// Set `next` only if the contract is still in `expected`.
pub async fn transition_status<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: ContractStatus,
    next: ContractStatus,
) -> Result<Option<contracts::Model>, DbErr> {
    let result = contracts::Entity::update_many()
        .col_expr(contracts::Column::Status, Expr::value(next))
        .filter(contracts::Column::Id.eq(id))
        .filter(contracts::Column::Status.eq(expected))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_contract_by_id(db, id).await
}

/// Apply a terms patch while the contract is still in one of `editable`.
pub async fn update_terms<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    editable: &[ContractStatus],
    patch: ContractTermsPatch,
) -> Result<Option<contracts::Model>, DbErr> {
    let mut update = contracts::Entity::update_many()
        .filter(contracts::Column::Id.eq(id))
        .filter(contracts::Column::Status.is_in(editable.iter().copied()));

    if let Some(total_amount) = patch.total_amount {
        update = update.col_expr(contracts::Column::TotalAmount, Expr::value(Some(total_amount)));
    }
    if let Some(tjm) = patch.tjm {
        update = update.col_expr(contracts::Column::Tjm, Expr::value(Some(tjm)));
    }
    if let Some(estimated_days) = patch.estimated_days {
        update = update.col_expr(
            contracts::Column::EstimatedDays,
            Expr::value(Some(estimated_days)),
        );
    }
    if let Some(terms) = patch.terms {
        update = update.col_expr(contracts::Column::Terms, Expr::value(Some(terms)));
    }
    if let Some(start_date) = patch.start_date {
        update = update.col_expr(contracts::Column::StartDate, Expr::value(Some(start_date)));
    }
    if let Some(end_date) = patch.end_date {
        update = update.col_expr(contracts::Column::EndDate, Expr::value(Some(end_date)));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_contract_by_id(db, id).await
}
