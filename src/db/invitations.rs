use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::invitations::{self, InvitationStatus, NewInvitation};

/// Insert a new invitation in `Sent` status.
pub async fn insert_invitation<C: ConnectionTrait>(
    db: &C,
    input: NewInvitation,
) -> Result<invitations::Model, DbErr> {
    let new_invitation = invitations::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(input.project_id),
        freelance_id: Set(input.freelance_id),
        company_id: Set(input.company_id),
        message: Set(input.message),
        status: Set(InvitationStatus::Sent),
        sent_at: Set(chrono::Utc::now()),
        responded_at: Set(None),
        expires_at: Set(input.expires_at),
    };

    new_invitation.insert(db).await
}

/// Fetch a single invitation by ID.
pub async fn get_invitation_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find_by_id(id).one(db).await
}

pub async fn find_invitation<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    freelance_id: Uuid,
    company_id: Uuid,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find()
        .filter(invitations::Column::ProjectId.eq(project_id))
        .filter(invitations::Column::FreelanceId.eq(freelance_id))
        .filter(invitations::Column::CompanyId.eq(company_id))
        .one(db)
        .await
}

/// Set `next` only if the invitation is still in one of `expected`.
pub async fn transition_status<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: &[InvitationStatus],
    next: InvitationStatus,
    responded_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Option<invitations::Model>, DbErr> {
    let result = invitations::Entity::update_many()
        .col_expr(invitations::Column::Status, Expr::value(next))
        .col_expr(invitations::Column::RespondedAt, Expr::value(responded_at))
        .filter(invitations::Column::Id.eq(id))
        .filter(invitations::Column::Status.is_in(expected.iter().copied()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_invitation_by_id(db, id).await
}

/// Mark every unanswered invitation whose deadline passed as `Expired`.
pub async fn expire_overdue<C: ConnectionTrait>(
    db: &C,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u64, DbErr> {
    let result = invitations::Entity::update_many()
        .col_expr(
            invitations::Column::Status,
            Expr::value(InvitationStatus::Expired),
        )
        .filter(invitations::Column::Status.is_in(InvitationStatus::PENDING))
        .filter(invitations::Column::ExpiresAt.is_not_null())
        .filter(invitations::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
