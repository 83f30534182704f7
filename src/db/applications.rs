use sea_orm::prelude::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::applications::{
    self, ApplicationContentPatch, ApplicationStatus, NewApplication,
};

/// Insert a new application in `Submitted` status.
pub async fn insert_application<C: ConnectionTrait>(
    db: &C,
    input: NewApplication,
) -> Result<applications::Model, DbErr> {
    let new_application = applications::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(input.project_id),
        freelance_id: Set(input.freelance_id),
        proposed_rate: Set(input.proposed_rate),
        cover_letter: Set(input.cover_letter),
        status: Set(ApplicationStatus::Submitted),
        submission_date: Set(chrono::Utc::now()),
        response_date: Set(None),
    };

    new_application.insert(db).await
}

/// Fetch a single application by ID.
pub async fn get_application_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<applications::Model>, DbErr> {
    applications::Entity::find_by_id(id).one(db).await
}

/// Most recent application a freelance submitted on a project.
pub async fn find_latest_for_freelance_and_project<C: ConnectionTrait>(
    db: &C,
    freelance_id: Uuid,
    project_id: Uuid,
) -> Result<Option<applications::Model>, DbErr> {
    applications::Entity::find()
        .filter(applications::Column::FreelanceId.eq(freelance_id))
        .filter(applications::Column::ProjectId.eq(project_id))
        .order_by_desc(applications::Column::SubmissionDate)
        .one(db)
        .await
}

pub async fn get_applications_by_project<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> Result<Vec<applications::Model>, DbErr> {
    applications::Entity::find()
        .filter(applications::Column::ProjectId.eq(project_id))
        .order_by_desc(applications::Column::SubmissionDate)
        .all(db)
        .await
}

pub async fn get_applications_by_freelance<C: ConnectionTrait>(
    db: &C,
    freelance_id: Uuid,
) -> Result<Vec<applications::Model>, DbErr> {
    applications::Entity::find()
        .filter(applications::Column::FreelanceId.eq(freelance_id))
        .order_by_desc(applications::Column::SubmissionDate)
        .all(db)
        .await
}

/// Move an application to `next` only if it is still in one of `expected`.
///
/// Returns `None` when no row matched, i.e. a concurrent writer got there first
/// (or the application disappeared).
pub async fn transition_status<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: &[ApplicationStatus],
    next: ApplicationStatus,
    response_date: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Option<applications::Model>, DbErr> {
    let result = applications::Entity::update_many()
        .col_expr(applications::Column::Status, Expr::value(next))
        .col_expr(applications::Column::ResponseDate, Expr::value(response_date))
        .filter(applications::Column::Id.eq(id))
        .filter(applications::Column::Status.is_in(expected.iter().copied()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_application_by_id(db, id).await
}

/// Reopen a rejected or withdrawn application in place with fresh content.
pub async fn reactivate<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    proposed_rate: f64,
    cover_letter: String,
) -> Result<Option<applications::Model>, DbErr> {
    let result = applications::Entity::update_many()
        .col_expr(applications::Column::ProposedRate, Expr::value(proposed_rate))
        .col_expr(applications::Column::CoverLetter, Expr::value(cover_letter))
        .col_expr(
            applications::Column::Status,
            Expr::value(ApplicationStatus::Submitted),
        )
        .col_expr(
            applications::Column::ResponseDate,
            Expr::value(Option::<chrono::DateTime<chrono::Utc>>::None),
        )
        .filter(applications::Column::Id.eq(id))
        .filter(applications::Column::Status.is_in(ApplicationStatus::REOPENABLE))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_application_by_id(db, id).await
}

/// Edit rate and/or cover letter while the application is still `Submitted`.
pub async fn update_content<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    patch: ApplicationContentPatch,
) -> Result<Option<applications::Model>, DbErr> {
    let mut update = applications::Entity::update_many()
        .filter(applications::Column::Id.eq(id))
        .filter(applications::Column::Status.eq(ApplicationStatus::Submitted));

    if let Some(proposed_rate) = patch.proposed_rate {
        update = update.col_expr(applications::Column::ProposedRate, Expr::value(proposed_rate));
    }
    if let Some(cover_letter) = patch.cover_letter {
        update = update.col_expr(applications::Column::CoverLetter, Expr::value(cover_letter));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_application_by_id(db, id).await
}

/// Reject every still-open application on `project_id` other than `accepted_id`
/// in one statement, then read back the rows that statement touched.
///
/// `rejected_at` doubles as the marker of this pass, so rows rejected earlier
/// are never reported again.
pub async fn reject_open_peers<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    accepted_id: Uuid,
    rejected_at: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<applications::Model>, DbErr> {
    applications::Entity::update_many()
        .col_expr(
            applications::Column::Status,
            Expr::value(ApplicationStatus::Rejected),
        )
        .col_expr(
            applications::Column::ResponseDate,
            Expr::value(Some(rejected_at)),
        )
        .filter(applications::Column::ProjectId.eq(project_id))
        .filter(applications::Column::Id.ne(accepted_id))
        .filter(applications::Column::Status.is_in(ApplicationStatus::OPEN))
        .exec(db)
        .await?;

    applications::Entity::find()
        .filter(applications::Column::ProjectId.eq(project_id))
        .filter(applications::Column::Id.ne(accepted_id))
        .filter(applications::Column::Status.eq(ApplicationStatus::Rejected))
        .filter(applications::Column::ResponseDate.eq(rejected_at))
        .all(db)
        .await
}

/// Another application on `project_id` that is already accepted, if any.
pub async fn find_accepted_peer<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    application_id: Uuid,
) -> Result<Option<applications::Model>, DbErr> {
    applications::Entity::find()
        .filter(applications::Column::ProjectId.eq(project_id))
        .filter(applications::Column::Id.ne(application_id))
        .filter(applications::Column::Status.eq(ApplicationStatus::Accepted))
        .one(db)
        .await
}

/// Administrative hard delete.
pub async fn delete_application<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<DeleteResult, DbErr> {
    applications::Entity::delete_by_id(id).exec(db).await
}

/// Count applications per status, optionally restricted to one project.
pub async fn count_by_status<C: ConnectionTrait>(
    db: &C,
    project_id: Option<Uuid>,
) -> Result<Vec<(ApplicationStatus, i64)>, DbErr> {
    let mut query = applications::Entity::find()
        .select_only()
        .column(applications::Column::Status)
        .column_as(applications::Column::Id.count(), "count");

    if let Some(project_id) = project_id {
        query = query.filter(applications::Column::ProjectId.eq(project_id));
    }

    query
        .group_by(applications::Column::Status)
        .into_tuple::<(ApplicationStatus, i64)>()
        .all(db)
        .await
}
