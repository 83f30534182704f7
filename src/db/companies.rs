use sea_orm::*;
use uuid::Uuid;

use crate::models::companies;

/// Fetch a single company by ID.
pub async fn get_company_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<companies::Model>, DbErr> {
    companies::Entity::find_by_id(id).one(db).await
}
