use sea_orm::*;
use uuid::Uuid;

use crate::models::freelances;

/// Fetch a single freelance by ID.
pub async fn get_freelance_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<freelances::Model>, DbErr> {
    freelances::Entity::find_by_id(id).one(db).await
}
