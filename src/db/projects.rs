use sea_orm::*;
use uuid::Uuid;

use crate::models::projects;

/// Fetch a single project by ID.
pub async fn get_project_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<projects::Model>, DbErr> {
    projects::Entity::find_by_id(id).one(db).await
}

/// Fetch a project and hold its row lock until the transaction ends.
///
/// Serialises acceptances on the same project. SQLite has no row locks and
/// already runs one writer at a time.
pub async fn lock_project_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<projects::Model>, DbErr> {
    locked_project(id).one(db).await
}

fn locked_project(id: Uuid) -> Select<projects::Entity> {
    projects::Entity::find_by_id(id).lock_exclusive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_lock_is_select_for_update_on_postgres() {
        let statement = locked_project(Uuid::new_v4()).build(DbBackend::Postgres);
        assert!(statement.sql.ends_with("FOR UPDATE"), "{}", statement.sql);
    }
}
