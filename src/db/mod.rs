pub mod applications;
pub mod companies;
pub mod contracts;
pub mod conversations;
pub mod evaluations;
pub mod freelances;
pub mod invitations;
pub mod notifications;
pub mod projects;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Create a SeaORM database connection pool for `database_url`.
pub async fn create_pool(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Truncate a timestamp to the microsecond precision Postgres stores, so a
/// value written by a bulk update can be matched again by equality.
pub(crate) fn store_precision(at: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::SubsecRound;
    at.trunc_subsecs(6)
}
