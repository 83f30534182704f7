pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_directory_tables;
mod m20251001_000002_create_applications_table;
mod m20251001_000003_create_contracts_table;
mod m20251001_000004_create_evaluations_table;
mod m20251001_000005_create_project_invitations_table;
mod m20251001_000006_create_notifications_tables;
mod m20251001_000007_create_conversations_table;
mod m20251001_000008_add_lookup_indexes;
mod m20251001_000009_add_unique_conversation_key;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_directory_tables::Migration),
            Box::new(m20251001_000002_create_applications_table::Migration),
            Box::new(m20251001_000003_create_contracts_table::Migration),
            Box::new(m20251001_000004_create_evaluations_table::Migration),
            Box::new(m20251001_000005_create_project_invitations_table::Migration),
            Box::new(m20251001_000006_create_notifications_tables::Migration),
            Box::new(m20251001_000007_create_conversations_table::Migration),
            Box::new(m20251001_000008_add_lookup_indexes::Migration),
            Box::new(m20251001_000009_add_unique_conversation_key::Migration),
        ]
    }
}
