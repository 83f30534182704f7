use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Conversations {
    Table,
    FreelanceId,
    CompanyId,
    ApplicationId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_conversations_freelance_company_application_unique")
                    .table(Conversations::Table)
                    .col(Conversations::FreelanceId)
                    .col(Conversations::CompanyId)
                    .col(Conversations::ApplicationId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_conversations_freelance_company_application_unique")
                    .table(Conversations::Table)
                    .to_owned(),
            )
            .await
    }
}
