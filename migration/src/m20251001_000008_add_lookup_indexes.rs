use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Applications {
    Table,
    ProjectId,
    Status,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    FreelanceId,
    CompanyId,
}

#[derive(DeriveIden)]
enum ProjectInvitations {
    Table,
    FreelanceId,
    Status,
}

#[derive(DeriveIden)]
enum Conversations {
    Table,
    FreelanceId,
    CompanyId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing a project's applications and cascading rejections
        manager
            .create_index(
                Index::create()
                    .name("idx_applications_project_status")
                    .table(Applications::Table)
                    .col(Applications::ProjectId)
                    .col(Applications::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_freelance_id")
                    .table(Contracts::Table)
                    .col(Contracts::FreelanceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_company_id")
                    .table(Contracts::Table)
                    .col(Contracts::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_invitations_freelance_status")
                    .table(ProjectInvitations::Table)
                    .col(ProjectInvitations::FreelanceId)
                    .col(ProjectInvitations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_conversations_pair")
                    .table(Conversations::Table)
                    .col(Conversations::FreelanceId)
                    .col(Conversations::CompanyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_conversations_pair")
                    .table(Conversations::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_project_invitations_freelance_status")
                    .table(ProjectInvitations::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_contracts_company_id")
                    .table(Contracts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_contracts_freelance_id")
                    .table(Contracts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_applications_project_status")
                    .table(Applications::Table)
                    .to_owned(),
            )
            .await
    }
}
