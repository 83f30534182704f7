use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ProjectInvitations {
    Table,
    Id,
    ProjectId,
    FreelanceId,
    CompanyId,
    Message,
    Status,
    SentAt,
    RespondedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Freelances {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectInvitations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectInvitations::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectInvitations::FreelanceId).uuid().not_null())
                    .col(ColumnDef::new(ProjectInvitations::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ProjectInvitations::Message).text())
                    .col(ColumnDef::new(ProjectInvitations::Status).string().not_null())
                    .col(
                        ColumnDef::new(ProjectInvitations::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectInvitations::RespondedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ProjectInvitations::ExpiresAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_invitations_project_id")
                            .from(ProjectInvitations::Table, ProjectInvitations::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_invitations_freelance_id")
                            .from(ProjectInvitations::Table, ProjectInvitations::FreelanceId)
                            .to(Freelances::Table, Freelances::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_invitations_company_id")
                            .from(ProjectInvitations::Table, ProjectInvitations::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_invitations_unique")
                    .table(ProjectInvitations::Table)
                    .col(ProjectInvitations::ProjectId)
                    .col(ProjectInvitations::FreelanceId)
                    .col(ProjectInvitations::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectInvitations::Table).to_owned())
            .await
    }
}
