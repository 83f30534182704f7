use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Evaluations {
    Table,
    Id,
    ContractId,
    EvaluatorId,
    EvaluatedId,
    EvaluatorType,
    EvaluatedType,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Evaluations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Evaluations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Evaluations::ContractId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::EvaluatorId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::EvaluatedId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::EvaluatorType).string().not_null())
                    .col(ColumnDef::new(Evaluations::EvaluatedType).string().not_null())
                    .col(ColumnDef::new(Evaluations::Rating).integer().not_null())
                    .col(ColumnDef::new(Evaluations::Comment).text())
                    .col(
                        ColumnDef::new(Evaluations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evaluations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluations_contract_id")
                            .from(Evaluations::Table, Evaluations::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_evaluations_contract_evaluator_unique")
                    .table(Evaluations::Table)
                    .col(Evaluations::ContractId)
                    .col(Evaluations::EvaluatorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_evaluations_evaluated_id")
                    .table(Evaluations::Table)
                    .col(Evaluations::EvaluatedId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Evaluations::Table).to_owned())
            .await
    }
}
