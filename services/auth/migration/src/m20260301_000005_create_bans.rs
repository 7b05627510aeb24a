use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bans::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bans::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Bans::BannedBy).big_integer().not_null())
                    .col(ColumnDef::new(Bans::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Bans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Bans::Table)
                    .col(Bans::UserId)
                    .col(Bans::CreatedAt)
                    .name("idx_bans_user_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bans::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bans {
    Table,
    Id,
    UserId,
    BannedBy,
    Reason,
    CreatedAt,
}
