//! Create user file table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserFile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserFile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserFile::UserAddress).string_len(128).not_null())
                    .col(ColumnDef::new(UserFile::FileName).string_len(512).not_null())
                    .col(ColumnDef::new(UserFile::FileType).string_len(128).not_null())
                    .col(
                        ColumnDef::new(UserFile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_file_user")
                            .from(UserFile::Table, UserFile::UserAddress)
                            .to(User::Table, User::WalletAddress)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_file_user_address")
                    .table(UserFile::Table)
                    .col(UserFile::UserAddress)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserFile {
    Table,
    Id,
    UserAddress,
    FileName,
    FileType,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    WalletAddress,
}
