//! Create friend table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friend::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friend::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friend::UserAddress).string_len(128).not_null())
                    .col(ColumnDef::new(Friend::FriendAddress).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Friend::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_user")
                            .from(Friend::Table, Friend::UserAddress)
                            .to(User::Table, User::WalletAddress)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_friend")
                            .from(Friend::Table, Friend::FriendAddress)
                            .to(User::Table, User::WalletAddress)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: each direction of a friendship is stored once
        manager
            .create_index(
                Index::create()
                    .name("idx_friend_user_friend")
                    .table(Friend::Table)
                    .col(Friend::UserAddress)
                    .col(Friend::FriendAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friend::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friend {
    Table,
    Id,
    UserAddress,
    FriendAddress,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    WalletAddress,
}
