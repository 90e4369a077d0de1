//! Create post collect table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostCollect::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostCollect::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostCollect::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostCollect::UserAddress).string_len(128).not_null())
                    .col(ColumnDef::new(PostCollect::TransactionHash).string_len(256))
                    .col(
                        ColumnDef::new(PostCollect::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_collect_post")
                            .from(PostCollect::Table, PostCollect::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_collect_user")
                            .from(PostCollect::Table, PostCollect::UserAddress)
                            .to(User::Table, User::WalletAddress)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one collect per user per post
        manager
            .create_index(
                Index::create()
                    .name("idx_post_collect_post_user")
                    .table(PostCollect::Table)
                    .col(PostCollect::PostId)
                    .col(PostCollect::UserAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_address (for collected-posts listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_collect_user_address")
                    .table(PostCollect::Table)
                    .col(PostCollect::UserAddress)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostCollect::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostCollect {
    Table,
    Id,
    PostId,
    UserAddress,
    TransactionHash,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    WalletAddress,
}
