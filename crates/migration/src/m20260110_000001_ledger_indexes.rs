//! Indexes backing the room/user range queries of both ledgers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    RoomId,
}

#[derive(Iden)]
enum UserTransactions {
    Table,
    RoomId,
    UserId,
    UpdatedAt,
}

#[derive(Iden)]
enum OtherTransaction {
    Table,
    RoomId,
    UserId,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-users-room_id")
                    .table(Users::Table)
                    .col(Users::RoomId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_transactions-room_id-updated_at")
                    .table(UserTransactions::Table)
                    .col(UserTransactions::RoomId)
                    .col(UserTransactions::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_transactions-room_id-user_id")
                    .table(UserTransactions::Table)
                    .col(UserTransactions::RoomId)
                    .col(UserTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-other_transaction-room_id-updated_at")
                    .table(OtherTransaction::Table)
                    .col(OtherTransaction::RoomId)
                    .col(OtherTransaction::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-other_transaction-user_id")
                    .table(OtherTransaction::Table)
                    .col(OtherTransaction::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx-other_transaction-user_id", OtherTransaction::Table.to_string()),
            (
                "idx-other_transaction-room_id-updated_at",
                OtherTransaction::Table.to_string(),
            ),
            (
                "idx-user_transactions-room_id-user_id",
                UserTransactions::Table.to_string(),
            ),
            (
                "idx-user_transactions-room_id-updated_at",
                UserTransactions::Table.to_string(),
            ),
            ("idx-users-room_id", Users::Table.to_string()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
