//! Initial schema.
//!
//! - `rooms`: shared ledger scopes (at most two members each)
//! - `users`: room members
//! - `user_transactions`: simple per-user income/expense log
//! - `other_transaction`: categorized income/expense log
//! - `room_balance`: materialized running total per room
//!
//! Monetary columns hold signed integer minor units. Ledger amounts are
//! range-checked in the schema: flow fields are non-negative, categorized
//! amounts are positive, and kind/category are closed sets.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORIES: [&str; 5] = ["Food", "Shopping", "Entertainment", "Bills", "Other"];

#[derive(Iden)]
enum Rooms {
    Table,
    Id,
    RoomName,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FullName,
    Email,
    PasswordHash,
    RoomId,
    CreatedAt,
}

#[derive(Iden)]
enum UserTransactions {
    Table,
    Id,
    UserId,
    RoomId,
    Income,
    Expense,
    UpdatedAt,
}

#[derive(Iden)]
enum OtherTransaction {
    Table,
    Id,
    UserId,
    RoomId,
    Kind,
    Category,
    Amount,
    Note,
    UpdatedAt,
}

#[derive(Iden)]
enum RoomBalance {
    Table,
    RoomId,
    Total,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rooms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rooms::RoomName).string().not_null())
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::RoomId).integer().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-room_id")
                            .from(Users::Table, Users::RoomId)
                            .to(Rooms::Table, Rooms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTransactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserTransactions::UserId).integer().not_null())
                    .col(ColumnDef::new(UserTransactions::RoomId).integer().not_null())
                    .col(
                        ColumnDef::new(UserTransactions::Income)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(UserTransactions::Income).gte(0)),
                    )
                    .col(
                        ColumnDef::new(UserTransactions::Expense)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(UserTransactions::Expense).gte(0)),
                    )
                    .col(
                        ColumnDef::new(UserTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_transactions-user_id")
                            .from(UserTransactions::Table, UserTransactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_transactions-room_id")
                            .from(UserTransactions::Table, UserTransactions::RoomId)
                            .to(Rooms::Table, Rooms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtherTransaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtherTransaction::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtherTransaction::UserId).integer().not_null())
                    .col(ColumnDef::new(OtherTransaction::RoomId).integer().not_null())
                    .col(
                        ColumnDef::new(OtherTransaction::Kind)
                            .string()
                            .not_null()
                            .check(
                                Expr::col(OtherTransaction::Kind).is_in(["Income", "Expense"]),
                            ),
                    )
                    .col(
                        ColumnDef::new(OtherTransaction::Category)
                            .string()
                            .not_null()
                            .check(Expr::col(OtherTransaction::Category).is_in(CATEGORIES)),
                    )
                    .col(
                        ColumnDef::new(OtherTransaction::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(OtherTransaction::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(OtherTransaction::Note)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OtherTransaction::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-other_transaction-user_id")
                            .from(OtherTransaction::Table, OtherTransaction::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-other_transaction-room_id")
                            .from(OtherTransaction::Table, OtherTransaction::RoomId)
                            .to(Rooms::Table, Rooms::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoomBalance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoomBalance::RoomId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RoomBalance::Total)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RoomBalance::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-room_balance-room_id")
                            .from(RoomBalance::Table, RoomBalance::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomBalance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OtherTransaction::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;
        Ok(())
    }
}
