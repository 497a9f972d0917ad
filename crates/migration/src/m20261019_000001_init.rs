//! Initial schema:
//!
//! - `users`: local accounts and their profile
//! - `lists`: saved purchase lists, one row per list
//! - `products`: products of a list, kept in order by `position`

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    DisplayName,
    PhotoUrl,
    Birthdate,
    Country,
    CreatedAt,
}

#[derive(Iden)]
enum Lists {
    Table,
    Id,
    OwnerId,
    Store,
    TotalMinor,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    ListId,
    Position,
    Store,
    Name,
    PriceMinor,
    PurchaseDate,
    QuantityMilli,
    QuantityUnit,
    Category,
    Brand,
    Active,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).blob().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string())
                    .col(ColumnDef::new(Users::PhotoUrl).string())
                    .col(ColumnDef::new(Users::Birthdate).date())
                    .col(ColumnDef::new(Users::Country).string())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Lists
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Lists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lists::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Lists::OwnerId).string().not_null())
                    .col(ColumnDef::new(Lists::Store).string().not_null())
                    .col(ColumnDef::new(Lists::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Lists::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Lists::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-lists-owner_id-created_at")
                    .table(Lists::Table)
                    .col(Lists::OwnerId)
                    .col(Lists::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Products
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::ListId).blob().not_null())
                    .col(ColumnDef::new(Products::Position).integer().not_null())
                    .col(ColumnDef::new(Products::Store).string().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::PriceMinor).big_integer().not_null())
                    .col(ColumnDef::new(Products::PurchaseDate).date().not_null())
                    .col(
                        ColumnDef::new(Products::QuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::QuantityUnit)
                            .string()
                            .not_null()
                            .default("unit"),
                    )
                    .col(ColumnDef::new(Products::Category).string().not_null())
                    .col(ColumnDef::new(Products::Brand).string())
                    .col(
                        ColumnDef::new(Products::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-list_id")
                            .from(Products::Table, Products::ListId)
                            .to(Lists::Table, Lists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-list_id-position-unique")
                    .table(Products::Table)
                    .col(Products::ListId)
                    .col(Products::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lists::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
