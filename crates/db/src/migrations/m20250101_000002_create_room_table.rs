//! Create room table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Room::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Room::Id)
                            .string_len(24)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Room::OwnerId).string_len(24).not_null())
                    .col(ColumnDef::new(Room::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Room::Description).text())
                    .col(
                        ColumnDef::new(Room::DefaultMaxStudents)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(Room::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Room::UpdatedAt).timestamp_with_time_zone())
                    .check(
                        Expr::col(Room::DefaultMaxStudents)
                            .gte(1)
                            .and(Expr::col(Room::DefaultMaxStudents).lte(1000)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_room_owner")
                            .from(Room::Table, Room::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (owner_id, created_at) for listing a teacher's rooms
        manager
            .create_index(
                Index::create()
                    .name("idx_room_owner_created")
                    .table(Room::Table)
                    .col(Room::OwnerId)
                    .col(Room::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Room::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Room {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    DefaultMaxStudents,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
