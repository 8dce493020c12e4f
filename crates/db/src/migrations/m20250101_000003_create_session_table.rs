//! Create session table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Session::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Session::Id)
                            .string_len(24)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Session::RoomId).string_len(24).not_null())
                    .col(ColumnDef::new(Session::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Session::Code)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Session::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Session::MaxStudents).integer().not_null())
                    .col(
                        ColumnDef::new(Session::ParticipantCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Session::StartAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Session::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Session::ClosedAt).timestamp_with_time_zone())
                    // Capacity backstop for the conditional seat reservation
                    .check(
                        Expr::col(Session::ParticipantCount)
                            .gte(0)
                            .and(
                                Expr::col(Session::ParticipantCount)
                                    .lte(Expr::col(Session::MaxStudents)),
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_room")
                            .from(Session::Table, Session::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (room_id, created_at) for listing sessions of a room
        manager
            .create_index(
                Index::create()
                    .name("idx_session_room_created")
                    .table(Session::Table)
                    .col(Session::RoomId)
                    .col(Session::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Session::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Session {
    Table,
    Id,
    RoomId,
    Title,
    Code,
    IsActive,
    MaxStudents,
    ParticipantCount,
    StartAt,
    CreatedAt,
    ClosedAt,
}

#[derive(Iden)]
enum Room {
    Table,
    Id,
}
