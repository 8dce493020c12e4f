//! Create question table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(24)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::SessionId).string_len(24).not_null())
                    .col(ColumnDef::new(Question::ParticipantId).string_len(24))
                    .col(ColumnDef::new(Question::Text).text().not_null())
                    .col(
                        ColumnDef::new(Question::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::StudentName).string_len(64))
                    .col(
                        ColumnDef::new(Question::Upvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Question::Upvotes).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_session")
                            .from(Question::Table, Question::SessionId)
                            .to(Session::Table, Session::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_participant")
                            .from(Question::Table, Question::ParticipantId)
                            .to(Participant::Table, Participant::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (session_id, upvotes, created_at) matches the display order
        manager
            .create_index(
                Index::create()
                    .name("idx_question_session_rank")
                    .table(Question::Table)
                    .col(Question::SessionId)
                    .col(Question::Upvotes)
                    .col(Question::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    SessionId,
    ParticipantId,
    Text,
    IsAnonymous,
    StudentName,
    Upvotes,
    CreatedAt,
}

#[derive(Iden)]
enum Session {
    Table,
    Id,
}

#[derive(Iden)]
enum Participant {
    Table,
    Id,
}
