//! Create poll and poll_vote tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Poll::Id)
                            .string_len(24)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Poll::SessionId).string_len(24).not_null())
                    .col(ColumnDef::new(Poll::Question).text().not_null())
                    .col(ColumnDef::new(Poll::Options).json().not_null())
                    .col(
                        ColumnDef::new(Poll::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Poll::ClosedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_session")
                            .from(Poll::Table, Poll::SessionId)
                            .to(Session::Table, Session::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_poll_session_id")
                    .table(Poll::Table)
                    .col(Poll::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PollVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollVote::Id)
                            .string_len(24)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollVote::PollId).string_len(24).not_null())
                    .col(
                        ColumnDef::new(PollVote::ParticipantId)
                            .string_len(24)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PollVote::Choice).integer().not_null())
                    .col(
                        ColumnDef::new(PollVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_poll")
                            .from(PollVote::Table, PollVote::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_participant")
                            .from(PollVote::Table, PollVote::ParticipantId)
                            .to(Participant::Table, Participant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (poll_id, participant_id) - one vote per participant per poll
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_poll_participant")
                    .table(PollVote::Table)
                    .col(PollVote::PollId)
                    .col(PollVote::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollVote::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
    SessionId,
    Question,
    Options,
    IsActive,
    CreatedAt,
    ClosedAt,
}

#[derive(Iden)]
enum PollVote {
    Table,
    Id,
    PollId,
    ParticipantId,
    Choice,
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
