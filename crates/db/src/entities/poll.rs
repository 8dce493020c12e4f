//! Poll entity (teacher-issued multiple-choice question).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub session_id: String,

    #[sea_orm(column_type = "Text")]
    pub question: String,

    /// Ordered options (JSON array of `{text, votes}`)
    #[sea_orm(column_type = "Json")]
    pub options: JsonValue,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    /// Set exactly when the poll is closed
    #[sea_orm(nullable)]
    pub closed_at: Option<DateTimeWithTimeZone>,
}

/// A single stored poll option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub votes: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id",
        on_delete = "Cascade"
    )]
    Session,

    #[sea_orm(has_many = "super::poll_vote::Entity")]
    PollVote,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::poll_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollVote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored options in display order.
    pub fn decode_options(&self) -> Result<Vec<PollOption>, serde_json::Error> {
        serde_json::from_value(self.options.clone())
    }
}

/// Options after one more vote for `choice`, order unchanged.
///
/// Returns `None` if `choice` names no option.
#[must_use]
pub fn tally(mut options: Vec<PollOption>, choice: i32) -> Option<Vec<PollOption>> {
    let slot = usize::try_from(choice)
        .ok()
        .and_then(|i| options.get_mut(i))?;
    slot.votes += 1;
    Some(options)
}
