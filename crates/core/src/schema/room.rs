//! Room payloads.

use classroom_common::{AppResult, parse_id};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Capacity given to a room when the client omits one.
pub const DEFAULT_MAX_STUDENTS: i32 = 30;

/// Raw input for creating a room.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomInput {
    #[serde(default)]
    #[validate(length(min = 3))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1000))]
    pub default_max_students: Option<i64>,
}

/// A validated room payload with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default_max_students: i32,
}

/// Raw input for updating a room. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomInput {
    #[validate(length(min = 3))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1000))]
    pub default_max_students: Option<i64>,
}

/// A validated partial room update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_max_students: Option<i32>,
}

impl RoomPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.default_max_students.is_none()
    }
}

/// Validate a room creation payload.
pub fn create_room(input: CreateRoomInput) -> Result<NewRoom, ValidationErrors> {
    input.validate()?;

    Ok(NewRoom {
        name: input.name,
        description: input.description,
        default_max_students: input
            .default_max_students
            .map_or(DEFAULT_MAX_STUDENTS, |v| v as i32),
    })
}

/// Validate a room update payload.
pub fn update_room(input: UpdateRoomInput) -> Result<RoomPatch, ValidationErrors> {
    input.validate()?;

    Ok(RoomPatch {
        name: input.name,
        description: input.description,
        default_max_students: input.default_max_students.map(|v| v as i32),
    })
}

/// Parse a room identifier from a path segment.
pub fn parse_room_id(raw: &str) -> AppResult<String> {
    parse_id(raw)
}
