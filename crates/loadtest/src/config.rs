//! Simulation plan.

use std::path::Path;

use serde::Deserialize;

/// Top-level plan file.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// API root, e.g. `http://localhost:5000/api`.
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Sessions to flood.
    #[serde(default)]
    pub sessions: Vec<SessionPlan>,
}

/// Students joining one session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPlan {
    /// Join code.
    pub code: String,
    /// Students joining with this code.
    #[serde(default)]
    pub students: Vec<StudentPlan>,
}

/// One simulated student. Extra fields in the plan are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentPlan {
    /// Display name sent with the join.
    pub name: String,
}

impl SimulationConfig {
    /// Read a plan from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parse a plan from JSON text.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Total number of join requests the plan describes.
    #[must_use]
    pub fn student_count(&self) -> usize {
        self.sessions.iter().map(|s| s.students.len()).sum()
    }

    /// Join URL for a session code.
    #[must_use]
    pub fn join_url(&self, code: &str) -> String {
        format!("{}/sessions/{code}/join", self.base_url.trim_end_matches('/'))
    }
}
