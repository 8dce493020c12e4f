//! Concurrent join requests.

use std::fmt;

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SimulationConfig;

/// Why a join did not succeed.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The server answered with a non-success status.
    #[error("server responded {status}: {body}")]
    #[allow(missing_docs)]
    Response { status: StatusCode, body: String },

    /// The request went out but no response came back.
    #[error("no response: {0}")]
    NoResponse(String),

    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),
}

impl JoinError {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_builder() || err.is_connect() {
            Self::Request(err.to_string())
        } else {
            Self::NoResponse(err.to_string())
        }
    }
}

/// Outcome of one student's join.
#[derive(Debug)]
pub struct JoinAttempt {
    /// Join code used.
    pub code: String,
    /// Student name sent.
    pub name: String,
    /// Success status or the classified failure.
    pub result: Result<StatusCode, JoinError>,
}

/// Totals over all attempts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Summary {
    pub succeeded: usize,
    pub rejected: usize,
    pub no_response: usize,
    pub not_sent: usize,
}

impl Summary {
    /// Tally a set of attempts.
    #[must_use]
    pub fn from_attempts(attempts: &[JoinAttempt]) -> Self {
        attempts
            .iter()
            .fold(Self::default(), |mut summary, attempt| {
                match &attempt.result {
                    Ok(_) => summary.succeeded += 1,
                    Err(JoinError::Response { .. }) => summary.rejected += 1,
                    Err(JoinError::NoResponse(_)) => summary.no_response += 1,
                    Err(JoinError::Request(_)) => summary.not_sent += 1,
                }
                summary
            })
    }

    /// Attempts that did not get a seat.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.rejected + self.no_response + self.not_sent
    }

    /// All attempts.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} joins: {} succeeded, {} failed ({} rejected, {} without response, {} not sent)",
            self.total(),
            self.succeeded,
            self.failed(),
            self.rejected,
            self.no_response,
            self.not_sent
        )
    }
}

async fn join_one(client: &Client, url: String, name: &str) -> Result<StatusCode, JoinError> {
    let response = client
        .post(&url)
        .json(&json!({ "name": name }))
        .send()
        .await
        .map_err(|e| JoinError::from_reqwest(&e))?;

    let status = response.status();
    if status.is_success() {
        return Ok(status);
    }

    let body = response.text().await.unwrap_or_default();
    Err(JoinError::Response { status, body })
}

/// Send every join in the plan concurrently.
///
/// Failures are logged and collected; none cancels the others and nothing
/// is retried.
pub async fn run(client: &Client, plan: &SimulationConfig) -> Vec<JoinAttempt> {
    let requests = plan.sessions.iter().flat_map(move |session| {
        session.students.iter().map(move |student| {
            let url = plan.join_url(&session.code);
            async move {
                let result = join_one(client, url, &student.name).await;
                match &result {
                    Ok(status) => {
                        info!(code = %session.code, name = %student.name, %status, "Joined");
                    }
                    Err(e) => {
                        warn!(code = %session.code, name = %student.name, error = %e, "Join failed");
                    }
                }
                JoinAttempt {
                    code: session.code.clone(),
                    name: student.name.clone(),
                    result,
                }
            }
        })
    });

    join_all(requests).await
}
