use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{
        round::RoundView,
        session::{SessionSnapshot, TeamSummary},
    },
    state::{roster::TeamSlot, round::Adjudication},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name; `None` sends a default message.
    pub event: Option<String>,
    /// Serialized JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether rounds are currently served from the fallback set only.
    pub degraded: bool,
    /// Session as it stands when the client subscribes.
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast after every accepted session event.
pub struct PhaseChangedEvent(pub SessionSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// One countdown unit elapsed on the current question.
pub struct CountdownEvent {
    /// Question the countdown belongs to.
    pub question_id: String,
    /// Units left before the question times out.
    pub remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a new question is on screen or its options changed.
pub struct QuestionChangedEvent(pub RoundView);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a selection has been adjudicated.
pub struct AnswerAdjudicatedEvent {
    /// Question the selection was made on.
    pub question_id: String,
    /// Option that was selected.
    pub option: String,
    /// Verdict on the selection.
    pub adjudication: Adjudication,
    /// Options still shown after the verdict.
    pub visible_options: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an attribution credited a player.
pub struct ScoreChangedEvent {
    /// Team of the credited player.
    pub team: TeamSlot,
    /// Credited player.
    pub player_id: Uuid,
    /// Player total after the award.
    pub player_score: u32,
    /// Team total after the award.
    pub team_score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team or its players were edited during setup.
pub struct RosterChangedEvent {
    /// Both teams in slot order.
    pub teams: Vec<TeamSummary>,
}
