use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        round::RoundView,
        session::{SessionSnapshot, TeamSummary},
        sse::{
            AnswerAdjudicatedEvent, CountdownEvent, PhaseChangedEvent, QuestionChangedEvent,
            RosterChangedEvent, ScoreChangedEvent, ServerEvent,
        },
    },
    state::{
        SseHub,
        roster::{Roster, ScoreAward},
        round::{Adjudication, Round},
        state_machine::Session,
    },
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_COUNTDOWN: &str = "countdown";
const EVENT_QUESTION_CHANGED: &str = "question_changed";
const EVENT_ANSWER_ADJUDICATED: &str = "answer_adjudicated";
const EVENT_SCORE_CHANGED: &str = "score_changed";
const EVENT_ROSTER_CHANGED: &str = "roster_changed";

/// Broadcast the full session snapshot after an accepted session event.
pub fn broadcast_phase_changed(hub: &SseHub, session: &Session) {
    let payload = PhaseChangedEvent(SessionSnapshot::from(session));
    send_event(hub, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast one countdown unit for the question on screen.
pub fn broadcast_countdown(hub: &SseHub, question_id: &str, remaining: u32) {
    let payload = CountdownEvent {
        question_id: question_id.to_owned(),
        remaining,
    };
    send_event(hub, EVENT_COUNTDOWN, &payload);
}

/// Broadcast the round after the question on screen changed or was narrowed.
pub fn broadcast_question_changed(hub: &SseHub, round: &Round) {
    let payload = QuestionChangedEvent(RoundView::from(round));
    send_event(hub, EVENT_QUESTION_CHANGED, &payload);
}

/// Broadcast how a selection was adjudicated.
pub fn broadcast_answer_adjudicated(
    hub: &SseHub,
    round: &Round,
    option: &str,
    adjudication: Adjudication,
) {
    let Some(question) = round.current_question() else {
        return;
    };
    let payload = AnswerAdjudicatedEvent {
        question_id: question.id.clone(),
        option: option.to_owned(),
        adjudication,
        visible_options: round.state().visible_options.clone(),
    };
    send_event(hub, EVENT_ANSWER_ADJUDICATED, &payload);
}

/// Broadcast a player's and team's new scores.
pub fn broadcast_score_changed(hub: &SseHub, award: ScoreAward) {
    let payload = ScoreChangedEvent {
        team: award.slot,
        player_id: award.player_id,
        player_score: award.player_score,
        team_score: award.team_score,
    };
    send_event(hub, EVENT_SCORE_CHANGED, &payload);
}

/// Broadcast both teams after a setup edit.
pub fn broadcast_roster_changed(hub: &SseHub, roster: &Roster) {
    let payload = RosterChangedEvent {
        teams: roster.teams().into_iter().map(TeamSummary::from).collect(),
    };
    send_event(hub, EVENT_ROSTER_CHANGED, &payload);
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{game::Language, round::DEFAULT_COUNTDOWN};

    #[tokio::test]
    async fn phase_changes_carry_the_session_snapshot() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        broadcast_phase_changed(&hub, &Session::new(Language::English, DEFAULT_COUNTDOWN));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("phase_changed"));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["phase"], "LOGIN");
        assert_eq!(data["language"], "en");
    }

    #[tokio::test]
    async fn countdown_ticks_name_their_question() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        broadcast_countdown(&hub, "batch-3", 42);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("countdown"));
        assert_eq!(event.data, r#"{"question_id":"batch-3","remaining":42}"#);
    }
}
