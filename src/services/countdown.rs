//! Cooperative per-question countdown.
//!
//! One task runs per question on screen. It only ever touches the session
//! through [`AppState::tick_countdown`], which ignores tickets that no longer
//! identify the current question, so a task that outlived its question stops
//! on its next tick without side effects.
//!
//! [`AppState::tick_countdown`]: crate::state::AppState::tick_countdown

use tokio::{
    task::AbortHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::debug;

use crate::state::{
    SharedState,
    round::{CountdownTick, QuestionTicket},
};

/// Spawn the countdown for the question identified by `ticket`.
pub(crate) fn spawn(
    state: SharedState,
    ticket: QuestionTicket,
    question_id: String,
) -> AbortHandle {
    let period = state.config().tick_interval;
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.tick_countdown(ticket).await {
                CountdownTick::Remaining(_) => {}
                CountdownTick::Expired => {
                    debug!(question_id = %question_id, "countdown expired");
                    break;
                }
                CountdownTick::Stopped => {
                    debug!(question_id = %question_id, "countdown stopped");
                    break;
                }
            }
        }
    });
    task.abort_handle()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::provider::QuestionRequest,
        services::question_service::tests::FakeProvider,
        state::{
            game::{Category, CategorySet, Difficulty, Mode},
            state_machine::{GamePhase, SessionEvent},
            tests::test_state,
        },
    };

    fn fast_config(countdown_secs: u32) -> AppConfig {
        AppConfig {
            questions_per_round: 2,
            countdown_secs,
            tick_interval: Duration::from_millis(10),
            ..AppConfig::default()
        }
    }

    async fn playing_state(countdown_secs: u32) -> SharedState {
        let state = test_state(FakeProvider::Unavailable, fast_config(countdown_secs));
        state.dispatch(SessionEvent::LoggedIn).await.unwrap();
        state.dispatch(SessionEvent::SelectMode(Mode::Classic)).await.unwrap();
        state.dispatch(SessionEvent::SetupComplete).await.unwrap();
        state
            .dispatch(SessionEvent::ChooseDifficulty {
                difficulty: Difficulty::Easy,
                tournament_name: None,
            })
            .await
            .unwrap();
        let loading = state
            .dispatch(SessionEvent::ChooseCategory(CategorySet::single(Category::General)))
            .await
            .unwrap();
        let ticket = loading.acquisition_ticket().unwrap();
        let questions = state
            .questions()
            .fetch_batch(QuestionRequest::new(
                CategorySet::single(Category::General),
                Difficulty::Easy,
                2,
                Mode::Classic,
                loading.language,
            ))
            .await;
        let playing = state
            .dispatch(SessionEvent::RoundReady { ticket, questions })
            .await
            .unwrap();
        assert_eq!(playing.phase, GamePhase::Playing);
        state
    }

    #[tokio::test]
    async fn countdown_runs_down_to_zero_without_finalizing() {
        let state = playing_state(3).await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let session = state.snapshot().await;
        let round = session.round.unwrap();
        assert_eq!(round.state().remaining, 0);
        assert!(!round.state().countdown_running);
        assert!(!round.state().status.is_finalized());
    }

    #[tokio::test]
    async fn countdown_events_are_published_per_unit() {
        let state = playing_state(50).await;
        let mut receiver = state.sse().subscribe();

        let mut remaining = Vec::new();
        while remaining.len() < 2 {
            let event = receiver.recv().await.unwrap();
            if event.event.as_deref() == Some("countdown") {
                let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                remaining.push(data["remaining"].as_u64().unwrap());
            }
        }
        assert_eq!(remaining[0] - remaining[1], 1);
    }

    #[tokio::test]
    async fn stale_tickets_stop_immediately() {
        let state = playing_state(50).await;
        let stale = QuestionTicket {
            index: 7,
            serial: 99,
        };
        assert_eq!(state.tick_countdown(stale).await, CountdownTick::Stopped);
    }
}
