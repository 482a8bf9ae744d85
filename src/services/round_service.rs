//! Round Controller operations exposed to hosts: answering, attribution,
//! manual advance, lifelines and the final results.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::provider::QuestionRequest,
    dto::{
        round::{AnswerResponse, ProgressResponse, ResultsResponse, RoundView, ScoreAwardView},
        session::SessionSnapshot,
    },
    error::ServiceError,
    services::sse_events::{
        broadcast_answer_adjudicated, broadcast_question_changed, broadcast_score_changed,
    },
    state::{
        SharedState,
        game::Question,
        lifeline::{LifelineEffect, LifelineKind, ReplacementTicket},
        roster::TeamSlot,
        round::{Round, RoundError, RoundProgress},
        state_machine::{GamePhase, Session, SessionEvent},
    },
};

fn ensure_playing(session: &Session) -> Result<(), ServiceError> {
    if session.phase == GamePhase::Playing {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "no round is being played (phase {:?})",
            session.phase
        )))
    }
}

fn current_round(round: &mut Option<Round>) -> Result<&mut Round, ServiceError> {
    round
        .as_mut()
        .ok_or_else(|| ServiceError::InvalidState("no round is being played".into()))
}

fn playing_round(session: &mut Session) -> Result<&mut Round, ServiceError> {
    ensure_playing(session)?;
    current_round(&mut session.round)
}

/// Adjudicate a selection on the current question.
pub async fn answer(state: &SharedState, option: &str) -> Result<AnswerResponse, ServiceError> {
    state
        .with_session_mut(|session| {
            let round = playing_round(session)?;
            let adjudication = round.select_option(option)?;
            broadcast_answer_adjudicated(state.sse(), round, option, adjudication);
            Ok(AnswerResponse {
                adjudication,
                round: RoundView::from(&*round),
            })
        })
        .await
}

/// Credit the correct answer to `player` (or nobody) and move on.
///
/// Crediting the last question ends the round in the same step.
pub async fn attribute(
    state: &SharedState,
    player: Option<Uuid>,
) -> Result<ProgressResponse, ServiceError> {
    let (award, session) = state
        .with_session_step(|session| {
            if let Some(id) = player {
                if session.roster.find_player(id).is_none() {
                    return Err(ServiceError::NotFound(format!("player {id} is not registered")));
                }
            }
            ensure_playing(session)?;
            let round = current_round(&mut session.round)?;
            let (award, progress) = round.attribute(&mut session.roster, player)?;
            if let Some(award) = award {
                broadcast_score_changed(state.sse(), award);
            }
            after_progress(state, round, progress);
            Ok((award, finishing_event(progress)))
        })
        .await?;

    log_if_finished(&session);
    Ok(ProgressResponse {
        award: award.map(ScoreAwardView::from),
        session: SessionSnapshot::from(&session),
    })
}

/// Leave a question that was answered incorrectly.
pub async fn next(state: &SharedState) -> Result<ProgressResponse, ServiceError> {
    let ((), session) = state
        .with_session_step(|session| {
            let round = playing_round(session)?;
            let progress = round.advance()?;
            after_progress(state, round, progress);
            Ok(((), finishing_event(progress)))
        })
        .await?;

    log_if_finished(&session);
    Ok(ProgressResponse {
        award: None,
        session: SessionSnapshot::from(&session),
    })
}

fn after_progress(state: &SharedState, round: &Round, progress: RoundProgress) {
    if let RoundProgress::Next { index } = progress {
        debug!(index, "next question");
        broadcast_question_changed(state.sse(), round);
        state.questions().prefetch(round.upcoming_question());
    }
}

/// The event that closes the round once its last question is done.
fn finishing_event(progress: RoundProgress) -> Option<SessionEvent> {
    match progress {
        RoundProgress::Completed => Some(SessionEvent::RoundFinished),
        RoundProgress::Next { .. } => None,
    }
}

fn log_if_finished(session: &Session) {
    if session.phase == GamePhase::GameOver {
        info!(outcome = ?session.roster.outcome(), "round finished");
    }
}

/// Spend a lifeline for `team` on the current question.
///
/// Changing the question fetches a single replacement without holding the
/// session lock; if the question moved on meanwhile the replacement is dropped.
pub async fn use_lifeline(
    state: &SharedState,
    team: TeamSlot,
    kind: LifelineKind,
) -> Result<RoundView, ServiceError> {
    let outcome = state
        .with_session_mut(|session| {
            let request = replacement_request(session);
            let round = playing_round(session)?;
            let effect = round.use_lifeline(team, kind, &mut rand::rng())?;
            info!(team = ?team, kind = ?kind, "lifeline used");
            broadcast_question_changed(state.sse(), round);
            Ok(match effect {
                LifelineEffect::OptionsNarrowed(_) | LifelineEffect::SecondChanceArmed => {
                    LifelineOutcome::Applied(RoundView::from(&*round))
                }
                LifelineEffect::ReplacementRequested(ticket) => {
                    LifelineOutcome::Replace(ticket, request)
                }
            })
        })
        .await?;

    match outcome {
        LifelineOutcome::Applied(view) => Ok(view),
        LifelineOutcome::Replace(ticket, request) => replace_question(state, ticket, request).await,
    }
}

enum LifelineOutcome {
    Applied(RoundView),
    Replace(ReplacementTicket, Option<QuestionRequest>),
}

fn replacement_request(session: &Session) -> Option<QuestionRequest> {
    let settings = &session.settings;
    Some(QuestionRequest::new(
        settings.categories.clone()?,
        settings.difficulty?,
        1,
        session.mode,
        session.language,
    ))
}

async fn replace_question(
    state: &SharedState,
    ticket: ReplacementTicket,
    request: Option<QuestionRequest>,
) -> Result<RoundView, ServiceError> {
    let replacement = match request {
        Some(request) => state.questions().fetch_batch(request).await.into_iter().next(),
        None => None,
    };
    if let Some(question) = &replacement {
        state.questions().warm_first(std::slice::from_ref(question)).await;
    }

    state
        .with_session_mut(|session| {
            let round = playing_round(session)?;
            let Some(question) = replacement else {
                round.cancel_replacement(ticket);
                broadcast_question_changed(state.sse(), round);
                return Ok(RoundView::from(&*round));
            };
            match round.replace_current(ticket, unique_replacement(question, ticket)) {
                Ok(_) => broadcast_question_changed(state.sse(), round),
                Err(RoundError::StaleReplacement) => {
                    debug!(index = ticket.index, "discarding stale replacement question");
                }
                Err(err) => return Err(err.into()),
            }
            Ok(RoundView::from(&*round))
        })
        .await
}

/// Replacement ids must not collide with ids already in the batch.
fn unique_replacement(mut question: Question, ticket: ReplacementTicket) -> Question {
    question.id = format!("{}-swap-{}-{}", question.id, ticket.index, ticket.serial);
    question
}

/// Final results, available once the round is over.
pub async fn results(state: &SharedState) -> Result<ResultsResponse, ServiceError> {
    state
        .read_session(|session| {
            if session.phase != GamePhase::GameOver {
                return Err(ServiceError::InvalidState(format!(
                    "results are shown after the round (phase {:?})",
                    session.phase
                )));
            }
            Ok(ResultsResponse::from(&session.roster))
        })
        .await
}
