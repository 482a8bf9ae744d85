/// Modes, categories, difficulties and question records.
pub mod game;
/// Per-round lifeline bookkeeping.
pub mod lifeline;
/// Teams, players and scoring.
pub mod roster;
/// Question sequence and per-question interaction.
pub mod round;
mod sse;
/// Session phases and the reducer that moves between them.
pub mod state_machine;

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::{sync::Mutex, task::AbortHandle};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::identity::IdentityStore,
    error::ServiceError,
    services::{
        countdown,
        question_service::QuestionPipeline,
        sse_events::{broadcast_countdown, broadcast_phase_changed},
    },
    state::{
        round::{CountdownTick, QuestionTicket},
        state_machine::{GamePhase, Session, SessionEvent, TransitionError},
    },
};

pub use self::sse::SseHub;

/// Application state shared across handlers.
pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 64;

/// Countdown task currently driving a question.
struct RunningCountdown {
    ticket: QuestionTicket,
    handle: AbortHandle,
}

/// Central application state: the one session and its collaborators.
///
/// Every session mutation goes through the session mutex, so transitions never
/// interleave and observers always see them in order.
pub struct AppState {
    config: AppConfig,
    session: Mutex<Session>,
    sse: SseHub,
    questions: QuestionPipeline,
    identity: Arc<dyn IdentityStore>,
    countdown: StdMutex<Option<RunningCountdown>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        questions: QuestionPipeline,
        identity: Arc<dyn IdentityStore>,
    ) -> SharedState {
        let session = Session::new(config.default_language, config.countdown_secs);
        Arc::new(Self {
            config,
            session: Mutex::new(session),
            sse: SseHub::new(SSE_CAPACITY),
            questions,
            identity,
            countdown: StdMutex::new(None),
        })
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Question acquisition pipeline.
    pub fn questions(&self) -> &QuestionPipeline {
        &self.questions
    }

    /// Login and signup persistence.
    pub fn identity(&self) -> &dyn IdentityStore {
        self.identity.as_ref()
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Read from the session without cloning all of it.
    pub async fn read_session<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let guard = self.session.lock().await;
        f(&guard)
    }

    /// Run `f` against the session while holding the session lock, then bring
    /// the countdown task in line with the question on screen.
    ///
    /// `f` must leave the session untouched when it returns an error.
    pub async fn with_session_mut<T>(
        self: &Arc<Self>,
        f: impl FnOnce(&mut Session) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut guard = self.session.lock().await;
        let value = f(&mut guard)?;
        self.sync_countdown(&guard);
        Ok(value)
    }

    /// Run `f` under the session lock and, when it names a follow-up event,
    /// reduce that event before the lock is released.
    ///
    /// Observers never see the state between the two steps. Returns the
    /// value of `f` and the session as it stands after both.
    pub async fn with_session_step<T>(
        self: &Arc<Self>,
        f: impl FnOnce(&mut Session) -> Result<(T, Option<SessionEvent>), ServiceError>,
    ) -> Result<(T, Session), ServiceError> {
        let mut guard = self.session.lock().await;
        let (value, follow_up) = f(&mut guard)?;
        let outcome = match follow_up {
            Some(event) => self.reduce_locked(&mut guard, event),
            None => Ok(()),
        };
        self.sync_countdown(&guard);
        outcome?;
        Ok((value, guard.clone()))
    }

    /// Apply a session event through the reducer and broadcast the new snapshot.
    pub async fn dispatch(self: &Arc<Self>, event: SessionEvent) -> Result<Session, ServiceError> {
        let mut guard = self.session.lock().await;
        self.reduce_locked(&mut guard, event)?;
        self.sync_countdown(&guard);
        Ok(guard.clone())
    }

    /// Reduce `event` into the locked session and broadcast the result.
    /// A rejected event leaves the session untouched.
    fn reduce_locked(
        &self,
        session: &mut Session,
        event: SessionEvent,
    ) -> Result<(), ServiceError> {
        let from = session.phase;
        let name = event.name();

        let next = match state_machine::reduce(session, event, &mut rand::rng()) {
            Ok(next) => next,
            Err(TransitionError::StaleResult { ticket, version }) => {
                debug!(ticket, version, event = name, "discarding stale acquisition result");
                return Err(ServiceError::InvalidState("acquisition result is stale".into()));
            }
            Err(err) => {
                debug!(phase = ?from, event = name, error = %err, "rejected session event");
                return Err(err.into());
            }
        };

        if next.phase != from {
            info!(
                from = ?from,
                to = ?next.phase,
                event = name,
                version = next.version,
                "session transition"
            );
        }
        *session = next;
        broadcast_phase_changed(&self.sse, session);
        Ok(())
    }

    /// Advance the countdown identified by `ticket` by one unit and publish it.
    pub async fn tick_countdown(&self, ticket: QuestionTicket) -> CountdownTick {
        let mut guard = self.session.lock().await;
        if guard.phase != GamePhase::Playing {
            return CountdownTick::Stopped;
        }
        let Some(round) = guard.round.as_mut() else {
            return CountdownTick::Stopped;
        };
        let tick = round.tick(ticket);
        let remaining = match tick {
            CountdownTick::Remaining(remaining) => remaining,
            CountdownTick::Expired => 0,
            CountdownTick::Stopped => return tick,
        };
        if let Some(question) = round.current_question() {
            broadcast_countdown(&self.sse, &question.id, remaining);
        }
        tick
    }

    /// Start, keep or stop the countdown task so that exactly the question on
    /// screen is counting down. Called with the session lock held.
    fn sync_countdown(self: &Arc<Self>, session: &Session) {
        let wanted = session
            .round
            .as_ref()
            .filter(|_| session.phase == GamePhase::Playing)
            .filter(|round| round.state().countdown_running)
            .and_then(|round| Some((round.ticket(), round.current_question()?.id.clone())));

        let mut slot = self.countdown_slot();
        let current = slot.as_ref().map(|running| running.ticket);
        match wanted {
            Some((ticket, _)) if current == Some(ticket) => {}
            Some((ticket, question_id)) => {
                let handle = countdown::spawn(self.clone(), ticket, question_id);
                if let Some(previous) = slot.replace(RunningCountdown { ticket, handle }) {
                    previous.handle.abort();
                }
            }
            None => {
                if let Some(previous) = slot.take() {
                    previous.handle.abort();
                }
            }
        }
    }

    fn countdown_slot(&self) -> MutexGuard<'_, Option<RunningCountdown>> {
        match self.countdown.lock() {
            Ok(slot) => slot,
            Err(poisoned) => {
                warn!("countdown slot lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}
