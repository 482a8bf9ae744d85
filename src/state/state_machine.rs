use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    game::{
        Category, CategorySet, Difficulty, Language, MatchSettings, Mode, Question, Settings,
        draw_tournament_categories,
    },
    roster::Roster,
    round::{DEFAULT_COUNTDOWN, Round},
};

/// Screens the session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Nobody is signed in.
    Login,
    /// Mode selection and entry to the online hub.
    MainMenu,
    /// Create or join a match through a match code.
    OnlineMenu,
    /// Team and player registration.
    Setup,
    /// Difficulty tier choice (and tournament label).
    Difficulty,
    /// Category choice.
    Category,
    /// Questions are being acquired for the round.
    Loading,
    /// A round is in progress.
    Playing,
    /// Final scoreboard.
    GameOver,
    /// The first batch could not be produced; only a return to the menu is offered.
    AcquisitionFailed,
}

const FULL_FLOW: &[GamePhase] = &[GamePhase::Setup, GamePhase::Difficulty, GamePhase::Category];
const KIDS_FLOW: &[GamePhase] = &[GamePhase::Setup, GamePhase::Category];
const TOURNAMENT_FLOW: &[GamePhase] = &[GamePhase::Setup, GamePhase::Difficulty];

/// Ordered setup phases a mode walks through before its round is acquired.
///
/// A flow without [`GamePhase::Difficulty`] plays on the mode's forced tier;
/// a flow without [`GamePhase::Category`] draws three tournament categories.
pub fn setup_flow(mode: Mode) -> &'static [GamePhase] {
    match mode {
        Mode::Classic | Mode::Students => FULL_FLOW,
        Mode::Kids => KIDS_FLOW,
        Mode::LocalTournament => TOURNAMENT_FLOW,
    }
}

/// Phase that follows `current` in the mode's flow; [`GamePhase::Loading`] after the last step.
fn next_step(mode: Mode, current: GamePhase) -> GamePhase {
    let flow = setup_flow(mode);
    flow.iter()
        .position(|phase| *phase == current)
        .and_then(|pos| flow.get(pos + 1))
        .copied()
        .unwrap_or(GamePhase::Loading)
}

/// Phase that precedes `current` in the mode's flow; [`GamePhase::MainMenu`] before the first step.
fn previous_step(mode: Mode, current: GamePhase) -> GamePhase {
    let flow = setup_flow(mode);
    flow.iter()
        .position(|phase| *phase == current)
        .and_then(|pos| pos.checked_sub(1))
        .and_then(|pos| flow.get(pos))
        .copied()
        .unwrap_or(GamePhase::MainMenu)
}

/// Events that can be applied to a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The identity store reported a signed-in user.
    LoggedIn,
    /// The user signed out; everything is reset.
    LoggedOut,
    /// Change the session language.
    SetLanguage(Language),
    /// Enter the online hub from the main menu.
    OpenOnlineMenu,
    /// Pick a game mode from the main menu.
    SelectMode(Mode),
    /// Rosters are ready; continue with the mode's next step.
    SetupComplete,
    /// Difficulty picked; tournaments also carry their label here.
    ChooseDifficulty {
        /// Difficulty of the round.
        difficulty: Difficulty,
        /// Tournament label; blank falls back to the localized default.
        tournament_name: Option<String>,
    },
    /// Categories picked from the mode's pool.
    ChooseCategory(CategorySet),
    /// A decoded match code; bypasses the setup phases.
    JoinMatch(MatchSettings),
    /// Acquisition for the loading attempt identified by `ticket` produced questions.
    RoundReady {
        /// Loading attempt the questions belong to.
        ticket: u64,
        /// Validated questions in play order.
        questions: Vec<Question>,
    },
    /// Acquisition for the loading attempt identified by `ticket` produced nothing.
    AcquisitionFailed {
        /// Loading attempt that failed.
        ticket: u64,
    },
    /// The round reached its last question.
    RoundFinished,
    /// Step back to the previous screen.
    Back,
    /// Reset everything and return to the main menu.
    Restart,
}

impl SessionEvent {
    /// Stable name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::LoggedIn => "logged_in",
            SessionEvent::LoggedOut => "logged_out",
            SessionEvent::SetLanguage(_) => "set_language",
            SessionEvent::OpenOnlineMenu => "open_online_menu",
            SessionEvent::SelectMode(_) => "select_mode",
            SessionEvent::SetupComplete => "setup_complete",
            SessionEvent::ChooseDifficulty { .. } => "choose_difficulty",
            SessionEvent::ChooseCategory(_) => "choose_category",
            SessionEvent::JoinMatch(_) => "join_match",
            SessionEvent::RoundReady { .. } => "round_ready",
            SessionEvent::AcquisitionFailed { .. } => "acquisition_failed",
            SessionEvent::RoundFinished => "round_finished",
            SessionEvent::Back => "back",
            SessionEvent::Restart => "restart",
        }
    }
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the event was received.
    pub from: GamePhase,
    /// Name of the rejected event.
    pub event: &'static str,
}

/// Reasons the reducer refuses an event. The session is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not accepted in the current phase.
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
    /// The chosen category is not part of the mode's pool.
    #[error("category {category:?} is not offered in {mode:?} mode")]
    CategoryOutsidePool {
        /// Category that was refused.
        category: Category,
        /// Mode whose pool was checked.
        mode: Mode,
    },
    /// Standard play takes exactly one category; mixes come from tournaments and codes.
    #[error("exactly one category is chosen per round (got {count})")]
    MixedCategoryChoice {
        /// Number of categories submitted.
        count: usize,
    },
    /// An acquisition result arrived for a loading attempt that was superseded.
    #[error("acquisition result {ticket} is stale (session is at version {version})")]
    StaleResult {
        /// Ticket the result was fetched for.
        ticket: u64,
        /// Current session version.
        version: u64,
    },
}

/// The whole game session: one owned value, replaced on every accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Screen the session is on.
    pub phase: GamePhase,
    /// Selected game mode.
    pub mode: Mode,
    /// Language questions are generated in.
    pub language: Language,
    /// Difficulty, categories and tournament label captured so far.
    pub settings: Settings,
    /// Both teams and their players.
    pub roster: Roster,
    /// Round being played or just finished.
    pub round: Option<Round>,
    /// Incremented on every accepted event.
    pub version: u64,
    /// Countdown length for each question of the next round.
    pub countdown_secs: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Language::default(), DEFAULT_COUNTDOWN)
    }
}

impl Session {
    /// Fresh session waiting for a login.
    pub fn new(language: Language, countdown_secs: u32) -> Self {
        Self {
            phase: GamePhase::Login,
            mode: Mode::default(),
            language,
            settings: Settings::default(),
            roster: Roster::new(),
            round: None,
            version: 0,
            countdown_secs,
        }
    }

    /// Ticket identifying the current loading attempt, if one is in progress.
    pub fn acquisition_ticket(&self) -> Option<u64> {
        (self.phase == GamePhase::Loading).then_some(self.version)
    }

    /// Everything except language and timing goes back to its initial value.
    fn reset(&self, phase: GamePhase) -> Session {
        Session {
            phase,
            version: self.version,
            ..Session::new(self.language, self.countdown_secs)
        }
    }

    fn begin_loading(&mut self) {
        self.round = None;
        self.phase = GamePhase::Loading;
    }
}

/// Apply `event` to `session`, producing the next session.
///
/// Randomness is only consumed when a tournament draws its categories.
pub fn reduce<R: Rng + ?Sized>(
    session: &Session,
    event: SessionEvent,
    rng: &mut R,
) -> Result<Session, TransitionError> {
    let from = session.phase;
    let invalid = |event: &SessionEvent| {
        TransitionError::Invalid(InvalidTransition {
            from,
            event: event.name(),
        })
    };

    let mut next = session.clone();
    match (from, &event) {
        (GamePhase::Login, SessionEvent::LoggedIn) => {
            next.phase = GamePhase::MainMenu;
        }
        (_, SessionEvent::LoggedOut) => {
            next = session.reset(GamePhase::Login);
        }
        (GamePhase::Loading | GamePhase::Playing, SessionEvent::SetLanguage(_)) => {
            return Err(invalid(&event));
        }
        (_, SessionEvent::SetLanguage(language)) => {
            next.language = *language;
        }
        (GamePhase::MainMenu, SessionEvent::OpenOnlineMenu) => {
            next.phase = GamePhase::OnlineMenu;
        }
        (GamePhase::MainMenu, SessionEvent::SelectMode(mode)) => {
            next.mode = *mode;
            next.settings = Settings {
                difficulty: mode.forced_difficulty(),
                ..Settings::default()
            };
            next.phase = GamePhase::Setup;
        }
        (GamePhase::Setup, SessionEvent::SetupComplete) => {
            next.phase = next_step(session.mode, GamePhase::Setup);
            if next.phase == GamePhase::Loading {
                next.begin_loading();
            }
        }
        (
            GamePhase::Difficulty,
            SessionEvent::ChooseDifficulty {
                difficulty,
                tournament_name,
            },
        ) => {
            let mode = session.mode;
            next.settings.difficulty = Some(mode.forced_difficulty().unwrap_or(*difficulty));
            next.settings.tournament_name = match mode {
                Mode::LocalTournament => Some(
                    tournament_name
                        .as_deref()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_owned)
                        .unwrap_or_else(|| session.language.local_tournament_label().to_owned()),
                ),
                _ => None,
            };
            if !setup_flow(mode).contains(&GamePhase::Category) {
                next.settings.categories = Some(draw_tournament_categories(rng));
            }
            next.phase = next_step(mode, GamePhase::Difficulty);
            if next.phase == GamePhase::Loading {
                next.begin_loading();
            }
        }
        (GamePhase::Category, SessionEvent::ChooseCategory(categories)) => {
            if categories.len() != 1 {
                return Err(TransitionError::MixedCategoryChoice {
                    count: categories.len(),
                });
            }
            let mode = session.mode;
            let pool = mode.category_pool();
            if let Some(category) = categories.as_slice().iter().find(|c| !pool.contains(*c)) {
                return Err(TransitionError::CategoryOutsidePool {
                    category: *category,
                    mode,
                });
            }
            next.settings.categories = Some(categories.clone());
            if let Some(forced) = mode.forced_difficulty() {
                next.settings.difficulty = Some(forced);
            }
            next.phase = next_step(mode, GamePhase::Category);
            if next.phase == GamePhase::Loading {
                next.begin_loading();
            }
        }
        (GamePhase::OnlineMenu, SessionEvent::JoinMatch(settings)) => {
            next.mode = Mode::Classic;
            next.settings = Settings {
                difficulty: Some(settings.difficulty),
                categories: Some(settings.categories.clone()),
                tournament_name: settings.tournament_name.clone(),
            };
            next.begin_loading();
        }
        (GamePhase::Loading, SessionEvent::RoundReady { ticket, questions }) => {
            if *ticket != session.version {
                return Err(TransitionError::StaleResult {
                    ticket: *ticket,
                    version: session.version,
                });
            }
            match Round::new(questions.clone(), session.countdown_secs) {
                Ok(round) => {
                    next.round = Some(round);
                    next.phase = GamePhase::Playing;
                }
                Err(_) => next.phase = GamePhase::AcquisitionFailed,
            }
        }
        (GamePhase::Loading, SessionEvent::AcquisitionFailed { ticket }) => {
            if *ticket != session.version {
                return Err(TransitionError::StaleResult {
                    ticket: *ticket,
                    version: session.version,
                });
            }
            next.phase = GamePhase::AcquisitionFailed;
        }
        (GamePhase::Playing, SessionEvent::RoundFinished) => {
            if !session.round.as_ref().is_some_and(Round::is_complete) {
                return Err(invalid(&event));
            }
            next.phase = GamePhase::GameOver;
        }
        (GamePhase::OnlineMenu, SessionEvent::Back) => {
            next.phase = GamePhase::MainMenu;
        }
        (GamePhase::Setup | GamePhase::Difficulty | GamePhase::Category, SessionEvent::Back) => {
            next.phase = previous_step(session.mode, from);
        }
        (GamePhase::Loading | GamePhase::AcquisitionFailed, SessionEvent::Back) => {
            next.round = None;
            next.phase = GamePhase::MainMenu;
        }
        (GamePhase::Login, SessionEvent::Restart) => return Err(invalid(&event)),
        (_, SessionEvent::Restart) => {
            next = session.reset(GamePhase::MainMenu);
        }
        _ => return Err(invalid(&event)),
    }

    next.version = session.version + 1;
    Ok(next)
}
