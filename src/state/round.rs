//! Round controller: question sequencing, answer adjudication, attribution,
//! lifeline effects and the per-question countdown.
//!
//! The countdown is presentational. Reaching zero stops it but never
//! finalizes the question; only a selection does.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    game::Question,
    lifeline::{
        LifelineEffect, LifelineError, LifelineKind, LifelineLedger, ReplacementTicket,
        fifty_fifty,
    },
    roster::{PlayerId, Roster, ScoreAward, TeamSlot},
};

/// Units on the countdown when a question becomes current.
pub const DEFAULT_COUNTDOWN: u32 = 60;

/// Lifecycle of the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// Waiting for a selection.
    Unanswered,
    /// Finalized correct; a scorer must be attributed before advancing.
    AwaitingAttribution,
    /// Finalized incorrect; advancing is manual.
    Incorrect,
}

impl QuestionStatus {
    /// True once the question can no longer be answered.
    pub fn is_finalized(self) -> bool {
        !matches!(self, QuestionStatus::Unanswered)
    }
}

/// Result of adjudicating one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Adjudication {
    /// The selection matches the correct option.
    Correct,
    /// Wrong, but a double chance absorbed it; the team may select again.
    SecondChance,
    /// Wrong, and no double chance remained.
    Incorrect,
}

/// Where the round stands after leaving a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundProgress {
    /// Another question is now current.
    Next {
        /// Position of the new current question.
        index: usize,
    },
    /// Every question has been played.
    Completed,
}

/// Outcome of a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Countdown units left after this tick.
    Remaining(u32),
    /// Reached zero on this tick. No scoring side effect.
    Expired,
    /// The ticket no longer matches a running countdown; the timer must stop.
    Stopped,
}

/// Identifies the question currently on screen, including replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionTicket {
    /// Position of the question in the round.
    pub index: usize,
    /// Bumped whenever the question at `index` is replaced.
    pub serial: u64,
}

/// Errors raised by round operations. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The round was built without questions.
    #[error("a round needs at least one question")]
    NoQuestions,
    /// Every question has been played.
    #[error("the round is complete")]
    RoundComplete,
    /// The current question is already answered.
    #[error("the current question is already answered")]
    QuestionFinalized,
    /// The option is not visible on the current question.
    #[error("option `{0}` is not selectable")]
    OptionUnavailable(String),
    /// A correct answer still needs a scorer.
    #[error("a scorer must be attributed before continuing")]
    AttributionPending,
    /// No correct answer is waiting for a scorer.
    #[error("no correct answer is waiting for attribution")]
    AttributionNotExpected,
    /// The current question has not been answered yet.
    #[error("the current question has not been answered yet")]
    NotFinalized,
    /// The replacement targets a question no longer on screen.
    #[error("the replacement no longer matches the current question")]
    StaleReplacement,
}

/// Per-question interaction state, reset whenever a question becomes current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionState {
    /// Answer state of the question.
    pub status: QuestionStatus,
    /// Options still selectable.
    pub visible_options: Vec<String>,
    /// Option picked so far.
    pub selected: Option<String>,
    /// Whether a double chance is armed.
    pub double_chance: bool,
    /// Wrong guesses absorbed on this question.
    pub wrong_guesses: u8,
    /// Countdown units left.
    pub remaining: u32,
    /// Whether the countdown is ticking.
    pub countdown_running: bool,
    /// Replacement being fetched for this question.
    pub pending_replacement: Option<ReplacementTicket>,
}

impl QuestionState {
    fn fresh(question: &Question, countdown: u32) -> Self {
        Self {
            status: QuestionStatus::Unanswered,
            visible_options: question.options.clone(),
            selected: None,
            double_chance: false,
            wrong_guesses: 0,
            remaining: countdown,
            countdown_running: true,
            pending_replacement: None,
        }
    }

    fn finalize(&mut self, status: QuestionStatus) {
        self.status = status;
        self.countdown_running = false;
        self.pending_replacement = None;
    }
}

/// An ordered batch of questions played to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    questions: Vec<Question>,
    index: usize,
    serial: u64,
    countdown: u32,
    ledger: LifelineLedger,
    active_lifeline: Option<LifelineKind>,
    current: QuestionState,
}

impl Round {
    /// Start a round on its first question.
    pub fn new(questions: Vec<Question>, countdown: u32) -> Result<Self, RoundError> {
        let first = questions.first().ok_or(RoundError::NoQuestions)?;
        let current = QuestionState::fresh(first, countdown);
        Ok(Self {
            questions,
            index: 0,
            serial: 0,
            countdown,
            ledger: LifelineLedger::default(),
            active_lifeline: None,
            current,
        })
    }

    /// Number of questions in the round.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Never true for a round built through [`Round::new`].
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 0-based position; equals [`Round::len`] once the round is complete.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once every question has been played.
    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// Question on screen; `None` once complete.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// The question after the current one, used for image prefetching.
    pub fn upcoming_question(&self) -> Option<&Question> {
        self.questions.get(self.index + 1)
    }

    /// Interaction state of the current question.
    pub fn state(&self) -> &QuestionState {
        &self.current
    }

    /// Lifelines spent this round.
    pub fn ledger(&self) -> &LifelineLedger {
        &self.ledger
    }

    /// Lifeline currently shaping the question on screen, if any.
    pub fn active_lifeline(&self) -> Option<LifelineKind> {
        self.active_lifeline
    }

    /// Ticket identifying the question on screen.
    pub fn ticket(&self) -> QuestionTicket {
        QuestionTicket {
            index: self.index,
            serial: self.serial,
        }
    }

    fn ensure_in_progress(&self) -> Result<&Question, RoundError> {
        self.current_question().ok_or(RoundError::RoundComplete)
    }

    /// Adjudicate a selection on the current question.
    ///
    /// A correct selection finalizes the question and opens the attribution
    /// step. A wrong one finalizes it as incorrect unless a double chance is
    /// armed and unspent, in which case the option is removed and the team may
    /// select again.
    pub fn select_option(&mut self, option: &str) -> Result<Adjudication, RoundError> {
        let question = self.ensure_in_progress()?;
        match self.current.status {
            QuestionStatus::Unanswered => {}
            QuestionStatus::AwaitingAttribution => return Err(RoundError::AttributionPending),
            QuestionStatus::Incorrect => return Err(RoundError::QuestionFinalized),
        }
        if !self.current.visible_options.iter().any(|o| o == option) {
            return Err(RoundError::OptionUnavailable(option.to_owned()));
        }

        let correct = question.is_correct(option);
        self.current.selected = Some(option.to_owned());

        if correct {
            self.current.finalize(QuestionStatus::AwaitingAttribution);
            return Ok(Adjudication::Correct);
        }

        if self.current.double_chance && self.current.wrong_guesses == 0 {
            self.current.wrong_guesses = 1;
            self.current.visible_options.retain(|o| o != option);
            return Ok(Adjudication::SecondChance);
        }

        self.current.wrong_guesses = self.current.wrong_guesses.saturating_add(1);
        self.current.finalize(QuestionStatus::Incorrect);
        Ok(Adjudication::Incorrect)
    }

    /// Record who scored the correct answer, credit the roster and advance.
    ///
    /// `None` is an anonymous attribution and scores nobody.
    pub fn attribute(
        &mut self,
        roster: &mut Roster,
        player: Option<PlayerId>,
    ) -> Result<(Option<ScoreAward>, RoundProgress), RoundError> {
        self.ensure_in_progress()?;
        if self.current.status != QuestionStatus::AwaitingAttribution {
            return Err(RoundError::AttributionNotExpected);
        }
        let award = roster.apply_correct_answer(player);
        Ok((award, self.move_forward()))
    }

    /// Manually leave a question that was finalized as incorrect.
    pub fn advance(&mut self) -> Result<RoundProgress, RoundError> {
        self.ensure_in_progress()?;
        match self.current.status {
            QuestionStatus::Incorrect => Ok(self.move_forward()),
            QuestionStatus::AwaitingAttribution => Err(RoundError::AttributionPending),
            QuestionStatus::Unanswered => Err(RoundError::NotFinalized),
        }
    }

    fn move_forward(&mut self) -> RoundProgress {
        self.index += 1;
        self.serial += 1;
        self.active_lifeline = None;
        match self.questions.get(self.index) {
            Some(next) => {
                self.current = QuestionState::fresh(next, self.countdown);
                RoundProgress::Next { index: self.index }
            }
            None => {
                self.current.finalize(self.current.status);
                RoundProgress::Completed
            }
        }
    }

    /// Spend `kind` for `slot` on the current question and apply its effect.
    pub fn use_lifeline<R: Rng + ?Sized>(
        &mut self,
        slot: TeamSlot,
        kind: LifelineKind,
        rng: &mut R,
    ) -> Result<LifelineEffect, LifelineError> {
        let question = self.current_question().ok_or(LifelineError::RoundComplete)?;
        if self.current.status.is_finalized() {
            return Err(LifelineError::QuestionFinalized);
        }
        if self.current.pending_replacement.is_some() {
            return Err(LifelineError::ReplacementPending);
        }
        self.ledger.ensure_available(slot, kind)?;

        let effect = match kind {
            LifelineKind::FiftyFifty => {
                let kept = fifty_fifty(
                    &question.options,
                    &self.current.visible_options,
                    &question.correct_answer,
                    rng,
                );
                self.current.visible_options = kept.clone();
                LifelineEffect::OptionsNarrowed(kept)
            }
            LifelineKind::DoubleChance => {
                self.current.double_chance = true;
                LifelineEffect::SecondChanceArmed
            }
            LifelineKind::ChangeQuestion => {
                let ticket = ReplacementTicket {
                    index: self.index,
                    serial: self.serial,
                };
                self.current.pending_replacement = Some(ticket);
                LifelineEffect::ReplacementRequested(ticket)
            }
        };

        self.ledger.consume(slot, kind)?;
        self.active_lifeline = Some(kind);
        Ok(effect)
    }

    /// Swap the current question for a replacement, keeping length and index.
    ///
    /// Rejected when the question moved on, was answered, or was already
    /// replaced since the ticket was issued.
    pub fn replace_current(
        &mut self,
        ticket: ReplacementTicket,
        replacement: Question,
    ) -> Result<QuestionTicket, RoundError> {
        if self.current.pending_replacement != Some(ticket)
            || ticket.index != self.index
            || ticket.serial != self.serial
            || self.current.status.is_finalized()
        {
            return Err(RoundError::StaleReplacement);
        }
        let slot = self
            .questions
            .get_mut(self.index)
            .ok_or(RoundError::RoundComplete)?;
        *slot = replacement;
        self.serial += 1;
        self.active_lifeline = None;
        self.current = QuestionState::fresh(&self.questions[self.index], self.countdown);
        Ok(self.ticket())
    }

    /// Drop an outstanding replacement request (e.g. the fetch produced nothing).
    pub fn cancel_replacement(&mut self, ticket: ReplacementTicket) {
        if self.current.pending_replacement == Some(ticket) {
            self.current.pending_replacement = None;
        }
    }

    /// Advance the countdown of the question identified by `ticket` by one unit.
    pub fn tick(&mut self, ticket: QuestionTicket) -> CountdownTick {
        if ticket != self.ticket() || !self.current.countdown_running || self.is_complete() {
            return CountdownTick::Stopped;
        }
        self.current.remaining = self.current.remaining.saturating_sub(1);
        if self.current.remaining == 0 {
            self.current.countdown_running = false;
            CountdownTick::Expired
        } else {
            CountdownTick::Remaining(self.current.remaining)
        }
    }
}
