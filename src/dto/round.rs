use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{SessionSnapshot, TeamSummary},
    state::{
        game::Question,
        lifeline::LifelineKind,
        roster::{MatchOutcome, Mvp, Roster, ScoreAward, TeamSlot},
        round::{Adjudication, QuestionStatus, Round},
    },
};

/// Question as shown on screen. The answer and its explanation are only
/// revealed once the question is finalized.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question identifier within the round.
    pub id: String,
    /// Question wording.
    pub text: String,
    /// All four options in display order.
    pub options: Vec<String>,
    /// Illustration shown next to the question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// ISO country code for flag questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Correct option, revealed once finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Short note, revealed once finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionView {
    fn new(question: &Question, reveal: bool) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            options: question.options.clone(),
            image: question.image.clone(),
            country_code: question.country_code.clone(),
            correct_answer: reveal.then(|| question.correct_answer.clone()),
            explanation: question.explanation.clone().filter(|_| reveal),
        }
    }
}

/// Lifelines already spent, per team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsedLifelines {
    /// Lifelines spent by team A.
    pub team_a: Vec<LifelineKind>,
    /// Lifelines spent by team B.
    pub team_b: Vec<LifelineKind>,
}

/// Live view of the round in progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    /// Zero-based position of the current question.
    pub index: usize,
    /// Number of questions in the round.
    pub total: usize,
    /// Whether every question has been played.
    pub completed: bool,
    /// Question on screen, absent once complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Answer state of the current question.
    pub status: QuestionStatus,
    /// Options still selectable after lifelines and wrong guesses.
    pub visible_options: Vec<String>,
    /// Option picked so far, if any.
    pub selected: Option<String>,
    /// Whether a double chance is armed.
    pub double_chance: bool,
    /// Countdown units left.
    pub remaining: u32,
    /// Whether the countdown is ticking.
    pub countdown_running: bool,
    /// Whether a replacement question is being fetched.
    pub replacement_pending: bool,
    /// Lifeline shaping the current question.
    pub active_lifeline: Option<LifelineKind>,
    /// Lifelines already spent this round.
    pub used_lifelines: UsedLifelines,
}

impl From<&Round> for RoundView {
    fn from(round: &Round) -> Self {
        let state = round.state();
        let reveal = state.status.is_finalized();
        Self {
            index: round.index(),
            total: round.len(),
            completed: round.is_complete(),
            question: round
                .current_question()
                .map(|question| QuestionView::new(question, reveal)),
            status: state.status,
            visible_options: state.visible_options.clone(),
            selected: state.selected.clone(),
            double_chance: state.double_chance,
            remaining: state.remaining,
            countdown_running: state.countdown_running,
            replacement_pending: state.pending_replacement.is_some(),
            active_lifeline: round.active_lifeline(),
            used_lifelines: UsedLifelines {
                team_a: round.ledger().used_kinds(TeamSlot::A),
                team_b: round.ledger().used_kinds(TeamSlot::B),
            },
        }
    }
}

/// Select one of the visible options.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Exact text of the chosen option.
    #[validate(length(min = 1))]
    pub option: String,
}

/// Adjudication of a selection together with the updated round.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Verdict on the selection.
    pub adjudication: Adjudication,
    /// Round after the selection.
    pub round: RoundView,
}

/// Attribute a correct answer. A missing player is an anonymous attribution.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AttributeRequest {
    /// Player credited with the answer.
    #[serde(default)]
    pub player_id: Option<Uuid>,
}

/// Score change caused by an attribution.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreAwardView {
    /// Team of the credited player.
    pub team: TeamSlot,
    /// Credited player.
    pub player_id: Uuid,
    /// Player total after the award.
    pub player_score: u32,
    /// Team total after the award.
    pub team_score: u32,
}

impl From<ScoreAward> for ScoreAwardView {
    fn from(award: ScoreAward) -> Self {
        Self {
            team: award.slot,
            player_id: award.player_id,
            player_score: award.player_score,
            team_score: award.team_score,
        }
    }
}

/// Result of attributing or advancing: the award, if any, and where the session ended up.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    /// Award granted, if the answer was attributed to a player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub award: Option<ScoreAwardView>,
    /// Session after the step.
    pub session: SessionSnapshot,
}

/// Spend a lifeline for a team on the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LifelineRequest {
    /// Team spending the lifeline.
    pub team: TeamSlot,
    /// Lifeline to spend.
    pub kind: LifelineKind,
}

/// Most valuable player. `show_panel` is false on a tie or a zero score.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MvpView {
    /// Team of the player.
    pub team: TeamSlot,
    /// Player identifier.
    pub player_id: Uuid,
    /// Display name.
    pub name: String,
    /// Points earned this match.
    pub score: u32,
    /// Whether the MVP panel should be shown.
    pub show_panel: bool,
}

impl From<Mvp> for MvpView {
    fn from(mvp: Mvp) -> Self {
        Self {
            team: mvp.slot,
            player_id: mvp.player_id,
            name: mvp.name,
            score: mvp.score,
            show_panel: mvp.show_panel,
        }
    }
}

/// Final results shown on the game-over screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    /// Winner, or a draw.
    pub outcome: MatchOutcome,
    /// Teams with their players sorted by score, highest first.
    pub teams: Vec<TeamSummary>,
    /// Most valuable player, if anyone played.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvp: Option<MvpView>,
}

impl From<&Roster> for ResultsResponse {
    fn from(roster: &Roster) -> Self {
        let teams = roster
            .teams()
            .into_iter()
            .map(|team| {
                let mut summary = TeamSummary::from(team);
                // Stable sort keeps registration order among equal scores.
                summary.players.sort_by(|a, b| b.score.cmp(&a.score));
                summary
            })
            .collect();
        Self {
            outcome: roster.outcome(),
            teams,
            mvp: roster.mvp().map(MvpView::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::round::DEFAULT_COUNTDOWN;

    fn question() -> Question {
        Question {
            id: "q0".into(),
            text: "Capital of Oman?".into(),
            options: vec!["Muscat".into(), "Doha".into(), "Sanaa".into(), "Manama".into()],
            correct_answer: "Muscat".into(),
            image: None,
            explanation: Some("Muscat is the capital.".into()),
            country_code: None,
        }
    }

    #[test]
    fn answer_is_hidden_until_the_question_is_finalized() {
        let mut round = Round::new(vec![question()], DEFAULT_COUNTDOWN).unwrap();
        let view = RoundView::from(&round);
        let shown = view.question.unwrap();
        assert_eq!(shown.correct_answer, None);
        assert_eq!(shown.explanation, None);

        round.select_option("Doha").unwrap();
        let view = RoundView::from(&round);
        assert_eq!(view.status, QuestionStatus::Incorrect);
        let shown = view.question.unwrap();
        assert_eq!(shown.correct_answer.as_deref(), Some("Muscat"));
        assert!(shown.explanation.is_some());
    }

    #[test]
    fn results_sort_players_by_score() {
        let mut roster = Roster::new();
        let first = roster.add_player(TeamSlot::A, "Sami").unwrap();
        let second = roster.add_player(TeamSlot::A, "Hala").unwrap();
        roster.add_player(TeamSlot::B, "Noor").unwrap();
        roster.apply_correct_answer(Some(second));
        roster.apply_correct_answer(Some(second));
        roster.apply_correct_answer(Some(first));

        let results = ResultsResponse::from(&roster);
        assert_eq!(results.outcome, MatchOutcome::Winner(TeamSlot::A));
        assert_eq!(results.teams[0].players[0].name, "Hala");
        assert_eq!(results.teams[0].players[1].name, "Sami");
        let mvp = results.mvp.unwrap();
        assert_eq!(mvp.name, "Hala");
        assert!(mvp.show_panel);
    }
}
