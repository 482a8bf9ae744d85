//! Single-use lifelines: the per-team usage ledger and the option-narrowing effect.

use std::collections::HashSet;

use rand::{Rng, seq::IndexedRandom, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::roster::TeamSlot;

/// Lifeline kinds a team can spend once per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifelineKind {
    /// Tolerate one wrong guess on the current question.
    DoubleChance,
    /// Hide two wrong options.
    FiftyFifty,
    /// Swap the current question for a fresh one.
    ChangeQuestion,
}

/// Reasons a lifeline request is rejected. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifelineError {
    /// The team already spent this kind this round.
    #[error("team {slot:?} already used {kind:?} this round")]
    AlreadyUsed {
        /// Team that asked for the lifeline.
        slot: TeamSlot,
        /// Lifeline that was asked for.
        kind: LifelineKind,
    },
    /// The current question is already answered.
    #[error("the current question is already answered")]
    QuestionFinalized,
    /// A replacement is still being fetched.
    #[error("a replacement question is still being fetched")]
    ReplacementPending,
    /// No question is left to play.
    #[error("the round is complete")]
    RoundComplete,
}

/// Effect a successfully consumed lifeline had on the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifelineEffect {
    /// Only these options remain selectable.
    OptionsNarrowed(Vec<String>),
    /// One extra wrong guess is tolerated on the current question.
    SecondChanceArmed,
    /// A single replacement question must be fetched for the current position.
    ReplacementRequested(ReplacementTicket),
}

/// Identifies the question a replacement was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplacementTicket {
    /// Position of the question being replaced.
    pub index: usize,
    /// Serial of the question when the swap was requested.
    pub serial: u64,
}

/// Which lifeline kinds each team has consumed this round (set semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifelineLedger {
    team_a: HashSet<LifelineKind>,
    team_b: HashSet<LifelineKind>,
}

impl LifelineLedger {
    fn used(&self, slot: TeamSlot) -> &HashSet<LifelineKind> {
        match slot {
            TeamSlot::A => &self.team_a,
            TeamSlot::B => &self.team_b,
        }
    }

    /// Whether `slot` already spent `kind` this round.
    pub fn is_used(&self, slot: TeamSlot, kind: LifelineKind) -> bool {
        self.used(slot).contains(&kind)
    }

    /// Kinds used by `slot`, in a stable order.
    pub fn used_kinds(&self, slot: TeamSlot) -> Vec<LifelineKind> {
        [
            LifelineKind::DoubleChance,
            LifelineKind::FiftyFifty,
            LifelineKind::ChangeQuestion,
        ]
        .into_iter()
        .filter(|kind| self.is_used(slot, *kind))
        .collect()
    }

    /// Fail without recording anything when `kind` was already spent by `slot`.
    pub fn ensure_available(
        &self,
        slot: TeamSlot,
        kind: LifelineKind,
    ) -> Result<(), LifelineError> {
        if self.is_used(slot, kind) {
            Err(LifelineError::AlreadyUsed { slot, kind })
        } else {
            Ok(())
        }
    }

    /// Record `kind` as spent by `slot`.
    pub fn consume(&mut self, slot: TeamSlot, kind: LifelineKind) -> Result<(), LifelineError> {
        self.ensure_available(slot, kind)?;
        match slot {
            TeamSlot::A => self.team_a.insert(kind),
            TeamSlot::B => self.team_b.insert(kind),
        };
        Ok(())
    }
}

/// Keep the correct option plus one uniformly drawn incorrect option, shuffled.
///
/// Incorrect options still visible are preferred; when none remain the draw
/// falls back to every incorrect option of the question so exactly two options
/// are always left.
pub fn fifty_fifty<R: Rng + ?Sized>(
    options: &[String],
    visible: &[String],
    correct: &str,
    rng: &mut R,
) -> Vec<String> {
    let visible_wrong: Vec<&String> = visible.iter().filter(|o| *o != correct).collect();
    let all_wrong: Vec<&String> = options.iter().filter(|o| *o != correct).collect();
    let candidates = if visible_wrong.is_empty() {
        all_wrong
    } else {
        visible_wrong
    };

    let mut kept = vec![correct.to_owned()];
    if let Some(wrong) = candidates.choose(rng) {
        kept.push((*wrong).clone());
    }
    kept.shuffle(rng);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn options() -> Vec<String> {
        ["Cairo", "Giza", "Luxor", "Aswan"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn second_use_is_rejected_and_ledger_unchanged() {
        let mut ledger = LifelineLedger::default();
        ledger.consume(TeamSlot::A, LifelineKind::FiftyFifty).unwrap();

        let err = ledger
            .consume(TeamSlot::A, LifelineKind::FiftyFifty)
            .unwrap_err();
        assert_eq!(
            err,
            LifelineError::AlreadyUsed {
                slot: TeamSlot::A,
                kind: LifelineKind::FiftyFifty
            }
        );
        assert_eq!(
            ledger.used_kinds(TeamSlot::A),
            vec![LifelineKind::FiftyFifty]
        );
    }

    #[test]
    fn ledgers_are_per_team() {
        let mut ledger = LifelineLedger::default();
        ledger
            .consume(TeamSlot::A, LifelineKind::DoubleChance)
            .unwrap();
        assert!(
            ledger
                .consume(TeamSlot::B, LifelineKind::DoubleChance)
                .is_ok()
        );
        assert!(!ledger.is_used(TeamSlot::B, LifelineKind::ChangeQuestion));
    }

    #[test]
    fn fifty_fifty_keeps_correct_and_one_wrong() {
        let opts = options();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let kept = fifty_fifty(&opts, &opts, "Cairo", &mut rng);
            assert_eq!(kept.len(), 2);
            assert!(kept.contains(&"Cairo".to_string()));
            assert!(kept.iter().all(|o| opts.contains(o)));
        }
    }

    #[test]
    fn fifty_fifty_prefers_visible_wrong_options() {
        let opts = options();
        let visible = vec!["Cairo".to_string(), "Aswan".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let kept = fifty_fifty(&opts, &visible, "Cairo", &mut rng);
        assert!(kept.contains(&"Aswan".to_string()));

        let only_correct = vec!["Cairo".to_string()];
        let kept = fifty_fifty(&opts, &only_correct, "Cairo", &mut rng);
        assert_eq!(kept.len(), 2);
    }
}
