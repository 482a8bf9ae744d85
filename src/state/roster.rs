//! Two fixed team slots, their players, and score bookkeeping.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Points awarded to an attributed correct answer.
pub const CORRECT_ANSWER_AWARD: u32 = 10;

/// Symbolic avatars a team may pick during setup.
pub const TEAM_AVATARS: [&str; 8] = ["🦁", "🦅", "🐺", "🦂", "🐎", "🦈", "🐉", "🐪"];

/// Identifier of a registered player, unique within a match.
pub type PlayerId = Uuid;

/// One of the two fixed team slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TeamSlot {
    /// First team.
    A,
    /// Second team.
    B,
}

/// Avatar shown next to a team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Avatar {
    /// One of [`TEAM_AVATARS`].
    Token(String),
    /// Opaque reference to an uploaded image blob.
    Blob(String),
}

/// Player registered on a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier assigned on registration.
    pub id: PlayerId,
    /// Trimmed display name.
    pub name: String,
    /// Points earned this match.
    pub score: u32,
}

/// A team and its ordered players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Slot the team occupies.
    pub slot: TeamSlot,
    /// Display name.
    pub name: String,
    /// Avatar shown next to the name.
    pub avatar: Avatar,
    /// Insertion order is display order.
    pub players: Vec<Player>,
    /// Sum of every award applied through this team's players.
    pub total_score: u32,
}

impl Team {
    fn initial(slot: TeamSlot) -> Self {
        let (name, avatar) = match slot {
            TeamSlot::A => ("Team A", TEAM_AVATARS[0]),
            TeamSlot::B => ("Team B", TEAM_AVATARS[1]),
        };
        Self {
            slot,
            name: name.to_owned(),
            avatar: Avatar::Token(avatar.to_owned()),
            players: Vec::new(),
            total_score: 0,
        }
    }

    fn has_player_named(&self, name: &str) -> bool {
        self.players.iter().any(|player| player.name.trim() == name)
    }
}

/// Errors raised by roster mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The trimmed name is already taken on either team.
    #[error("a player named `{0}` is already registered")]
    DuplicateName(String),
    /// The player name is blank.
    #[error("player name must not be empty")]
    EmptyName,
    /// The team name is blank.
    #[error("team name must not be empty")]
    EmptyTeamName,
    /// The token is not one of the offered avatars.
    #[error("unknown avatar token `{0}`")]
    UnknownAvatar(String),
}

/// Score change produced by an attributed correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAward {
    /// Team of the credited player.
    pub slot: TeamSlot,
    /// Credited player.
    pub player_id: PlayerId,
    /// Player total after the award.
    pub player_score: u32,
    /// Team total after the award.
    pub team_score: u32,
}

/// Final result decided by comparing the two aggregate scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "result", content = "team", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Both teams finished level.
    Draw,
    /// This team scored more.
    Winner(TeamSlot),
}

/// Most valuable player across both rosters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mvp {
    /// Team of the player.
    pub slot: TeamSlot,
    /// Player identifier.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Points earned this match.
    pub score: u32,
    /// The MVP panel is only shown for a positive score that no other player matches.
    pub show_panel: bool,
}

/// The pair of teams playing a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    a: Team,
    b: Team,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            a: Team::initial(TeamSlot::A),
            b: Team::initial(TeamSlot::B),
        }
    }
}

impl Roster {
    /// Fresh roster with default team names and avatars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Team in `slot`.
    pub fn team(&self, slot: TeamSlot) -> &Team {
        match slot {
            TeamSlot::A => &self.a,
            TeamSlot::B => &self.b,
        }
    }

    fn team_mut(&mut self, slot: TeamSlot) -> &mut Team {
        match slot {
            TeamSlot::A => &mut self.a,
            TeamSlot::B => &mut self.b,
        }
    }

    /// Both teams, A first.
    pub fn teams(&self) -> [&Team; 2] {
        [&self.a, &self.b]
    }

    /// Register a player on `slot`.
    ///
    /// The trimmed name must not already exist in either roster (exact,
    /// case-sensitive comparison after trimming).
    pub fn add_player(&mut self, slot: TeamSlot, name: &str) -> Result<PlayerId, RosterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if self.a.has_player_named(trimmed) || self.b.has_player_named(trimmed) {
            return Err(RosterError::DuplicateName(trimmed.to_owned()));
        }

        let id = Uuid::new_v4();
        self.team_mut(slot).players.push(Player {
            id,
            name: trimmed.to_owned(),
            score: 0,
        });
        Ok(id)
    }

    /// Remove a player; unknown identifiers are ignored.
    pub fn remove_player(&mut self, slot: TeamSlot, id: PlayerId) -> bool {
        let team = self.team_mut(slot);
        let before = team.players.len();
        team.players.retain(|player| player.id != id);
        team.players.len() != before
    }

    /// Rename the team in `slot`; blank names are rejected.
    pub fn rename_team(&mut self, slot: TeamSlot, name: &str) -> Result<(), RosterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyTeamName);
        }
        self.team_mut(slot).name = trimmed.to_owned();
        Ok(())
    }

    /// Change the avatar of the team in `slot`.
    pub fn set_avatar(&mut self, slot: TeamSlot, avatar: Avatar) -> Result<(), RosterError> {
        if let Avatar::Token(ref token) = avatar {
            if !TEAM_AVATARS.contains(&token.as_str()) {
                return Err(RosterError::UnknownAvatar(token.clone()));
            }
        }
        self.team_mut(slot).avatar = avatar;
        Ok(())
    }

    /// Locate a player in either roster.
    pub fn find_player(&self, id: PlayerId) -> Option<(TeamSlot, &Player)> {
        self.teams().into_iter().find_map(|team| {
            team.players
                .iter()
                .find(|player| player.id == id)
                .map(|player| (team.slot, player))
        })
    }

    /// Credit a correct answer to `player`.
    ///
    /// An absent or unknown player scores nobody: anonymous correct answers are
    /// worth zero points.
    pub fn apply_correct_answer(&mut self, player: Option<PlayerId>) -> Option<ScoreAward> {
        let id = player?;
        let (slot, _) = self.find_player(id)?;
        let team = self.team_mut(slot);
        let entry = team.players.iter_mut().find(|p| p.id == id)?;
        entry.score += CORRECT_ANSWER_AWARD;
        let player_score = entry.score;
        team.total_score += CORRECT_ANSWER_AWARD;

        Some(ScoreAward {
            slot,
            player_id: id,
            player_score,
            team_score: team.total_score,
        })
    }

    /// Draw when both aggregates are equal, otherwise the higher aggregate wins.
    pub fn outcome(&self) -> MatchOutcome {
        use std::cmp::Ordering;

        match self.a.total_score.cmp(&self.b.total_score) {
            Ordering::Equal => MatchOutcome::Draw,
            Ordering::Greater => MatchOutcome::Winner(TeamSlot::A),
            Ordering::Less => MatchOutcome::Winner(TeamSlot::B),
        }
    }

    /// Highest-scoring player across both rosters, first encountered on ties.
    pub fn mvp(&self) -> Option<Mvp> {
        let mut best: Option<(TeamSlot, &Player)> = None;
        let mut tied = false;
        for team in self.teams() {
            for player in &team.players {
                match best {
                    Some((_, current)) if player.score > current.score => {
                        best = Some((team.slot, player));
                        tied = false;
                    }
                    Some((_, current)) if player.score == current.score => tied = true,
                    Some(_) => {}
                    None => best = Some((team.slot, player)),
                }
            }
        }

        best.map(|(slot, player)| Mvp {
            slot,
            player_id: player.id,
            name: player.name.clone(),
            score: player.score,
            show_panel: player.score > 0 && !tied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_names_register_on_opposite_teams() {
        let mut roster = Roster::new();
        roster.add_player(TeamSlot::A, "Sami").unwrap();
        roster.add_player(TeamSlot::B, "Noor").unwrap();

        assert_eq!(roster.team(TeamSlot::A).players.len(), 1);
        assert_eq!(roster.team(TeamSlot::B).players[0].name, "Noor");
    }

    #[test]
    fn duplicate_names_are_rejected_across_rosters() {
        let mut roster = Roster::new();
        roster.add_player(TeamSlot::A, "Sami").unwrap();

        assert_eq!(
            roster.add_player(TeamSlot::A, "Sami"),
            Err(RosterError::DuplicateName("Sami".into()))
        );
        assert_eq!(
            roster.add_player(TeamSlot::B, "  Sami  "),
            Err(RosterError::DuplicateName("Sami".into()))
        );
        // Comparison is case-sensitive.
        assert!(roster.add_player(TeamSlot::B, "sami").is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.add_player(TeamSlot::A, "   "),
            Err(RosterError::EmptyName)
        );
    }

    #[test]
    fn removing_unknown_player_is_a_no_op() {
        let mut roster = Roster::new();
        let id = roster.add_player(TeamSlot::A, "Sami").unwrap();

        assert!(!roster.remove_player(TeamSlot::B, id));
        assert!(!roster.remove_player(TeamSlot::A, Uuid::new_v4()));
        assert!(roster.remove_player(TeamSlot::A, id));
        assert!(roster.team(TeamSlot::A).players.is_empty());
    }

    #[test]
    fn correct_answer_credits_player_and_team() {
        let mut roster = Roster::new();
        let sami = roster.add_player(TeamSlot::A, "Sami").unwrap();

        let award = roster.apply_correct_answer(Some(sami)).unwrap();
        assert_eq!(award.slot, TeamSlot::A);
        assert_eq!(award.player_score, 10);
        assert_eq!(award.team_score, 10);
        assert_eq!(roster.team(TeamSlot::B).total_score, 0);
    }

    #[test]
    fn anonymous_correct_answer_scores_nobody() {
        let mut roster = Roster::new();
        roster.add_player(TeamSlot::A, "Sami").unwrap();

        assert_eq!(roster.apply_correct_answer(None), None);
        assert_eq!(roster.apply_correct_answer(Some(Uuid::new_v4())), None);
        assert_eq!(roster.team(TeamSlot::A).total_score, 0);
    }

    #[test]
    fn tied_aggregates_are_a_draw() {
        let mut roster = Roster::new();
        let sami = roster.add_player(TeamSlot::A, "Sami").unwrap();
        let noor = roster.add_player(TeamSlot::B, "Noor").unwrap();
        roster.apply_correct_answer(Some(sami));
        roster.apply_correct_answer(Some(noor));

        assert_eq!(roster.outcome(), MatchOutcome::Draw);

        let mvp = roster.mvp().unwrap();
        assert_eq!(mvp.name, "Sami");
        assert!(!mvp.show_panel);
    }

    #[test]
    fn higher_aggregate_wins_and_mvp_is_shown() {
        let mut roster = Roster::new();
        let sami = roster.add_player(TeamSlot::A, "Sami").unwrap();
        let noor = roster.add_player(TeamSlot::B, "Noor").unwrap();
        roster.apply_correct_answer(Some(noor));
        roster.apply_correct_answer(Some(noor));
        roster.apply_correct_answer(Some(sami));

        assert_eq!(roster.outcome(), MatchOutcome::Winner(TeamSlot::B));
        let mvp = roster.mvp().unwrap();
        assert_eq!(mvp.player_id, noor);
        assert_eq!(mvp.score, 20);
        assert!(mvp.show_panel);
    }

    #[test]
    fn zero_score_mvp_has_no_panel() {
        let mut roster = Roster::new();
        roster.add_player(TeamSlot::A, "Sami").unwrap();
        let mvp = roster.mvp().unwrap();
        assert_eq!(mvp.score, 0);
        assert!(!mvp.show_panel);
        assert!(Roster::new().mvp().is_none());
    }

    #[test]
    fn removed_player_contribution_stays_in_aggregate() {
        let mut roster = Roster::new();
        let sami = roster.add_player(TeamSlot::A, "Sami").unwrap();
        roster.apply_correct_answer(Some(sami));
        roster.remove_player(TeamSlot::A, sami);

        assert_eq!(roster.team(TeamSlot::A).total_score, 10);
    }

    #[test]
    fn avatar_tokens_must_come_from_the_fixed_set() {
        let mut roster = Roster::new();
        assert!(roster.set_avatar(TeamSlot::A, Avatar::Token("🐺".into())).is_ok());
        assert_eq!(
            roster.set_avatar(TeamSlot::A, Avatar::Token("🐸".into())),
            Err(RosterError::UnknownAvatar("🐸".into()))
        );
        assert!(
            roster
                .set_avatar(TeamSlot::B, Avatar::Blob("blob:team-b".into()))
                .is_ok()
        );
    }
}
