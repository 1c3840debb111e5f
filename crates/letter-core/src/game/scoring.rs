use crate::game::history::HistoryEntry;
use crate::game::state::{Game, GameStatus};
use crate::model::card::Card;
use crate::model::player::{Player, PlayerId};
use crate::model::rank::Rank;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

/// Tokens needed to win the game.
pub const fn points_to_win(player_count: usize) -> u32 {
    match player_count {
        0..=2 => 6,
        3 => 5,
        4 => 4,
        _ => 3,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub player: PlayerId,
    pub card: Option<Card>,
    pub winner: bool,
    pub spy_bonus: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// One row per player still in the round.
    pub results: Vec<RoundResult>,
    pub next_starting_player: PlayerId,
}

impl RoundSummary {
    pub fn winners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.results
            .iter()
            .filter(|result| result.winner)
            .map(|result| result.player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundCheck {
    pub is_end_of_round: bool,
    pub summary: Option<RoundSummary>,
}

impl RoundCheck {
    fn ongoing() -> Self {
        Self {
            is_end_of_round: false,
            summary: None,
        }
    }
}

fn held_rank(player: &Player) -> Option<Rank> {
    player.hand.first().map(|card| card.rank)
}

impl Game {
    /// Ends and scores the round once at most one player remains or the
    /// deck is exhausted.
    ///
    /// Every survivor holding the highest rank scores a token. A survivor
    /// who is the only one to have discarded a Spy scores one more. The
    /// next round opens with the sole top holder, or on a tie with the
    /// Spy scorer when they are among the tied, else a random tied player.
    pub fn check_end_of_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RoundCheck {
        if self.status != GameStatus::InProgress || self.pending_effect().is_some() {
            return RoundCheck::ongoing();
        }
        if self.active_count() > 1 && !self.deck.is_empty() {
            return RoundCheck::ongoing();
        }

        let survivors: Vec<PlayerId> = self.active_players().map(|player| player.id).collect();
        let best = survivors
            .iter()
            .filter_map(|id| held_rank(&self.players[id.index()]))
            .max();
        let winners: Vec<PlayerId> = survivors
            .iter()
            .copied()
            .filter(|id| best.is_some() && held_rank(&self.players[id.index()]) == best)
            .collect();
        let spies: Vec<PlayerId> = survivors
            .iter()
            .copied()
            .filter(|id| self.players[id.index()].has_discarded(Rank::Spy))
            .collect();
        let spy_scorer = match spies.as_slice() {
            [only] => Some(*only),
            _ => None,
        };

        for id in &winners {
            self.players[id.index()].score += 1;
        }
        if let Some(id) = spy_scorer {
            self.players[id.index()].score += 1;
        }

        let next_starting_player = match winners.as_slice() {
            [only] => *only,
            tied => spy_scorer
                .filter(|spy| tied.contains(spy))
                .or_else(|| tied.choose(rng).copied())
                .or(self.turn)
                .unwrap_or(PlayerId(0)),
        };

        let results: Vec<RoundResult> = survivors
            .iter()
            .map(|id| RoundResult {
                player: *id,
                card: self.players[id.index()].hand.first(),
                winner: winners.contains(id),
                spy_bonus: spy_scorer == Some(*id),
            })
            .collect();
        let summary = RoundSummary {
            results,
            next_starting_player,
        };

        self.history.push(HistoryEntry::RoundEnded(summary.clone()));
        self.status = GameStatus::RoundEnded;
        self.turn = Some(next_starting_player);
        event!(
            target: "letter_core::round",
            Level::DEBUG,
            round = self.round_number,
            winners = ?winners,
            spy = ?spy_scorer,
            next = %next_starting_player,
            "round ended"
        );

        RoundCheck {
            is_end_of_round: true,
            summary: Some(summary),
        }
    }

    /// Marks the game finished once somebody reaches the winning score.
    pub fn check_end_of_game(&mut self) -> bool {
        if self.winner().is_some() {
            self.status = GameStatus::Finished;
            return true;
        }
        false
    }

    pub fn points_to_win(&self) -> u32 {
        points_to_win(self.players.len())
    }

    /// Highest scorer at or above the winning score, lowest seat on ties.
    pub fn winner(&self) -> Option<PlayerId> {
        let needed = self.points_to_win();
        self.players
            .iter()
            .filter(|player| player.score >= needed)
            .max_by(|a, b| a.score.cmp(&b.score).then(b.id.cmp(&a.id)))
            .map(|player| player.id)
    }
}
