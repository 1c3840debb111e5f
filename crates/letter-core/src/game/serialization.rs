use crate::game::history::History;
use crate::game::state::{Game, GameStatus, MAX_PLAYERS, MIN_PLAYERS};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::{Player, PlayerId};
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub round_number: u32,
    pub status: GameStatus,
    pub turn: Option<PlayerId>,
    pub players: Vec<Player>,
    pub deck: Vec<Card>,
    pub aside: Option<Card>,
    #[serde(default)]
    pub history: History,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
    #[error("a game seats 2 to 6 players, snapshot has {0}")]
    PlayerCount(usize),
    #[error("player at seat {seat} carries id {id}")]
    SeatMismatch { seat: usize, id: PlayerId },
    #[error("turn {0} points past the last seat")]
    TurnOutOfRange(PlayerId),
    #[error("snapshot holds {found} cards, the catalog has {expected}")]
    CardCount { found: usize, expected: usize },
    #[error("snapshot cards do not match the catalog")]
    CatalogMismatch,
    #[error("{0} players have a pending effect")]
    MultiplePending(usize),
}

impl GameSnapshot {
    pub fn capture(game: &Game) -> Self {
        GameSnapshot {
            version: SNAPSHOT_VERSION,
            round_number: game.round_number(),
            status: game.status(),
            turn: game.turn(),
            players: game.players().to_vec(),
            deck: game.deck().cards().to_vec(),
            aside: game.aside(),
            history: game.history().clone(),
        }
    }

    /// Rebuilds the game, rejecting snapshots that break card conservation
    /// or carry more than one pending effect.
    pub fn restore(self) -> Result<Game, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(self.version));
        }
        let count = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(SnapshotError::PlayerCount(count));
        }
        for (seat, player) in self.players.iter().enumerate() {
            if player.id.index() != seat {
                return Err(SnapshotError::SeatMismatch { seat, id: player.id });
            }
        }
        if let Some(turn) = self.turn {
            if turn.index() >= count {
                return Err(SnapshotError::TurnOutOfRange(turn));
            }
        }
        let pending = self
            .players
            .iter()
            .filter(|player| player.pending_effect.is_some())
            .count();
        if pending > 1 {
            return Err(SnapshotError::MultiplePending(pending));
        }

        let game = Game {
            players: self.players,
            deck: Deck::from_cards(self.deck),
            aside: self.aside,
            turn: self.turn,
            status: self.status,
            history: self.history,
            round_number: self.round_number,
        };

        let found = game.card_total();
        let undealt = game.status() == GameStatus::Initialized && found == 0;
        if !undealt {
            if found != Rank::catalog_size() {
                return Err(SnapshotError::CardCount {
                    found,
                    expected: Rank::catalog_size(),
                });
            }
            if !game.is_conserved() {
                return Err(SnapshotError::CatalogMismatch);
            }
        }
        Ok(game)
    }

    pub fn to_json(game: &Game) -> serde_json::Result<String> {
        let snapshot = Self::capture(game);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dealt_game() -> Game {
        let mut rng = StdRng::seed_from_u64(77);
        let mut game = Game::new(&[], 3, &mut rng).unwrap();
        game.init_turn(PlayerId(1)).unwrap();
        game.init_round(&mut rng).unwrap();
        game.distribute_initial_cards().unwrap();
        game
    }

    #[test]
    fn snapshot_roundtrip_restores_game() {
        let game = dealt_game();
        let json = GameSnapshot::to_json(&game).unwrap();
        assert!(json.contains("\"round_number\": 1"));
        let restored = GameSnapshot::from_json(&json).unwrap().restore().unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn restore_rejects_missing_cards() {
        let game = dealt_game();
        let mut snapshot = GameSnapshot::capture(&game);
        snapshot.deck.pop();
        match snapshot.restore() {
            Err(SnapshotError::CardCount { found, expected }) => {
                assert_eq!(found, 20);
                assert_eq!(expected, 21);
            }
            other => panic!("unexpected restore result {other:?}"),
        }
    }

    #[test]
    fn restore_rejects_duplicated_cards() {
        let game = dealt_game();
        let mut snapshot = GameSnapshot::capture(&game);
        let first = snapshot.deck[0];
        let last = snapshot.deck.len() - 1;
        snapshot.deck[last] = first;
        assert!(matches!(snapshot.restore(), Err(SnapshotError::CatalogMismatch)));
    }

    #[test]
    fn fresh_game_restores_without_cards() {
        let mut rng = StdRng::seed_from_u64(1);
        let game = Game::new(&[], 2, &mut rng).unwrap();
        let restored = GameSnapshot::capture(&game).restore().unwrap();
        assert_eq!(restored.status(), GameStatus::Initialized);
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let game = dealt_game();
        let mut value: serde_json::Value =
            serde_json::from_str(&GameSnapshot::to_json(&game).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("version");
        let snapshot = GameSnapshot::from_json(&value.to_string()).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    }
}
