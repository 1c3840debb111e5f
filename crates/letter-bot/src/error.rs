use letter_core::game::{EffectKind, GameError};
use letter_core::model::player::PlayerId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
    #[error("{player} holds {len} cards, a decision needs {expected}")]
    HandSize {
        player: PlayerId,
        len: usize,
        expected: usize,
    },
    #[error("no valid target for {0:?}")]
    NoTarget(EffectKind),
    #[error("{0} has no pending effect to resolve")]
    NothingPending(PlayerId),
    #[error(transparent)]
    Game(#[from] GameError),
}
