use crate::game::effect::EffectKind;
use crate::game::state::GameStatus;
use crate::model::player::PlayerId;
use thiserror::Error;

/// Misuse of the state machine by its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("a game seats 2 to 6 players, got {0}")]
    PlayerCount(usize),
    #[error("{seated} seated users do not fit {total} seats")]
    TooManySeated { seated: usize, total: usize },
    #[error("expected status {expected:?}, game is {actual:?}")]
    WrongStatus {
        expected: GameStatus,
        actual: GameStatus,
    },
    #[error("no turn has been assigned")]
    NoTurn,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("it is {expected}'s turn, not {actual}'s")]
    OutOfTurn { expected: PlayerId, actual: PlayerId },
    #[error("player {0} is eliminated")]
    Eliminated(PlayerId),
    #[error("player {0} holds no card")]
    EmptyHand(PlayerId),
    #[error("player {player} holds {len} cards, expected 2")]
    HandSize { player: PlayerId, len: usize },
    #[error("card index {index} out of range for a hand of {len}")]
    CardIndex { index: usize, len: usize },
    #[error("player {0} has an effect waiting to be resolved")]
    EffectPending(PlayerId),
    #[error("no effect is pending")]
    NoPendingEffect,
    #[error("{0:?} cannot be declined")]
    ParamsRequired(EffectKind),
    #[error("{0:?} needs a target")]
    MissingTarget(EffectKind),
    #[error("player {target} is not a valid {effect:?} target")]
    InvalidTarget { effect: EffectKind, target: PlayerId },
    #[error("guard must name a rank other than guard")]
    InvalidGuess,
    #[error("chancellor keep index {index:?} invalid for a hand of {len}")]
    InvalidKeep { index: Option<usize>, len: usize },
    #[error("chancellor return order must list every unkept card once")]
    InvalidReturnOrder,
    #[error("deck does not match the card catalog")]
    InvalidDeck,
    #[error("hands must be empty before dealing")]
    AlreadyDealt,
}
