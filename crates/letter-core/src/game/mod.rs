pub mod effect;
pub mod error;
pub mod history;
pub mod names;
pub mod scoring;
pub mod serialization;
pub mod state;
mod turn;

pub use effect::{
    EffectKind, EffectParams, EffectResult, Elimination, Mutation, PendingEffect, Resolution, Swap,
};
pub use error::GameError;
pub use history::{History, HistoryEntry, SkipReason};
pub use scoring::{RoundCheck, RoundResult, RoundSummary, points_to_win};
pub use serialization::{GameSnapshot, SnapshotError};
pub use state::{Game, GameStatus, SeatedUser};
