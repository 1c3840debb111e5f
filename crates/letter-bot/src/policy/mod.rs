mod heuristic;
mod random;

pub use heuristic::HeuristicPolicy;
pub use random::RandomPolicy;

use crate::bot::{BotDifficulty, BotFeatures, BotParams};
use crate::error::BotError;
use letter_core::game::{EffectParams, Game, PendingEffect};
use letter_core::model::player::PlayerId;

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub me: PlayerId,
    pub game: &'a Game,
    pub features: BotFeatures,
}

/// Unified interface for seat controllers (heuristic and random bots)
pub trait Policy: Send {
    /// Index into the two-card hand of the card to play.
    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<usize, BotError>;

    /// Parameters for the effect raised by the card just played.
    fn choose_effect(
        &mut self,
        ctx: &PolicyContext<'_>,
        pending: &PendingEffect,
    ) -> Result<EffectParams, BotError>;
}

/// Seat controller for `difficulty`, seeded for reproducible games.
pub fn policy_for(difficulty: BotDifficulty, params: BotParams, seed: u64) -> Box<dyn Policy> {
    match difficulty {
        BotDifficulty::Easy => Box::new(RandomPolicy::with_seed(seed)),
        BotDifficulty::Normal => Box::new(HeuristicPolicy::new(params, seed)),
    }
}
