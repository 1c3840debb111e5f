pub mod bot;
pub mod error;
pub mod policy;

pub use bot::{
    BotContext, BotDifficulty, BotFeatures, BotParams, CardDecision, CardPlanner, Clue, ClueKind,
    EffectPlanner, Exposure, OpponentProfile, RoundStage, ScoreStatus, collect_clues, exposed_card,
    infer_opponent_ranks,
};
pub use error::BotError;
pub use policy::{HeuristicPolicy, Policy, PolicyContext, RandomPolicy, policy_for};

use letter_core::game::{EffectParams, Game, PendingEffect};
use letter_core::model::card::Card;
use letter_core::model::player::PlayerId;
use rand::Rng;

/// Card the default heuristic bot plays from `player`'s two-card hand.
pub fn choose_bot_card<R: Rng + ?Sized>(
    player: PlayerId,
    game: &Game,
    rng: &mut R,
) -> Result<Card, BotError> {
    let params = BotParams::default();
    let ctx = BotContext::new(
        player,
        game,
        &params,
        BotFeatures::default(),
        BotDifficulty::Normal,
    )?;
    Ok(CardPlanner::choose(&ctx, rng)?.card)
}

/// Parameters the default heuristic bot picks for its pending effect.
pub fn choose_bot_effect_params<R: Rng + ?Sized>(
    player: PlayerId,
    game: &Game,
    pending: &PendingEffect,
    rng: &mut R,
) -> Result<EffectParams, BotError> {
    let params = BotParams::default();
    let ctx = BotContext::new(
        player,
        game,
        &params,
        BotFeatures::default(),
        BotDifficulty::Normal,
    )?;
    EffectPlanner::choose(&ctx, pending, rng)
}
