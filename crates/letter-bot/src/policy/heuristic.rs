use super::{Policy, PolicyContext};
use crate::bot::{BotContext, BotDifficulty, BotParams, CardDecision, CardPlanner, EffectPlanner};
use crate::error::BotError;
use letter_core::game::{EffectKind, EffectParams, PendingEffect};
use letter_core::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

/// Adapter that drives CardPlanner/EffectPlanner behind the Policy trait
pub struct HeuristicPolicy {
    difficulty: BotDifficulty,
    params: BotParams,
    rng: StdRng,
    /// Effect parameters a clue-driven card choice was made for.
    planned: Option<EffectParams>,
}

impl HeuristicPolicy {
    pub fn new(params: BotParams, seed: u64) -> Self {
        Self {
            difficulty: BotDifficulty::Normal,
            params,
            rng: StdRng::seed_from_u64(seed),
            planned: None,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(BotParams::default(), seed)
    }

    pub fn params(&self) -> &BotParams {
        &self.params
    }
}

/// Planned parameters still fit the effect actually raised.
fn plan_fits(planned: &EffectParams, pending: &PendingEffect) -> bool {
    let Some(target) = planned.target else {
        return false;
    };
    if !pending.allows(target) {
        return false;
    }
    match pending.effect {
        EffectKind::Guard => planned.guess.is_some_and(|guess| guess != Rank::Guard),
        EffectKind::Baron | EffectKind::Prince => true,
        EffectKind::Priest | EffectKind::Chancellor | EffectKind::King => false,
    }
}

impl Policy for HeuristicPolicy {
    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<usize, BotError> {
        let bot_ctx = BotContext::new(ctx.me, ctx.game, &self.params, ctx.features, self.difficulty)?;
        let decision = CardPlanner::choose(&bot_ctx, &mut self.rng)?;
        log_card_decision(&bot_ctx, &decision);
        self.planned = decision.planned.clone();
        Ok(decision.index)
    }

    fn choose_effect(
        &mut self,
        ctx: &PolicyContext<'_>,
        pending: &PendingEffect,
    ) -> Result<EffectParams, BotError> {
        if let Some(planned) = self.planned.take() {
            if plan_fits(&planned, pending) {
                log_effect_decision(ctx, pending, &planned, "planned");
                return Ok(planned);
            }
        }
        let bot_ctx = BotContext::new(ctx.me, ctx.game, &self.params, ctx.features, self.difficulty)?;
        let params = EffectPlanner::choose(&bot_ctx, pending, &mut self.rng)?;
        log_effect_decision(ctx, pending, &params, "heuristic_effect");
        Ok(params)
    }
}

fn log_card_decision(ctx: &BotContext<'_>, decision: &CardDecision) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let hand = ctx
        .hand()
        .iter()
        .map(|card| card.rank.to_string())
        .collect::<Vec<_>>()
        .join(",");

    event!(
        target: "letter_bot::card",
        Level::INFO,
        seat = %ctx.me,
        difficulty = ?ctx.difficulty,
        round = ctx.game.round_number(),
        stage = ?ctx.round_stage(),
        deck = ctx.game.deck().len(),
        hand = %hand,
        chosen = %decision.card.rank,
        planned = ?decision.planned,
        reason = decision.reason,
    );
}

fn log_effect_decision(
    ctx: &PolicyContext<'_>,
    pending: &PendingEffect,
    params: &EffectParams,
    reason: &str,
) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    event!(
        target: "letter_bot::effect",
        Level::INFO,
        seat = %ctx.me,
        effect = ?pending.effect,
        valid_targets = pending.valid_targets.len(),
        target = ?params.target,
        guess = ?params.guess,
        keep = ?params.keep,
        reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotFeatures;
    use crate::bot::testing::dealt;
    use letter_core::model::player::PlayerId;

    #[test]
    fn planned_guess_is_reused_for_the_effect() {
        // P0 sees P1's Baron, P1 discards a Spy, P0 plays the Guard.
        let mut game = dealt(
            2,
            &[Rank::Spy, Rank::Priest, Rank::Baron, Rank::Guard, Rank::Spy, Rank::Prince],
        );
        let priest = game.player(PlayerId(0)).unwrap().hand.position_of(Rank::Priest).unwrap();
        game.play_card(PlayerId(0), priest).unwrap();
        game.resolve_effect(Some(EffectParams::target(PlayerId(1)))).unwrap();
        game.next_turn().unwrap();
        let spy = game.player(PlayerId(1)).unwrap().hand.position_of(Rank::Spy).unwrap();
        game.play_card(PlayerId(1), spy).unwrap();
        game.next_turn().unwrap();

        let mut policy = HeuristicPolicy::with_seed(2);
        let ctx = PolicyContext {
            me: PlayerId(0),
            game: &game,
            features: BotFeatures::default(),
        };
        let index = policy.choose_card(&ctx).unwrap();
        assert_eq!(game.player(PlayerId(0)).unwrap().hand.get(index).unwrap().rank, Rank::Guard);

        game.play_card(PlayerId(0), index).unwrap();
        let (_, pending) = game.pending_effect().unwrap();
        let pending = pending.clone();
        let ctx = PolicyContext {
            me: PlayerId(0),
            game: &game,
            features: BotFeatures::default(),
        };
        let params = policy.choose_effect(&ctx, &pending).unwrap();
        assert_eq!(params, EffectParams::guess(PlayerId(1), Rank::Baron));
        let result = game.resolve_effect(Some(params)).unwrap().unwrap();
        assert_eq!(result.eliminated.map(|e| e.player), Some(PlayerId(1)));
    }

    #[test]
    fn stale_plan_is_ignored_for_other_effects() {
        let planned = EffectParams::guess(PlayerId(1), Rank::Baron);
        let pending = PendingEffect {
            effect: EffectKind::King,
            valid_targets: vec![PlayerId(1)],
            required: true,
        };
        assert!(!plan_fits(&planned, &pending));
        let pending = PendingEffect {
            effect: EffectKind::Guard,
            valid_targets: vec![PlayerId(2)],
            required: false,
        };
        assert!(!plan_fits(&planned, &pending));
    }
}
