use super::{Policy, PolicyContext};
use crate::bot::pick;
use crate::error::BotError;
use letter_core::game::{EffectKind, EffectParams, PendingEffect};
use letter_core::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{Level, event};

/// Plays any legal card and names any valid target. Never discards the
/// Princess and honours a forced Countess.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<usize, BotError> {
        let player = ctx.game.player(ctx.me)?;
        let hand = &player.hand;
        if hand.len() != 2 {
            return Err(BotError::HandSize {
                player: ctx.me,
                len: hand.len(),
                expected: 2,
            });
        }
        if player.must_play_countess || hand.forces_countess() {
            if let Some(index) = hand.position_of(Rank::Countess) {
                return Ok(index);
            }
        }
        let legal: Vec<usize> = hand
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.is_princess())
            .map(|(index, _)| index)
            .collect();
        let index = pick(&legal, &mut self.rng).unwrap_or(0);
        event!(target: "letter_bot::card", Level::DEBUG, seat = %ctx.me, index, "random card");
        Ok(index)
    }

    fn choose_effect(
        &mut self,
        ctx: &PolicyContext<'_>,
        pending: &PendingEffect,
    ) -> Result<EffectParams, BotError> {
        if pending.effect == EffectKind::Chancellor {
            let len = ctx.game.player(ctx.me)?.hand.len();
            let keep = pick(&(0..len).collect::<Vec<_>>(), &mut self.rng).unwrap_or(0);
            let mut bottom_order: Vec<usize> = (0..len).filter(|index| *index != keep).collect();
            bottom_order.shuffle(&mut self.rng);
            return Ok(EffectParams::keep(keep, bottom_order));
        }
        let target = pick(&pending.valid_targets, &mut self.rng)
            .ok_or(BotError::NoTarget(pending.effect))?;
        if pending.effect == EffectKind::Guard {
            let guesses: Vec<Rank> = Rank::ORDERED
                .into_iter()
                .filter(|rank| *rank != Rank::Guard)
                .collect();
            let guess = pick(&guesses, &mut self.rng).unwrap_or(Rank::Priest);
            return Ok(EffectParams::guess(target, guess));
        }
        Ok(EffectParams::target(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotFeatures;
    use crate::bot::testing::dealt;
    use letter_core::model::player::PlayerId;

    #[test]
    fn never_discards_the_princess() {
        for seed in 0..16 {
            let game = dealt(2, &[Rank::Spy, Rank::Princess, Rank::Guard, Rank::Baron]);
            let ctx = PolicyContext {
                me: PlayerId(0),
                game: &game,
                features: BotFeatures::default(),
            };
            let index = RandomPolicy::with_seed(seed).choose_card(&ctx).unwrap();
            assert_eq!(game.player(PlayerId(0)).unwrap().hand.get(index).unwrap().rank, Rank::Baron);
        }
    }

    #[test]
    fn chancellor_order_is_a_permutation() {
        let mut game = dealt(2, &[Rank::Spy, Rank::Chancellor, Rank::Guard, Rank::Priest]);
        game.play_card(PlayerId(0), 0).unwrap();
        let (_, pending) = game.pending_effect().unwrap();
        let ctx = PolicyContext {
            me: PlayerId(0),
            game: &game,
            features: BotFeatures::default(),
        };
        let params = RandomPolicy::with_seed(4).choose_effect(&ctx, pending).unwrap();
        let keep = params.keep.unwrap();
        let mut all = params.bottom_order.clone();
        all.push(keep);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2]);
        assert!(game.preview_effect(&params).is_ok());
    }
}
