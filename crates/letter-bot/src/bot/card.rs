use super::deduction::{ClueKind, clues_from_view, exposure_from_view};
use super::{BotContext, RoundStage, pick};
use crate::error::BotError;
use letter_core::game::EffectParams;
use letter_core::model::card::Card;
use letter_core::model::rank::Rank;
use rand::Rng;

/// Card to play, and the effect parameters the choice was made for when a
/// clue drove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDecision {
    pub index: usize,
    pub card: Card,
    pub reason: &'static str,
    pub planned: Option<EffectParams>,
}

pub struct CardPlanner;

impl CardPlanner {
    pub fn choose<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        rng: &mut R,
    ) -> Result<CardDecision, BotError> {
        let hand = ctx.hand();
        let (Some(first), Some(second), 2) = (hand.get(0), hand.get(1), hand.len()) else {
            return Err(BotError::HandSize {
                player: ctx.me,
                len: hand.len(),
                expected: 2,
            });
        };
        let cards = [first, second];
        let decide = |index: usize, reason: &'static str| CardDecision {
            index,
            card: cards[index],
            reason,
            planned: None,
        };

        if first.is_princess() {
            return Ok(decide(1, "keep_princess"));
        }
        if second.is_princess() {
            return Ok(decide(0, "keep_princess"));
        }

        if ctx.player.must_play_countess || hand.forces_countess() {
            if let Some(index) = hand.position_of(Rank::Countess) {
                return Ok(decide(index, "countess_forced"));
            }
        }

        if first.rank == second.rank {
            return Ok(decide(0, "equal_ranks"));
        }

        if let Some(index) = hand.position_of(Rank::Countess) {
            let rate = ctx.params.countess_bluff_rate.clamp(0.0, 1.0);
            if ctx.features.bluff_enabled()
                && ctx.round_stage() == RoundStage::Late
                && rng.gen_bool(rate)
            {
                return Ok(decide(index, "countess_bluff"));
            }
        }

        if ctx.features.deduction_enabled() {
            if let Some(decision) = exposed_discard(ctx, &cards) {
                return Ok(decision);
            }
            if let Some(decision) = clue_play(ctx, &cards, rng) {
                return Ok(decision);
            }
        }

        let index = if ctx.params.priority(first.rank) > ctx.params.priority(second.rank) {
            0
        } else {
            1
        };
        Ok(decide(index, "priority"))
    }
}

/// Gets rid of a card an opponent knows about, hiding behind a Handmaid
/// first when one is in hand.
fn exposed_discard(ctx: &BotContext<'_>, cards: &[Card; 2]) -> Option<CardDecision> {
    let exposure = exposure_from_view(ctx.game, ctx.me, ctx.hand(), ctx.view())?;
    if exposure.rank == Rank::Princess {
        return None;
    }
    let (index, reason) = match cards.iter().position(|card| card.rank == Rank::Handmaid) {
        Some(index) => (index, "exposed_handmaid"),
        None => (
            cards.iter().position(|card| card.rank == exposure.rank)?,
            match exposure.kind {
                ClueKind::Countess => "exposed_by_countess",
                _ => "exposed_card",
            },
        ),
    };
    Some(CardDecision {
        index,
        card: cards[index],
        reason,
        planned: None,
    })
}

/// Plays a Guard, Baron or Prince when a clue makes its effect a safe bet.
fn clue_play<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    cards: &[Card; 2],
    rng: &mut R,
) -> Option<CardDecision> {
    let clues = clues_from_view(ctx.game, ctx.me, ctx.view());
    if clues.is_empty() {
        return None;
    }
    for (index, card) in cards.iter().enumerate() {
        let other = cards[1 - index];
        let planned = match card.rank {
            Rank::Guard => clues.iter().find_map(|clue| {
                let guessable: Vec<Rank> = clue.ranks.without(Rank::Guard).iter().collect();
                let guess = pick(&guessable, rng)?;
                Some(EffectParams::guess(clue.player, guess))
            }),
            Rank::Baron => clues
                .iter()
                .find(|clue| clue.ranks.max().is_some_and(|max| max < other.rank))
                .map(|clue| EffectParams::target(clue.player)),
            Rank::Prince => clues
                .iter()
                .find(|clue| clue.ranks.contains(Rank::Princess))
                .map(|clue| EffectParams::target(clue.player)),
            _ => None,
        };
        if let Some(planned) = planned {
            return Some(CardDecision {
                index,
                card: *card,
                reason: match card.rank {
                    Rank::Guard => "guard_clue",
                    Rank::Baron => "baron_clue",
                    _ => "prince_clue",
                },
                planned: Some(planned),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::dealt;
    use crate::bot::{BotDifficulty, BotFeatures, BotParams};
    use letter_core::game::Game;
    use letter_core::model::player::PlayerId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn decide(game: &Game, me: PlayerId, features: BotFeatures) -> CardDecision {
        let params = BotParams::default();
        let ctx = BotContext::new(me, game, &params, features, BotDifficulty::Normal).unwrap();
        CardPlanner::choose(&ctx, &mut StdRng::seed_from_u64(8)).unwrap()
    }

    #[test]
    fn never_plays_the_princess() {
        let game = dealt(2, &[Rank::Spy, Rank::Princess, Rank::Guard, Rank::Handmaid]);
        let decision = decide(&game, PlayerId(0), BotFeatures::default());
        assert_eq!(decision.card.rank, Rank::Handmaid);
        assert_eq!(decision.reason, "keep_princess");
    }

    #[test]
    fn forced_countess_is_played() {
        let game = dealt(2, &[Rank::Spy, Rank::King, Rank::Guard, Rank::Countess]);
        let decision = decide(&game, PlayerId(0), BotFeatures::default());
        assert_eq!(decision.card.rank, Rank::Countess);
        assert_eq!(decision.reason, "countess_forced");
    }

    #[test]
    fn priority_plays_the_spy_before_the_king() {
        let game = dealt(2, &[Rank::Guard, Rank::Spy, Rank::Guard, Rank::King]);
        let decision = decide(&game, PlayerId(0), BotFeatures::new(false, false));
        assert_eq!(decision.card.rank, Rank::Spy);
        assert_eq!(decision.reason, "priority");
    }

    #[test]
    fn short_hand_is_an_error() {
        let game = dealt(2, &[]);
        let params = BotParams::default();
        let ctx = BotContext::new(
            PlayerId(1),
            &game,
            &params,
            BotFeatures::default(),
            BotDifficulty::Normal,
        )
        .unwrap();
        let err = CardPlanner::choose(&ctx, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, BotError::HandSize { len: 1, .. }));
    }

    #[test]
    fn guard_follows_a_priest_sighting() {
        // P0 sees P1's Baron, P1 discards a Spy, P0 then holds Guard and Prince.
        let mut game = dealt(
            2,
            &[Rank::Spy, Rank::Priest, Rank::Baron, Rank::Guard, Rank::Spy, Rank::Prince],
        );
        let priest = game.player(PlayerId(0)).unwrap().hand.position_of(Rank::Priest).unwrap();
        game.play_card(PlayerId(0), priest).unwrap();
        game.resolve_effect(Some(EffectParams::target(PlayerId(1)))).unwrap();
        game.next_turn().unwrap();
        // P1 holds Baron and Spy and keeps the Baron.
        let spy = game.player(PlayerId(1)).unwrap().hand.position_of(Rank::Spy).unwrap();
        game.play_card(PlayerId(1), spy).unwrap();
        game.next_turn().unwrap();

        let decision = decide(&game, PlayerId(0), BotFeatures::default());
        assert_eq!(decision.card.rank, Rank::Guard);
        assert_eq!(decision.reason, "guard_clue");
        assert_eq!(decision.planned, Some(EffectParams::guess(PlayerId(1), Rank::Baron)));
    }
}
