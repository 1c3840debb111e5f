use super::deduction::{OpponentProfile, infer_from_view};
use super::{BotContext, RoundStage, ScoreStatus, pick};
use crate::error::BotError;
use letter_core::game::{EffectKind, EffectParams, PendingEffect};
use letter_core::model::card::Card;
use letter_core::model::player::{Player, PlayerId};
use letter_core::model::rank::Rank;
use letter_core::model::rank_set::RankSet;
use rand::Rng;

const EPSILON: f64 = 1e-9;

pub struct EffectPlanner;

impl EffectPlanner {
    /// Parameters for `pending`, always naming one of its valid targets.
    pub fn choose<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        pending: &PendingEffect,
        rng: &mut R,
    ) -> Result<EffectParams, BotError> {
        let held = ctx.hand().first().ok_or(BotError::HandSize {
            player: ctx.me,
            len: 0,
            expected: 1,
        })?;
        let status = ctx.score_status();
        let params = match pending.effect {
            EffectKind::Guard => guard(ctx, pending, status, rng),
            EffectKind::Priest => target_player(ctx, pending, status, rng).map(EffectParams::target),
            EffectKind::Baron => baron(ctx, pending, held, status, rng),
            EffectKind::Prince => prince(ctx, pending, held, status, rng),
            EffectKind::Chancellor => Some(chancellor(ctx)),
            EffectKind::King => king(ctx, pending, held, status, rng),
        };
        if let Some(params) = params {
            return Ok(params);
        }
        pending
            .valid_targets
            .first()
            .map(|target| EffectParams::target(*target))
            .ok_or(BotError::NoTarget(pending.effect))
    }
}

/// Valid targets other than me.
fn rivals<'a>(ctx: &BotContext<'a>, pending: &PendingEffect) -> Vec<&'a Player> {
    pending
        .valid_targets
        .iter()
        .filter(|id| **id != ctx.me)
        .filter_map(|id| ctx.game.player(*id).ok())
        .collect()
}

fn profiles(ctx: &BotContext<'_>, pending: &PendingEffect) -> Vec<OpponentProfile> {
    infer_from_view(ctx.game, ctx.me, ctx.view())
        .into_iter()
        .filter(|profile| pending.allows(profile.player))
        .collect()
}

/// Uniform pick among the entries whose score is within rounding of `best`.
fn pick_best<T: Copy, R: Rng + ?Sized>(
    scored: &[(T, f64)],
    best: f64,
    rng: &mut R,
) -> Option<T> {
    let tied: Vec<T> = scored
        .iter()
        .filter(|(_, score)| (score - best).abs() < EPSILON)
        .map(|(item, _)| *item)
        .collect();
    pick(&tied, rng)
}

fn max_score<T>(scored: &[(T, f64)]) -> Option<f64> {
    scored.iter().map(|(_, score)| *score).reduce(f64::max)
}

fn min_score<T>(scored: &[(T, f64)]) -> Option<f64> {
    scored.iter().map(|(_, score)| *score).reduce(f64::min)
}

/// The rival to hurt when nothing better is known.
///
/// With my own Spy down, another Spy holder threatens the bonus token, so
/// they come first unless someone is about to win. Otherwise the top scorer,
/// Spy holders preferred among equals.
fn target_player<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    status: ScoreStatus,
    rng: &mut R,
) -> Option<PlayerId> {
    let rivals = rivals(ctx, pending);
    if ctx.player.has_discarded(Rank::Spy) && status != ScoreStatus::Critical {
        if let Some(rival) = rivals.iter().find(|p| p.has_discarded(Rank::Spy)) {
            return Some(rival.id);
        }
    }
    let top = rivals.iter().map(|p| p.score).max()?;
    let leaders: Vec<PlayerId> = rivals.iter().filter(|p| p.score == top).map(|p| p.id).collect();
    let spies: Vec<PlayerId> = leaders
        .iter()
        .copied()
        .filter(|id| ctx.game.player(*id).is_ok_and(|p| p.has_discarded(Rank::Spy)))
        .collect();
    pick(if spies.is_empty() { &leaders } else { &spies }, rng)
}

/// Lowest scorer among the rivals, non-Spy holders preferred.
fn bottom_player<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    rng: &mut R,
) -> Option<PlayerId> {
    let rivals = rivals(ctx, pending);
    let low = rivals.iter().map(|p| p.score).min()?;
    let trailing: Vec<&Player> = rivals.into_iter().filter(|p| p.score == low).collect();
    let clean: Vec<PlayerId> = trailing
        .iter()
        .filter(|p| !p.has_discarded(Rank::Spy))
        .map(|p| p.id)
        .collect();
    let all: Vec<PlayerId> = trailing.iter().map(|p| p.id).collect();
    pick(if clean.is_empty() { &all } else { &clean }, rng)
}

fn guard<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    status: ScoreStatus,
    rng: &mut R,
) -> Option<EffectParams> {
    let no_guard = RankSet::single(Rank::Guard);
    if status != ScoreStatus::Critical && ctx.features.deduction_enabled() {
        let scored: Vec<((PlayerId, RankSet), f64)> = profiles(ctx, pending)
            .iter()
            .filter_map(|profile| {
                let (ranks, probability) = profile.most_probable(no_guard)?;
                Some(((profile.player, ranks), probability))
            })
            .collect();
        if let Some(best) = max_score(&scored) {
            if let Some((target, ranks)) = pick_best(&scored, best, rng) {
                let guesses: Vec<Rank> = ranks.iter().collect();
                if let Some(guess) = pick(&guesses, rng) {
                    return Some(EffectParams::guess(target, guess));
                }
            }
        }
    }

    let target = target_player(ctx, pending, status, rng)?;
    let (frequent, _) = ctx.remaining().filter(RankSet::ALL.without(Rank::Guard)).most_frequent();
    let pool = if frequent.is_empty() { RankSet::ALL.without(Rank::Guard) } else { frequent };
    let guesses: Vec<Rank> = pool.iter().collect();
    Some(EffectParams::guess(target, pick(&guesses, rng)?))
}

fn baron<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    held: Card,
    status: ScoreStatus,
    rng: &mut R,
) -> Option<EffectParams> {
    if status != ScoreStatus::Critical {
        let scored: Vec<(PlayerId, f64)> = profiles(ctx, pending)
            .iter()
            .map(|profile| (profile.player, profile.probability_above(held.rank)))
            .collect();
        if let Some(target) = min_score(&scored).and_then(|low| pick_best(&scored, low, rng)) {
            return Some(EffectParams::target(target));
        }
    }
    target_player(ctx, pending, status, rng).map(EffectParams::target)
}

fn prince<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    held: Card,
    status: ScoreStatus,
    rng: &mut R,
) -> Option<EffectParams> {
    let self_allowed = pending.allows(ctx.me) && !held.is_princess();
    if self_allowed
        && ctx.round_stage() == RoundStage::Late
        && ctx.better_card_outstanding(held.rank)
    {
        return Some(EffectParams::target(ctx.me));
    }

    if ctx.features.deduction_enabled() {
        let scored: Vec<(PlayerId, f64)> = profiles(ctx, pending)
            .iter()
            .map(|profile| (profile.player, profile.probability(Rank::Princess)))
            .filter(|(_, probability)| *probability >= ctx.params.prince_princess_threshold)
            .collect();
        if let Some(target) = max_score(&scored).and_then(|best| pick_best(&scored, best, rng)) {
            return Some(EffectParams::target(target));
        }
    }

    target_player(ctx, pending, status, rng)
        .or(self_allowed.then_some(ctx.me))
        .map(EffectParams::target)
}

/// Keeps the strongest card unless it makes this bot a target too early,
/// then returns the rest weakest first.
fn chancellor(ctx: &BotContext<'_>) -> EffectParams {
    let cards = ctx.hand().cards();
    let mut keep = strongest(cards.iter().enumerate());
    let safe_max = ctx.params.chancellor_safe_max;
    let too_strong = match (ctx.round_stage(), keep) {
        (RoundStage::Early, Some((_, rank))) => rank > safe_max,
        (RoundStage::Mid, Some((_, rank))) => rank == Rank::Princess,
        _ => false,
    };
    if too_strong {
        if let Some(safer) = strongest(cards.iter().enumerate().filter(|(_, c)| c.rank <= safe_max)) {
            keep = Some(safer);
        }
    }
    let keep = keep.map_or(0, |(index, _)| index);
    let mut bottom_order: Vec<usize> = (0..cards.len()).filter(|index| *index != keep).collect();
    bottom_order.sort_by_key(|index| (cards[*index].rank, *index));
    EffectParams::keep(keep, bottom_order)
}

/// Highest rank, earliest position on ties.
fn strongest<'c>(cards: impl Iterator<Item = (usize, &'c Card)>) -> Option<(usize, Rank)> {
    cards
        .max_by(|(ia, a), (ib, b)| a.rank.cmp(&b.rank).then(ib.cmp(ia)))
        .map(|(index, card)| (index, card.rank))
}

fn king<R: Rng + ?Sized>(
    ctx: &BotContext<'_>,
    pending: &PendingEffect,
    held: Card,
    status: ScoreStatus,
    rng: &mut R,
) -> Option<EffectParams> {
    // A weak card goes to whoever can least afford a better one.
    if ctx.better_card_outstanding(held.rank) {
        if let Some(target) = bottom_player(ctx, pending, rng) {
            return Some(EffectParams::target(target));
        }
    }
    if ctx.features.deduction_enabled() {
        let scored: Vec<(PlayerId, f64)> = profiles(ctx, pending)
            .iter()
            .filter(|profile| profile.source.is_some())
            .map(|profile| (profile.player, profile.expected_rank()))
            .collect();
        if let Some(target) = max_score(&scored).and_then(|best| pick_best(&scored, best, rng)) {
            return Some(EffectParams::target(target));
        }
    }
    target_player(ctx, pending, status, rng).map(EffectParams::target)
}
