//! What the bot can infer about hidden hands from the round history.
//!
//! Everything here reads the viewer-filtered history, so a bot only learns
//! from effects it took part in plus the public parts of everyone else's.

use crate::bot::RoundStage;
use letter_core::game::{EffectKind, EffectResult, Game, HistoryEntry};
use letter_core::model::hand::Hand;
use letter_core::model::player::PlayerId;
use letter_core::model::rank::Rank;
use letter_core::model::rank_set::{RankCounts, RankSet};
use serde::Serialize;
use std::cmp::Reverse;

/// Where a constraint on a hidden card came from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ClueKind {
    Seen,
    BaronTie,
    KingSwap,
    BaronWinner,
    Countess,
}

/// Ranks a Countess discard suggests the other card is.
const COUNTESS_COMPANIONS: RankSet = RankSet::single(Rank::Prince)
    .with(Rank::King)
    .with(Rank::Princess);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentProfile {
    pub player: PlayerId,
    /// Unaccounted cards the opponent's hidden card may be.
    pub candidates: RankCounts,
    pub source: Option<ClueKind>,
}

impl OpponentProfile {
    pub fn known(&self) -> Option<Rank> {
        self.candidates.support().only()
    }

    pub fn probability(&self, rank: Rank) -> f64 {
        self.candidates.probability(rank)
    }

    pub fn probability_above(&self, rank: Rank) -> f64 {
        self.candidates.probability_above(rank)
    }

    /// Most likely ranks outside `exclude`, with their shared probability
    /// among the remaining candidates.
    pub fn most_probable(&self, exclude: RankSet) -> Option<(RankSet, f64)> {
        let allowed = RankSet::from_ranks(Rank::ORDERED.into_iter().filter(|r| !exclude.contains(*r)));
        let filtered = self.candidates.filter(allowed);
        let (ranks, count) = filtered.most_frequent();
        if count == 0 {
            return None;
        }
        Some((ranks, count as f64 / filtered.total() as f64))
    }

    pub fn expected_rank(&self) -> f64 {
        self.candidates.expected_value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clue {
    pub player: PlayerId,
    pub kind: ClueKind,
    pub ranks: RankSet,
}

/// A card in my hand that some active opponent knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exposure {
    pub rank: Rank,
    pub kind: ClueKind,
    pub by: PlayerId,
}

struct Observation {
    suspect: PlayerId,
    kind: ClueKind,
    ranks: RankSet,
}

/// Constraints `entry` puts on hidden cards, as seen by `me`.
fn observations(entry: &HistoryEntry, me: PlayerId) -> Vec<Observation> {
    let mut found = Vec::new();
    match entry {
        HistoryEntry::CardPlayed { actor, card, .. } if card.rank == Rank::Countess => {
            found.push(Observation {
                suspect: *actor,
                kind: ClueKind::Countess,
                ranks: COUNTESS_COMPANIONS,
            });
        }
        HistoryEntry::EffectResolved { actor, result } => {
            effect_observations(*actor, result, me, &mut found);
        }
        _ => {}
    }
    found
}

fn effect_observations(
    actor: PlayerId,
    result: &EffectResult,
    me: PlayerId,
    found: &mut Vec<Observation>,
) {
    let Some(target) = result.target else {
        return;
    };
    let other = if actor == me { Some(target) } else if target == me { Some(actor) } else { None };
    match result.effect {
        EffectKind::Priest => {
            if let (true, Some(seen)) = (actor == me, result.seen) {
                found.push(Observation {
                    suspect: target,
                    kind: ClueKind::Seen,
                    ranks: RankSet::single(seen),
                });
            }
        }
        EffectKind::Baron => match (result.eliminated, result.tie_rank, other) {
            (None, Some(rank), Some(other)) => found.push(Observation {
                suspect: other,
                kind: ClueKind::BaronTie,
                ranks: RankSet::single(rank),
            }),
            (None, _, _) if !result.possible.is_empty() => {
                for suspect in [actor, target] {
                    found.push(Observation {
                        suspect,
                        kind: ClueKind::BaronTie,
                        ranks: result.possible,
                    });
                }
            }
            (Some(loser), _, _) if !result.possible.is_empty() => {
                let winner = if loser.player == actor { target } else { actor };
                found.push(Observation {
                    suspect: winner,
                    kind: ClueKind::BaronWinner,
                    ranks: result.possible,
                });
            }
            _ => {}
        },
        EffectKind::King => {
            if let (Some(swap), Some(other)) = (result.swap, other) {
                let given = if actor == me { swap.actor_card } else { swap.target_card };
                found.push(Observation {
                    suspect: other,
                    kind: ClueKind::KingSwap,
                    ranks: RankSet::single(given),
                });
            }
        }
        EffectKind::Guard | EffectKind::Prince | EffectKind::Chancellor => {}
    }
}

/// True when `entry` leaves `player` holding a card unrelated to before.
fn replaces_hand(entry: &HistoryEntry, player: PlayerId) -> bool {
    let HistoryEntry::EffectResolved { actor, result } = entry else {
        return false;
    };
    match result.effect {
        EffectKind::Prince => result.target == Some(player),
        EffectKind::King => *actor == player || result.target == Some(player),
        EffectKind::Chancellor => *actor == player,
        EffectKind::Guard | EffectKind::Priest | EffectKind::Baron => false,
    }
}

/// Narrowed set and strongest source for one suspect, newest evidence first.
fn narrow(view: &[HistoryEntry], me: PlayerId, suspect: PlayerId) -> Option<(RankSet, ClueKind)> {
    let mut narrowed: Option<(RankSet, ClueKind)> = None;
    let mut played_since = RankSet::EMPTY;
    for entry in view.iter().rev() {
        for observation in observations(entry, me) {
            if observation.suspect != suspect || !observation.ranks.intersect(played_since).is_empty() {
                continue;
            }
            narrowed = match narrowed {
                None => Some((observation.ranks, observation.kind)),
                Some((ranks, kind)) => {
                    let both = ranks.intersect(observation.ranks);
                    if both.is_empty() {
                        Some((ranks, kind))
                    } else {
                        Some((both, kind.min(observation.kind)))
                    }
                }
            };
        }
        if replaces_hand(entry, suspect) {
            break;
        }
        if let HistoryEntry::CardPlayed { actor, card, .. } = entry {
            if *actor == suspect {
                played_since = played_since.with(card.rank);
            }
        }
    }
    narrowed
}

pub(crate) fn infer_from_view(game: &Game, me: PlayerId, view: &[HistoryEntry]) -> Vec<OpponentProfile> {
    let remaining = game.remaining_cards(me);
    game.active_players()
        .filter(|player| player.id != me && player.is_targetable())
        .map(|player| {
            let narrowed = narrow(view, me, player.id)
                .map(|(ranks, kind)| (remaining.filter(ranks), kind))
                .filter(|(candidates, _)| !candidates.is_empty());
            match narrowed {
                Some((candidates, kind)) => OpponentProfile {
                    player: player.id,
                    candidates,
                    source: Some(kind),
                },
                None => OpponentProfile {
                    player: player.id,
                    candidates: remaining,
                    source: None,
                },
            }
        })
        .collect()
}

/// Per targetable opponent, the unaccounted cards their hidden card may be.
pub fn infer_opponent_ranks(game: &Game, me: PlayerId) -> Vec<OpponentProfile> {
    let view = game.history().round_view(me);
    infer_from_view(game, me, &view)
}

pub(crate) fn clues_from_view(game: &Game, me: PlayerId, view: &[HistoryEntry]) -> Vec<Clue> {
    let mut clues: Vec<(Clue, u32)> = infer_from_view(game, me, view)
        .into_iter()
        .filter_map(|profile| {
            let kind = profile.source?;
            let score = game.player(profile.player).map_or(0, |player| player.score);
            Some((
                Clue {
                    player: profile.player,
                    kind,
                    ranks: profile.candidates.support(),
                },
                score,
            ))
        })
        .collect();
    clues.sort_by_key(|(clue, score)| (clue.kind, Reverse(*score), clue.player));
    clues.into_iter().map(|(clue, _)| clue).collect()
}

/// Opponents with a sourced constraint, strongest clue first and the higher
/// scorer first within a kind.
pub fn collect_clues(game: &Game, me: PlayerId) -> Vec<Clue> {
    let view = game.history().round_view(me);
    clues_from_view(game, me, &view)
}

pub(crate) fn exposure_from_view(
    game: &Game,
    me: PlayerId,
    hand: &Hand,
    view: &[HistoryEntry],
) -> Option<Exposure> {
    let still_in = |player: PlayerId| game.player(player).is_ok_and(|p| !p.eliminated);
    let mut played_since = RankSet::EMPTY;
    let mut exposures: Vec<Exposure> = Vec::new();
    let mut note = |rank: Rank, kind: ClueKind, by: PlayerId, played: RankSet| {
        if hand.contains_rank(rank) && !played.contains(rank) && still_in(by) {
            exposures.push(Exposure { rank, kind, by });
        }
    };

    for entry in view.iter().rev() {
        match entry {
            HistoryEntry::EffectResolved { actor, result } => {
                let other = match result.target {
                    Some(target) if *actor == me => Some(target),
                    Some(target) if target == me => Some(*actor),
                    _ => None,
                };
                match (result.effect, other) {
                    (EffectKind::Priest, Some(by)) if result.target == Some(me) => {
                        if let Some(seen) = result.seen {
                            let weak_other = hand
                                .iter()
                                .any(|card| card.rank != seen && card.rank <= Rank::Priest);
                            if !(seen == Rank::Baron && weak_other) {
                                note(seen, ClueKind::Seen, by, played_since);
                            }
                        }
                    }
                    (EffectKind::King, Some(by)) => {
                        if let Some(swap) = result.swap {
                            let received = if *actor == me { swap.target_card } else { swap.actor_card };
                            note(received, ClueKind::KingSwap, by, played_since);
                        }
                    }
                    (EffectKind::Baron, Some(by)) => match (result.tie_rank, result.eliminated) {
                        (Some(rank), None) => note(rank, ClueKind::BaronTie, by, played_since),
                        (None, Some(loser)) if loser.player != me => {
                            let above: Vec<Rank> = hand
                                .iter()
                                .map(|card| card.rank)
                                .filter(|rank| *rank > loser.rank)
                                .collect();
                            if let [only] = above.as_slice() {
                                note(*only, ClueKind::BaronWinner, by, played_since);
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
            HistoryEntry::CardPlayed {
                actor,
                card,
                kept: Some(kept),
                ..
            } if *actor == me && card.rank == Rank::Countess => {
                let telling = kept.rank == Rank::Prince
                    || (kept.rank == Rank::King && RoundStage::of(game) == RoundStage::Late);
                if telling {
                    note(kept.rank, ClueKind::Countess, me, played_since);
                }
            }
            _ => {}
        }
        if replaces_hand(entry, me) {
            break;
        }
        if let HistoryEntry::CardPlayed { actor, card, .. } = entry {
            if *actor == me {
                played_since = played_since.with(card.rank);
            }
        }
    }
    exposures.into_iter().min_by_key(|exposure| exposure.kind)
}

/// A card I hold that an active opponent has learned, strongest source first.
///
/// Evidence older than my last hand replacement is ignored, as is a card I
/// have played since it was revealed.
pub fn exposed_card(game: &Game, me: PlayerId) -> Option<Exposure> {
    let hand = &game.player(me).ok()?.hand;
    let view = game.history().round_view(me);
    exposure_from_view(game, me, hand, &view)
}
