//! Card effects as pure resolutions.
//!
//! [`resolve`] reads an immutable [`Game`] and returns what would happen, the
//! [`EffectResult`] for the history log plus a [`Mutation`] describing the
//! state change. [`apply`] performs the mutation. Previewing an effect is
//! resolving it without applying.

use crate::game::error::GameError;
use crate::game::state::Game;
use crate::model::card::Card;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::rank_set::{RankCounts, RankSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Guard,
    Priest,
    Baron,
    Prince,
    Chancellor,
    King,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Guard,
        EffectKind::Priest,
        EffectKind::Baron,
        EffectKind::Prince,
        EffectKind::Chancellor,
        EffectKind::King,
    ];

    /// Spy, Handmaid, Countess and Princess raise no effect.
    pub const fn from_rank(rank: Rank) -> Option<Self> {
        match rank {
            Rank::Guard => Some(EffectKind::Guard),
            Rank::Priest => Some(EffectKind::Priest),
            Rank::Baron => Some(EffectKind::Baron),
            Rank::Prince => Some(EffectKind::Prince),
            Rank::Chancellor => Some(EffectKind::Chancellor),
            Rank::King => Some(EffectKind::King),
            Rank::Spy | Rank::Handmaid | Rank::Countess | Rank::Princess => None,
        }
    }

    pub const fn rank(self) -> Rank {
        match self {
            EffectKind::Guard => Rank::Guard,
            EffectKind::Priest => Rank::Priest,
            EffectKind::Baron => Rank::Baron,
            EffectKind::Prince => Rank::Prince,
            EffectKind::Chancellor => Rank::Chancellor,
            EffectKind::King => Rank::King,
        }
    }

    pub const fn requires_target(self) -> bool {
        !matches!(self, EffectKind::Chancellor)
    }

    pub const fn includes_self(self) -> bool {
        matches!(self, EffectKind::Prince | EffectKind::Chancellor)
    }

    /// Guard and Priest may be declined.
    pub const fn is_required(self) -> bool {
        !matches!(self, EffectKind::Guard | EffectKind::Priest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEffect {
    pub effect: EffectKind,
    pub valid_targets: Vec<PlayerId>,
    pub required: bool,
}

impl PendingEffect {
    pub fn allows(&self, target: PlayerId) -> bool {
        self.valid_targets.contains(&target)
    }
}

/// Parameters chosen by whoever resolves a pending effect.
///
/// `keep` and `bottom_order` index into the Chancellor's hand after the
/// draw. An empty `bottom_order` returns the unkept cards in hand order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectParams {
    pub target: Option<PlayerId>,
    pub guess: Option<Rank>,
    pub keep: Option<usize>,
    pub bottom_order: Vec<usize>,
}

impl EffectParams {
    pub fn target(target: PlayerId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn guess(target: PlayerId, guess: Rank) -> Self {
        Self {
            target: Some(target),
            guess: Some(guess),
            ..Self::default()
        }
    }

    pub fn keep(keep: usize, bottom_order: Vec<usize>) -> Self {
        Self {
            keep: Some(keep),
            bottom_order,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub player: PlayerId,
    pub rank: Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub actor_card: Rank,
    pub target_card: Rank,
}

/// Outcome of an effect as recorded in the history.
///
/// `kept` and `returned` are private to the actor. `seen`, `tie_rank` and
/// `swap` are private to the actor and the target, who already knows their
/// own card. Use [`EffectResult::visible_to`] before handing a result to
/// anyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectResult {
    pub effect: EffectKind,
    pub target: Option<PlayerId>,
    pub guess: Option<Rank>,
    pub seen: Option<Rank>,
    pub eliminated: Option<Elimination>,
    pub tie_rank: Option<Rank>,
    pub possible: RankSet,
    pub swap: Option<Swap>,
    pub discarded: Option<Card>,
    pub kept: Option<Rank>,
    pub returned: Vec<Rank>,
}

impl EffectResult {
    fn new(effect: EffectKind, target: Option<PlayerId>) -> Self {
        Self {
            effect,
            target,
            guess: None,
            seen: None,
            eliminated: None,
            tie_rank: None,
            possible: RankSet::EMPTY,
            swap: None,
            discarded: None,
            kept: None,
            returned: Vec::new(),
        }
    }

    /// Copy of the result with fields the viewer may not know stripped.
    pub fn visible_to(&self, actor: PlayerId, viewer: PlayerId) -> Self {
        let is_actor = viewer == actor;
        let is_participant = is_actor || self.target == Some(viewer);
        let mut view = self.clone();
        if !is_actor {
            view.kept = None;
            view.returned.clear();
        }
        if !is_participant {
            view.seen = None;
            view.tie_rank = None;
            view.swap = None;
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    None,
    Eliminate(PlayerId),
    Redraw(PlayerId),
    Swap(PlayerId, PlayerId),
    KeepOne {
        player: PlayerId,
        keep: usize,
        bottom_order: Vec<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub result: EffectResult,
    pub mutation: Mutation,
}

/// Effect a card of `rank` played by `actor` would raise right now.
///
/// Returns `None` for ranks without an effect, when nobody is eligible, and
/// for a Chancellor facing an empty deck.
pub fn pending_for(game: &Game, actor: PlayerId, rank: Rank) -> Option<PendingEffect> {
    let effect = EffectKind::from_rank(rank)?;
    let valid_targets: Vec<PlayerId> = match effect {
        EffectKind::Chancellor => {
            if game.deck().is_empty() {
                return None;
            }
            vec![actor]
        }
        _ => game
            .players()
            .iter()
            .filter(|player| player.is_targetable())
            .filter(|player| effect.includes_self() || player.id != actor)
            .map(|player| player.id)
            .collect(),
    };
    if valid_targets.is_empty() {
        return None;
    }
    Some(PendingEffect {
        effect,
        required: effect.is_required(),
        valid_targets,
    })
}

/// Resolves `pending` for `actor` without touching the game.
pub fn resolve(
    game: &Game,
    actor: PlayerId,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    match pending.effect {
        EffectKind::Guard => resolve_guard(game, pending, params),
        EffectKind::Priest => resolve_priest(game, pending, params),
        EffectKind::Baron => resolve_baron(game, actor, pending, params),
        EffectKind::Prince => resolve_prince(game, pending, params),
        EffectKind::Chancellor => resolve_chancellor(game, actor, params),
        EffectKind::King => resolve_king(game, actor, pending, params),
    }
}

fn checked_target(pending: &PendingEffect, params: &EffectParams) -> Result<PlayerId, GameError> {
    let target = params
        .target
        .ok_or(GameError::MissingTarget(pending.effect))?;
    if !pending.allows(target) {
        return Err(GameError::InvalidTarget {
            effect: pending.effect,
            target,
        });
    }
    Ok(target)
}

fn held_rank(game: &Game, player: PlayerId) -> Result<Rank, GameError> {
    game.player(player)?
        .hand
        .first()
        .map(|card| card.rank)
        .ok_or(GameError::EmptyHand(player))
}

fn resolve_guard(
    game: &Game,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let target = checked_target(pending, params)?;
    let guess = match params.guess {
        Some(Rank::Guard) | None => return Err(GameError::InvalidGuess),
        Some(guess) => guess,
    };
    let mut result = EffectResult::new(EffectKind::Guard, Some(target));
    result.guess = Some(guess);
    let mutation = if held_rank(game, target)? == guess {
        result.eliminated = Some(Elimination {
            player: target,
            rank: guess,
        });
        Mutation::Eliminate(target)
    } else {
        Mutation::None
    };
    Ok(Resolution { result, mutation })
}

fn resolve_priest(
    game: &Game,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let target = checked_target(pending, params)?;
    let mut result = EffectResult::new(EffectKind::Priest, Some(target));
    result.seen = Some(held_rank(game, target)?);
    Ok(Resolution {
        result,
        mutation: Mutation::None,
    })
}

fn resolve_baron(
    game: &Game,
    actor: PlayerId,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let target = checked_target(pending, params)?;
    let mine = held_rank(game, actor)?;
    let theirs = held_rank(game, target)?;
    let unaccounted = discard_complement(game);
    let mut result = EffectResult::new(EffectKind::Baron, Some(target));

    let loser = match mine.cmp(&theirs) {
        std::cmp::Ordering::Greater => Some((target, theirs)),
        std::cmp::Ordering::Less => Some((actor, mine)),
        std::cmp::Ordering::Equal => None,
    };

    let mutation = match loser {
        Some((player, rank)) => {
            result.eliminated = Some(Elimination { player, rank });
            result.possible = RankSet::from_ranks(
                unaccounted
                    .support()
                    .iter()
                    .filter(|candidate| *candidate > rank),
            );
            Mutation::Eliminate(player)
        }
        None => {
            result.tie_rank = Some(mine);
            result.possible = RankSet::from_ranks(
                Rank::ORDERED
                    .into_iter()
                    .filter(|rank| unaccounted.count(*rank) >= 2),
            );
            Mutation::None
        }
    };
    Ok(Resolution { result, mutation })
}

fn resolve_prince(
    game: &Game,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let target = checked_target(pending, params)?;
    let discarded = game
        .player(target)?
        .hand
        .first()
        .ok_or(GameError::EmptyHand(target))?;
    let mut result = EffectResult::new(EffectKind::Prince, Some(target));
    result.discarded = Some(discarded);
    let mutation = if discarded.is_princess() {
        result.eliminated = Some(Elimination {
            player: target,
            rank: Rank::Princess,
        });
        Mutation::Eliminate(target)
    } else {
        Mutation::Redraw(target)
    };
    Ok(Resolution { result, mutation })
}

fn resolve_chancellor(
    game: &Game,
    actor: PlayerId,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let hand = &game.player(actor)?.hand;
    let len = hand.len();
    let keep = params.keep.ok_or(GameError::InvalidKeep { index: None, len })?;
    let kept = hand.get(keep).ok_or(GameError::InvalidKeep {
        index: Some(keep),
        len,
    })?;

    let unkept: Vec<usize> = (0..len).filter(|index| *index != keep).collect();
    let bottom_order = if params.bottom_order.is_empty() {
        unkept
    } else {
        let mut sorted = params.bottom_order.clone();
        sorted.sort_unstable();
        if sorted != unkept {
            return Err(GameError::InvalidReturnOrder);
        }
        params.bottom_order.clone()
    };

    let mut result = EffectResult::new(EffectKind::Chancellor, Some(actor));
    result.kept = Some(kept.rank);
    result.returned = bottom_order
        .iter()
        .filter_map(|index| hand.get(*index))
        .map(|card| card.rank)
        .collect();
    Ok(Resolution {
        result,
        mutation: Mutation::KeepOne {
            player: actor,
            keep,
            bottom_order,
        },
    })
}

fn resolve_king(
    game: &Game,
    actor: PlayerId,
    pending: &PendingEffect,
    params: &EffectParams,
) -> Result<Resolution, GameError> {
    let target = checked_target(pending, params)?;
    let mut result = EffectResult::new(EffectKind::King, Some(target));
    result.swap = Some(Swap {
        actor_card: held_rank(game, actor)?,
        target_card: held_rank(game, target)?,
    });
    Ok(Resolution {
        result,
        mutation: Mutation::Swap(actor, target),
    })
}

/// Catalog minus every discard pile.
fn discard_complement(game: &Game) -> RankCounts {
    let mut counts = RankCounts::catalog();
    for card in game.players().iter().flat_map(|player| player.discards.iter()) {
        counts.remove(card.rank);
    }
    counts
}

/// Applies a resolved mutation to the live game.
pub(crate) fn apply(game: &mut Game, mutation: &Mutation) -> Result<(), GameError> {
    match mutation {
        Mutation::None => {}
        Mutation::Eliminate(player) => {
            game.player_mut(*player)?.eliminate();
            tracing::debug!(target: "letter_core::effect", player = %player, "player eliminated");
        }
        Mutation::Redraw(player) => {
            let replacement = match game.deck_mut().draw() {
                Some(card) => Some(card),
                None => game.take_aside(),
            };
            let target = game.player_mut(*player)?;
            let dropped = target.hand.take_all();
            target.discards.extend(dropped);
            if let Some(card) = replacement {
                target.hand.add(card);
            }
        }
        Mutation::Swap(actor, target) => {
            let actor_cards = game.player_mut(*actor)?.hand.take_all();
            let target_cards = game.player_mut(*target)?.hand.replace(actor_cards);
            game.player_mut(*actor)?.hand.replace(target_cards);
        }
        Mutation::KeepOne {
            player,
            keep,
            bottom_order,
        } => {
            let seat = game.player_mut(*player)?;
            let cards = seat.hand.take_all();
            let kept = cards.get(*keep).copied().ok_or(GameError::InvalidKeep {
                index: Some(*keep),
                len: cards.len(),
            })?;
            seat.hand.add(kept);
            let returned: Vec<Card> = bottom_order
                .iter()
                .filter_map(|index| cards.get(*index).copied())
                .collect();
            game.deck_mut().put_bottom(&returned);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hand::Hand;

    fn card(rank: Rank) -> Card {
        Card::new(rank, 0)
    }

    fn game_with_hands(hands: &[&[Rank]]) -> Game {
        let mut game = Game::for_tests(hands.len());
        for (index, ranks) in hands.iter().enumerate() {
            let player = game
                .player_mut(PlayerId::from_index(index))
                .expect("seat exists");
            player.hand = Hand::with_cards(ranks.iter().map(|rank| card(*rank)).collect());
        }
        game
    }

    #[test]
    fn effect_kinds_map_from_ranks() {
        assert_eq!(EffectKind::from_rank(Rank::Spy), None);
        assert_eq!(EffectKind::from_rank(Rank::Princess), None);
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_rank(kind.rank()), Some(kind));
        }
        assert!(!EffectKind::Guard.is_required());
        assert!(EffectKind::Baron.is_required());
    }

    #[test]
    fn pending_skips_protected_and_eliminated() {
        let mut game = game_with_hands(&[&[Rank::Guard], &[Rank::Priest], &[Rank::Baron]]);
        game.player_mut(PlayerId(1)).unwrap().protected = true;
        game.player_mut(PlayerId(2)).unwrap().eliminated = true;
        assert_eq!(pending_for(&game, PlayerId(0), Rank::Guard), None);

        let prince = pending_for(&game, PlayerId(0), Rank::Prince).expect("self is eligible");
        assert_eq!(prince.valid_targets, vec![PlayerId(0)]);
    }

    #[test]
    fn guard_guess_eliminates_on_match() {
        let game = game_with_hands(&[&[Rank::Spy], &[Rank::King]]);
        let pending = pending_for(&game, PlayerId(0), Rank::Guard).unwrap();
        let hit = resolve(&game, PlayerId(0), &pending, &EffectParams::guess(PlayerId(1), Rank::King)).unwrap();
        assert_eq!(hit.mutation, Mutation::Eliminate(PlayerId(1)));
        let miss = resolve(&game, PlayerId(0), &pending, &EffectParams::guess(PlayerId(1), Rank::Prince)).unwrap();
        assert_eq!(miss.mutation, Mutation::None);
        assert_eq!(miss.result.eliminated, None);
        assert_eq!(
            resolve(&game, PlayerId(0), &pending, &EffectParams::guess(PlayerId(1), Rank::Guard)),
            Err(GameError::InvalidGuess)
        );
    }

    #[test]
    fn baron_loss_publishes_ranks_above_loser() {
        let game = game_with_hands(&[&[Rank::Baron], &[Rank::King]]);
        let pending = pending_for(&game, PlayerId(0), Rank::Baron).unwrap();
        let resolution = resolve(&game, PlayerId(0), &pending, &EffectParams::target(PlayerId(1))).unwrap();
        assert_eq!(
            resolution.result.eliminated,
            Some(Elimination {
                player: PlayerId(0),
                rank: Rank::Baron
            })
        );
        assert!(resolution.result.possible.iter().all(|rank| rank > Rank::Baron));
        assert!(resolution.result.possible.contains(Rank::King));
    }

    #[test]
    fn baron_tie_publishes_ranks_with_two_unaccounted_copies() {
        let mut game = game_with_hands(&[&[Rank::Priest], &[Rank::Priest]]);
        game.player_mut(PlayerId(1))
            .unwrap()
            .discards
            .extend([Card::new(Rank::Spy, 0), Card::new(Rank::Handmaid, 0)]);
        let pending = pending_for(&game, PlayerId(0), Rank::Baron).unwrap();
        let resolution = resolve(&game, PlayerId(0), &pending, &EffectParams::target(PlayerId(1))).unwrap();
        assert_eq!(resolution.mutation, Mutation::None);
        assert_eq!(resolution.result.tie_rank, Some(Rank::Priest));
        let possible = resolution.result.possible;
        assert!(possible.contains(Rank::Guard));
        assert!(possible.contains(Rank::Priest));
        assert!(!possible.contains(Rank::Spy));
        assert!(!possible.contains(Rank::Handmaid));
        assert!(!possible.contains(Rank::King));
    }

    #[test]
    fn private_fields_hidden_from_bystanders() {
        let game = game_with_hands(&[&[Rank::Guard], &[Rank::Countess], &[Rank::Spy]]);
        let pending = pending_for(&game, PlayerId(0), Rank::King).unwrap();
        let resolution = resolve(&game, PlayerId(0), &pending, &EffectParams::target(PlayerId(1))).unwrap();
        let bystander = resolution.result.visible_to(PlayerId(0), PlayerId(2));
        assert_eq!(bystander.swap, None);
        let target_view = resolution.result.visible_to(PlayerId(0), PlayerId(1));
        assert_eq!(
            target_view.swap,
            Some(Swap {
                actor_card: Rank::Guard,
                target_card: Rank::Countess
            })
        );
    }

    #[test]
    fn chancellor_rejects_return_order_with_kept_card() {
        let game = game_with_hands(&[&[Rank::Guard, Rank::King, Rank::Spy], &[Rank::Priest]]);
        let pending = PendingEffect {
            effect: EffectKind::Chancellor,
            valid_targets: vec![PlayerId(0)],
            required: true,
        };
        let bad = resolve(&game, PlayerId(0), &pending, &EffectParams::keep(1, vec![1, 2]));
        assert_eq!(bad, Err(GameError::InvalidReturnOrder));
        let good = resolve(&game, PlayerId(0), &pending, &EffectParams::keep(1, vec![2, 0])).unwrap();
        assert_eq!(good.result.kept, Some(Rank::King));
        assert_eq!(good.result.returned, vec![Rank::Spy, Rank::Guard]);
    }
}
