use crate::game::effect::{self, EffectKind, EffectParams, EffectResult, PendingEffect};
use crate::game::error::GameError;
use crate::game::history::{HistoryEntry, SkipReason};
use crate::game::state::{Game, GameStatus};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::rank_set::RankCounts;
use rand::Rng;
use tracing::{Level, event};

impl Game {
    /// Starts a round with a freshly shuffled deck.
    pub fn init_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.init_round_with_deck(Deck::shuffled(rng))
    }

    /// Starts a round with `deck` as dealt order. The deck must be the
    /// full catalog.
    pub fn init_round_with_deck(&mut self, deck: Deck) -> Result<(), GameError> {
        if !matches!(self.status, GameStatus::Initialized | GameStatus::RoundEnded) {
            return Err(GameError::WrongStatus {
                expected: GameStatus::RoundEnded,
                actual: self.status,
            });
        }
        if deck.len() != Rank::catalog_size()
            || RankCounts::from_cards(deck.cards().iter()) != RankCounts::catalog()
        {
            return Err(GameError::InvalidDeck);
        }

        for player in &mut self.players {
            player.reset_for_round();
        }
        self.deck = deck;
        self.aside = None;
        self.status = GameStatus::InProgress;
        self.round_number += 1;
        event!(
            target: "letter_core::round",
            Level::DEBUG,
            round = self.round_number,
            players = self.players.len(),
            "round initialized"
        );
        Ok(())
    }

    /// Sets one card aside, deals one card to each seat starting at the
    /// current turn, then gives the current player their second card.
    pub fn distribute_initial_cards(&mut self) -> Result<(), GameError> {
        self.expect_status(GameStatus::InProgress)?;
        let start = self.turn.ok_or(GameError::NoTurn)?;
        if self.players.iter().any(|player| !player.hand.is_empty()) || self.aside.is_some() {
            return Err(GameError::AlreadyDealt);
        }

        self.aside = self.deck.draw();
        let count = self.players.len();
        for offset in 0..count {
            let seat = (start.index() + offset) % count;
            if let Some(card) = self.deck.draw() {
                self.players[seat].hand.add(card);
            }
        }
        self.draw_for(start)
    }

    /// Passes the turn to the next player still in the round and draws
    /// their card. `None` once nobody can take a turn.
    pub fn next_turn(&mut self) -> Result<Option<PlayerId>, GameError> {
        if self.status != GameStatus::InProgress {
            return Ok(None);
        }
        if let Some((player, _)) = self.pending_effect() {
            return Err(GameError::EffectPending(player));
        }
        let current = self.turn.ok_or(GameError::NoTurn)?;
        let count = self.players.len();
        let next = (1..=count)
            .map(|offset| PlayerId::from_index((current.index() + offset) % count))
            .find(|id| !self.players[id.index()].eliminated);

        let Some(next) = next else {
            return Ok(None);
        };
        self.turn = Some(next);
        self.players[next.index()].protected = false;
        self.draw_for(next)?;
        Ok(Some(next))
    }

    fn draw_for(&mut self, id: PlayerId) -> Result<(), GameError> {
        let card = self.deck.draw();
        let player = self.player_mut(id)?;
        if let Some(card) = card {
            player.hand.add(card);
        }
        player.refresh_forced_play();
        Ok(())
    }

    /// Plays the card at `index` from `player`'s hand and returns it.
    ///
    /// A Countess held with a Prince or King is played whatever the index.
    pub fn play_card(&mut self, player: PlayerId, index: usize) -> Result<Card, GameError> {
        self.expect_status(GameStatus::InProgress)?;
        let expected = self.turn.ok_or(GameError::NoTurn)?;
        if expected != player {
            return Err(GameError::OutOfTurn {
                expected,
                actual: player,
            });
        }
        if let Some((pending, _)) = self.pending_effect() {
            return Err(GameError::EffectPending(pending));
        }

        let seat = self.player_mut(player)?;
        if seat.eliminated {
            return Err(GameError::Eliminated(player));
        }
        let len = seat.hand.len();
        if len != 2 {
            return Err(GameError::HandSize { player, len });
        }
        if index >= len {
            return Err(GameError::CardIndex { index, len });
        }

        let forced = seat.must_play_countess || seat.hand.forces_countess();
        let index = if forced {
            seat.hand.position_of(Rank::Countess).unwrap_or(index)
        } else {
            index
        };
        let card = seat
            .hand
            .remove_at(index)
            .ok_or(GameError::CardIndex { index, len })?;
        seat.discards.push(card);
        seat.protected = card.rank == Rank::Handmaid;
        seat.must_play_countess = false;
        let kept = seat.hand.first();

        if card.is_princess() {
            seat.eliminate();
        }
        self.history.push(HistoryEntry::CardPlayed {
            actor: player,
            card,
            kept,
            forced,
        });
        if card.is_princess() {
            event!(
                target: "letter_core::effect",
                Level::DEBUG,
                player = %player,
                "princess discarded"
            );
            return Ok(card);
        }

        if let Some(kind) = EffectKind::from_rank(card.rank) {
            self.raise_effect(player, kind)?;
        }
        Ok(card)
    }

    fn raise_effect(&mut self, actor: PlayerId, kind: EffectKind) -> Result<(), GameError> {
        let Some(pending) = effect::pending_for(self, actor, kind.rank()) else {
            let reason = if kind == EffectKind::Chancellor {
                SkipReason::EmptyDeck
            } else {
                SkipReason::NoTargets
            };
            self.history.push(HistoryEntry::EffectSkipped {
                actor,
                effect: kind,
                reason,
            });
            return Ok(());
        };

        if kind == EffectKind::Chancellor {
            for _ in 0..2 {
                let Some(card) = self.deck.draw() else { break };
                self.player_mut(actor)?.hand.add(card);
            }
        }
        self.player_mut(actor)?.pending_effect = Some(pending);
        Ok(())
    }

    /// What resolving the live pending effect with `params` would do.
    /// Never mutates the game.
    pub fn preview_effect(&self, params: &EffectParams) -> Result<effect::Resolution, GameError> {
        let (actor, pending) = self.pending_effect().ok_or(GameError::NoPendingEffect)?;
        effect::resolve(self, actor, pending, params)
    }

    /// Resolves the live pending effect.
    ///
    /// `None` declines an optional effect and returns `Ok(None)`.
    pub fn resolve_effect(
        &mut self,
        params: Option<EffectParams>,
    ) -> Result<Option<EffectResult>, GameError> {
        let (actor, pending) = self
            .pending_effect()
            .map(|(actor, pending)| (actor, pending.clone()))
            .ok_or(GameError::NoPendingEffect)?;

        let Some(params) = params else {
            return self.decline(actor, &pending);
        };

        let resolution = effect::resolve(self, actor, &pending, &params)?;
        self.player_mut(actor)?.pending_effect = None;
        effect::apply(self, &resolution.mutation)?;
        self.history.push(HistoryEntry::EffectResolved {
            actor,
            result: resolution.result.clone(),
        });
        event!(
            target: "letter_core::effect",
            Level::DEBUG,
            actor = %actor,
            effect = ?pending.effect,
            target = ?resolution.result.target,
            eliminated = ?resolution.result.eliminated.map(|e| e.player),
            "effect resolved"
        );
        Ok(Some(resolution.result))
    }

    fn decline(
        &mut self,
        actor: PlayerId,
        pending: &PendingEffect,
    ) -> Result<Option<EffectResult>, GameError> {
        if pending.required {
            return Err(GameError::ParamsRequired(pending.effect));
        }
        self.player_mut(actor)?.pending_effect = None;
        self.history.push(HistoryEntry::EffectSkipped {
            actor,
            effect: pending.effect,
            reason: SkipReason::Declined,
        });
        Ok(None)
    }
}
