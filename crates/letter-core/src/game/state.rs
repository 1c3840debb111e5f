use crate::game::effect::PendingEffect;
use crate::game::error::GameError;
use crate::game::history::History;
use crate::game::names;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::{Player, PlayerId};
use crate::model::rank::Rank;
use crate::model::rank_set::RankCounts;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Initialized,
    InProgress,
    RoundEnded,
    Finished,
}

/// A human seat supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatedUser {
    pub name: String,
}

impl SeatedUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub(crate) players: Vec<Player>,
    pub(crate) deck: Deck,
    pub(crate) aside: Option<Card>,
    pub(crate) turn: Option<PlayerId>,
    pub(crate) status: GameStatus,
    pub(crate) history: History,
    pub(crate) round_number: u32,
}

impl Game {
    /// Seats `seated` first and fills the remaining seats with named bots.
    pub fn new<R: Rng + ?Sized>(
        seated: &[SeatedUser],
        total_players: usize,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&total_players) {
            return Err(GameError::PlayerCount(total_players));
        }
        if seated.len() > total_players {
            return Err(GameError::TooManySeated {
                seated: seated.len(),
                total: total_players,
            });
        }

        let mut players = Vec::with_capacity(total_players);
        for (index, user) in seated.iter().enumerate() {
            players.push(Player::new(PlayerId::from_index(index), user.name.clone(), false));
        }
        for index in seated.len()..total_players {
            let name = names::generate_short_name(rng);
            players.push(Player::new(PlayerId::from_index(index), name, true));
        }

        Ok(Self {
            players,
            deck: Deck::empty(),
            aside: None,
            turn: None,
            status: GameStatus::Initialized,
            history: History::new(),
            round_number: 0,
        })
    }

    pub fn random_starting_player<R: Rng + ?Sized>(&self, rng: &mut R) -> PlayerId {
        PlayerId::from_index(rng.gen_range(0..self.players.len()))
    }

    pub fn init_turn(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.player(player)?;
        self.turn = Some(player);
        Ok(())
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(id.index())
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id.index())
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn turn(&self) -> Option<PlayerId> {
        self.turn
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.turn.and_then(|id| self.players.get(id.index()))
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub(crate) fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub fn aside(&self) -> Option<Card> {
        self.aside
    }

    pub(crate) fn take_aside(&mut self) -> Option<Card> {
        self.aside.take()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The one player with an unresolved effect, if any.
    pub fn pending_effect(&self) -> Option<(PlayerId, &PendingEffect)> {
        self.players
            .iter()
            .find_map(|player| player.pending_effect.as_ref().map(|effect| (player.id, effect)))
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| !player.eliminated)
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    /// Catalog minus every discard and minus `observer`'s own hand.
    ///
    /// Opponents' hands, the deck and the aside card stay in the result:
    /// they are exactly what `observer` cannot see.
    pub fn remaining_cards(&self, observer: PlayerId) -> RankCounts {
        let mut counts = RankCounts::catalog();
        for card in self.players.iter().flat_map(|player| player.discards.iter()) {
            counts.remove(card.rank);
        }
        if let Some(player) = self.players.get(observer.index()) {
            for card in player.hand.iter() {
                counts.remove(card.rank);
            }
        }
        counts
    }

    /// Every card currently placed: deck, hands, discards and aside.
    pub fn placed_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.deck.cards().to_vec();
        for player in &self.players {
            cards.extend(player.hand.iter().copied());
            cards.extend(player.discards.iter().copied());
        }
        cards.extend(self.aside);
        cards
    }

    pub fn card_total(&self) -> usize {
        self.placed_cards().len()
    }

    /// Placed cards form the catalog exactly, each physical card once.
    pub fn is_conserved(&self) -> bool {
        let cards = self.placed_cards();
        if cards.len() != Rank::catalog_size() {
            return false;
        }
        let mut unique = cards.clone();
        unique.sort_by_key(|card| (card.rank, card.copy));
        unique.dedup();
        unique.len() == cards.len() && RankCounts::from_cards(cards.iter()) == RankCounts::catalog()
    }

    pub(crate) fn expect_status(&self, expected: GameStatus) -> Result<(), GameError> {
        if self.status != expected {
            return Err(GameError::WrongStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(count: usize) -> Self {
        let players = (0..count)
            .map(|index| Player::new(PlayerId::from_index(index), format!("P{index}"), true))
            .collect();
        Self {
            players,
            deck: Deck::standard(),
            aside: None,
            turn: Some(PlayerId(0)),
            status: GameStatus::InProgress,
            history: History::new(),
            round_number: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn new_fills_empty_seats_with_bots() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = Game::new(&[SeatedUser::new("Ada")], 4, &mut rng).unwrap();
        assert_eq!(game.player_count(), 4);
        assert_eq!(game.status(), GameStatus::Initialized);
        assert!(!game.players()[0].is_bot);
        assert_eq!(game.players()[0].name, "Ada");
        assert!(game.players()[1..].iter().all(|player| player.is_bot));
        assert!(game.players()[1..].iter().all(|player| !player.name.is_empty()));
    }

    #[test]
    fn new_rejects_bad_player_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(Game::new(&[], 1, &mut rng), Err(GameError::PlayerCount(1)));
        assert_eq!(Game::new(&[], 7, &mut rng), Err(GameError::PlayerCount(7)));
        let seated = vec![SeatedUser::new("a"), SeatedUser::new("b"), SeatedUser::new("c")];
        assert_eq!(
            Game::new(&seated, 2, &mut rng),
            Err(GameError::TooManySeated { seated: 3, total: 2 })
        );
    }

    #[test]
    fn remaining_cards_exclude_discards_and_own_hand() {
        let mut game = Game::for_tests(2);
        game.players[0].hand.add(Card::new(Rank::Princess, 0));
        game.players[1].hand.add(Card::new(Rank::King, 0));
        game.players[1].discards.push(Card::new(Rank::Guard, 3));
        let remaining = game.remaining_cards(PlayerId(0));
        assert_eq!(remaining.total(), 19);
        assert_eq!(remaining.count(Rank::Princess), 0);
        assert_eq!(remaining.count(Rank::King), 1);
        assert_eq!(remaining.count(Rank::Guard), 5);
    }
}
