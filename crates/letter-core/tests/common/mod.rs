#![allow(dead_code)]

use letter_core::game::{Game, SeatedUser};
use letter_core::model::card::Card;
use letter_core::model::deck::Deck;
use letter_core::model::player::PlayerId;
use letter_core::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Full catalog deck whose first draws are `draws`, in order. The rest of
/// the catalog sits underneath in rank order.
pub fn stacked_deck(draws: &[Rank]) -> Deck {
    let mut rest = Deck::standard().cards().to_vec();
    let mut top = Vec::with_capacity(draws.len());
    for rank in draws {
        let position = rest
            .iter()
            .position(|card| card.rank == *rank)
            .unwrap_or_else(|| panic!("catalog has no spare {rank}"));
        top.push(rest.remove(position));
    }
    rest.extend(top.into_iter().rev());
    Deck::from_cards(rest)
}

/// Deck built bottom to top from rank values, copies numbered in order.
pub fn deck_from_values(values: &[u8]) -> Deck {
    let mut used = [0u8; 10];
    let cards = values
        .iter()
        .map(|value| {
            let rank = Rank::from_value(*value).expect("rank value");
            let copy = used[rank.index()];
            used[rank.index()] += 1;
            Card::new(rank, copy)
        })
        .collect();
    Deck::from_cards(cards)
}

/// Bot-only game dealt from `deck` with `start` to play.
pub fn dealt_game(players: usize, start: u8, deck: Deck) -> Game {
    let mut rng = StdRng::seed_from_u64(0xdead);
    let mut game = Game::new(&[SeatedUser::new("Host")], players, &mut rng).expect("valid seats");
    game.init_turn(PlayerId(start)).expect("seat exists");
    game.init_round_with_deck(deck).expect("catalog deck");
    game.distribute_initial_cards().expect("fresh round");
    game
}

pub fn ranks(game: &Game, player: u8) -> Vec<Rank> {
    game.player(PlayerId(player))
        .expect("seat exists")
        .hand
        .iter()
        .map(|card| card.rank)
        .collect()
}
