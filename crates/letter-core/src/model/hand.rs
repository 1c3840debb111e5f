use crate::model::card::Card;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use std::vec::Vec;

/// Cards held by one player. Order is positional and never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Card> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    pub fn take_all(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }

    pub fn replace(&mut self, cards: Vec<Card>) -> Vec<Card> {
        std::mem::replace(&mut self.cards, cards)
    }

    pub fn get(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    pub fn first(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    pub fn contains_rank(&self, rank: Rank) -> bool {
        self.cards.iter().any(|card| card.rank == rank)
    }

    pub fn position_of(&self, rank: Rank) -> Option<usize> {
        self.cards.iter().position(|card| card.rank == rank)
    }

    /// Countess held together with Prince or King.
    pub fn forces_countess(&self) -> bool {
        self.contains_rank(Rank::Countess)
            && (self.contains_rank(Rank::Prince) || self.contains_rank(Rank::King))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
