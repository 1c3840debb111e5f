use crate::game::effect::PendingEffect;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat index into `Game::players`; turn order follows the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        PlayerId(index as u8)
    }

    /// Next seat clockwise among `count` seats.
    pub fn next(self, count: usize) -> PlayerId {
        PlayerId::from_index((self.index() + 1) % count.max(1))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub hand: Hand,
    pub eliminated: bool,
    pub protected: bool,
    pub must_play_countess: bool,
    pub score: u32,
    pub discards: Vec<Card>,
    pub pending_effect: Option<PendingEffect>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, is_bot: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_bot,
            hand: Hand::new(),
            eliminated: false,
            protected: false,
            must_play_countess: false,
            score: 0,
            discards: Vec::new(),
            pending_effect: None,
        }
    }

    pub fn reset_for_round(&mut self) {
        self.hand = Hand::new();
        self.discards.clear();
        self.eliminated = false;
        self.protected = false;
        self.must_play_countess = false;
        self.pending_effect = None;
    }

    /// Not eliminated and not protected.
    pub fn is_targetable(&self) -> bool {
        !self.eliminated && !self.protected
    }

    pub fn has_discarded(&self, rank: Rank) -> bool {
        self.discards.iter().any(|card| card.rank == rank)
    }

    /// Eliminates the player, moving any held cards onto the discard pile.
    pub(crate) fn eliminate(&mut self) {
        self.eliminated = true;
        self.protected = false;
        self.must_play_countess = false;
        self.pending_effect = None;
        let held = self.hand.take_all();
        self.discards.extend(held);
    }

    pub(crate) fn refresh_forced_play(&mut self) {
        self.must_play_countess = self.hand.forces_countess();
    }
}
