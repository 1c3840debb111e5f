use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A physical card. `(rank, copy)` is unique across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub copy: u8,
}

impl Card {
    pub const fn new(rank: Rank, copy: u8) -> Self {
        Self { rank, copy }
    }

    pub fn id(self) -> String {
        format!("card-{}-{}", self.rank.value(), self.copy)
    }

    pub const fn name(self) -> &'static str {
        self.rank.name()
    }

    pub const fn value(self) -> u8 {
        self.rank.value()
    }

    pub const fn is_princess(self) -> bool {
        matches!(self.rank, Rank::Princess)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.rank, self.copy)
    }
}
