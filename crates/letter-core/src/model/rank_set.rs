use crate::model::card::Card;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Bit set over the ten ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RankSet(u16);

impl RankSet {
    pub const EMPTY: RankSet = RankSet(0);
    pub const ALL: RankSet = RankSet(0b11_1111_1111);

    pub const fn single(rank: Rank) -> Self {
        RankSet(1 << rank.value())
    }

    pub fn from_ranks<I: IntoIterator<Item = Rank>>(ranks: I) -> Self {
        ranks.into_iter().fold(Self::EMPTY, |set, rank| set.with(rank))
    }

    pub const fn with(self, rank: Rank) -> Self {
        RankSet(self.0 | (1 << rank.value()))
    }

    pub const fn without(self, rank: Rank) -> Self {
        RankSet(self.0 & !(1 << rank.value()))
    }

    pub const fn contains(self, rank: Rank) -> bool {
        self.0 & (1 << rank.value()) != 0
    }

    pub const fn intersect(self, other: RankSet) -> Self {
        RankSet(self.0 & other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Rank> {
        Rank::ORDERED.into_iter().filter(move |rank| self.contains(*rank))
    }

    pub fn max(self) -> Option<Rank> {
        self.iter().last()
    }

    pub fn min(self) -> Option<Rank> {
        self.iter().next()
    }

    /// The single member when the set is a singleton.
    pub fn only(self) -> Option<Rank> {
        if self.len() == 1 { self.min() } else { None }
    }
}

/// Multiset of ranks, typically the unseen cards from one observer's seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankCounts {
    counts: [u8; 10],
}

impl RankCounts {
    pub const fn empty() -> Self {
        Self { counts: [0; 10] }
    }

    pub fn catalog() -> Self {
        let mut counts = [0u8; 10];
        for rank in Rank::ORDERED {
            counts[rank.index()] = rank.quantity();
        }
        Self { counts }
    }

    pub fn from_cards<'a, I: IntoIterator<Item = &'a Card>>(cards: I) -> Self {
        let mut counts = Self::empty();
        for card in cards {
            counts.add(card.rank);
        }
        counts
    }

    pub fn add(&mut self, rank: Rank) {
        self.counts[rank.index()] = self.counts[rank.index()].saturating_add(1);
    }

    pub fn remove(&mut self, rank: Rank) -> bool {
        let slot = &mut self.counts[rank.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn count(&self, rank: Rank) -> u8 {
        self.counts[rank.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Ranks with at least one copy.
    pub fn support(&self) -> RankSet {
        RankSet::from_ranks(Rank::ORDERED.into_iter().filter(|rank| self.count(*rank) > 0))
    }

    pub fn filter(&self, keep: RankSet) -> Self {
        let mut filtered = *self;
        for rank in Rank::ORDERED {
            if !keep.contains(rank) {
                filtered.counts[rank.index()] = 0;
            }
        }
        filtered
    }

    pub fn probability(&self, rank: Rank) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(rank) as f64 / total as f64
    }

    /// Share of the multiset strictly above `rank`.
    pub fn probability_above(&self, rank: Rank) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let above: usize = Rank::ORDERED
            .into_iter()
            .filter(|candidate| *candidate > rank)
            .map(|candidate| self.count(candidate) as usize)
            .sum();
        above as f64 / total as f64
    }

    /// Ranks sharing the highest count, with that count.
    pub fn most_frequent(&self) -> (RankSet, u8) {
        let best = self.counts.iter().copied().max().unwrap_or(0);
        if best == 0 {
            return (RankSet::EMPTY, 0);
        }
        let ranks = Rank::ORDERED
            .into_iter()
            .filter(|rank| self.count(*rank) == best);
        (RankSet::from_ranks(ranks), best)
    }

    /// Average rank value weighted by copies.
    pub fn expected_value(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = Rank::ORDERED
            .into_iter()
            .map(|rank| rank.value() as usize * self.count(rank) as usize)
            .sum();
        weighted as f64 / total as f64
    }
}
