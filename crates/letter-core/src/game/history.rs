use crate::game::effect::{EffectKind, EffectResult};
use crate::game::scoring::RoundSummary;
use crate::model::card::Card;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoTargets,
    EmptyDeck,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEntry {
    CardPlayed {
        actor: PlayerId,
        card: Card,
        /// Card left in hand after the play. Known only to the actor.
        kept: Option<Card>,
        /// Countess played because the rules required it. Known only to the
        /// actor, rivals cannot tell a forced discard from a bluff.
        forced: bool,
    },
    EffectResolved {
        actor: PlayerId,
        result: EffectResult,
    },
    EffectSkipped {
        actor: PlayerId,
        effect: EffectKind,
        reason: SkipReason,
    },
    RoundEnded(RoundSummary),
}

impl HistoryEntry {
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            HistoryEntry::CardPlayed { actor, .. }
            | HistoryEntry::EffectResolved { actor, .. }
            | HistoryEntry::EffectSkipped { actor, .. } => Some(*actor),
            HistoryEntry::RoundEnded(_) => None,
        }
    }

    /// Rank discarded by a play. Public.
    pub fn played_rank(&self) -> Option<Rank> {
        match self {
            HistoryEntry::CardPlayed { card, .. } => Some(card.rank),
            _ => None,
        }
    }

    pub fn is_play_by(&self, player: PlayerId, rank: Rank) -> bool {
        self.actor() == Some(player) && self.played_rank() == Some(rank)
    }

    pub fn result(&self) -> Option<&EffectResult> {
        match self {
            HistoryEntry::EffectResolved { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The entry as `viewer` is allowed to see it.
    pub fn visible_to(&self, viewer: PlayerId) -> HistoryEntry {
        match self {
            HistoryEntry::CardPlayed {
                actor,
                card,
                kept,
                forced,
            } => HistoryEntry::CardPlayed {
                actor: *actor,
                card: *card,
                kept: if *actor == viewer { *kept } else { None },
                forced: *forced && *actor == viewer,
            },
            HistoryEntry::EffectResolved { actor, result } => HistoryEntry::EffectResolved {
                actor: *actor,
                result: result.visible_to(*actor, viewer),
            },
            other => other.clone(),
        }
    }
}

/// Append-only event log for a whole game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entries after the most recent round end.
    pub fn current_round(&self) -> &[HistoryEntry] {
        let start = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, HistoryEntry::RoundEnded(_)))
            .map_or(0, |index| index + 1);
        &self.entries[start..]
    }

    /// Current round filtered through [`HistoryEntry::visible_to`].
    pub fn round_view(&self, viewer: PlayerId) -> Vec<HistoryEntry> {
        self.current_round()
            .iter()
            .map(|entry| entry.visible_to(viewer))
            .collect()
    }

    pub fn rounds_completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, HistoryEntry::RoundEnded(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
