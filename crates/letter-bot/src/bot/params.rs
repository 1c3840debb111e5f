use letter_core::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Tunables for the heuristic bot.
///
/// `play_priority` is indexed by rank value. When no other heuristic fires the
/// bot plays the card with the strictly higher priority, otherwise the second
/// card. Spy and Handmaid sit at the top, the Princess is never played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotParams {
    pub play_priority: [u8; 10],
    pub countess_bluff_rate: f64,
    /// Highest rank a Chancellor keeps early in the round.
    pub chancellor_safe_max: Rank,
    /// Probability above which a Prince is aimed at a suspected Princess.
    pub prince_princess_threshold: f64,
}

impl BotParams {
    pub fn priority(&self, rank: Rank) -> u8 {
        self.play_priority[rank.index()]
    }
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            play_priority: [5, 4, 3, 2, 5, 2, 3, 1, 1, 0],
            countess_bluff_rate: 0.2,
            chancellor_safe_max: Rank::Chancellor,
            prince_princess_threshold: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn princess_has_the_lowest_priority() {
        let params = BotParams::default();
        for rank in Rank::ORDERED {
            if rank != Rank::Princess {
                assert!(params.priority(rank) > params.priority(Rank::Princess));
            }
        }
        assert_eq!(params.priority(Rank::Spy), params.priority(Rank::Handmaid));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: BotParams = serde_json::from_str(r#"{"countess_bluff_rate":0.0}"#).unwrap();
        assert_eq!(params.countess_bluff_rate, 0.0);
        assert_eq!(params.play_priority, BotParams::default().play_priority);
    }
}
