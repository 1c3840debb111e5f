mod card;
mod deduction;
mod effect;
mod params;

pub use card::{CardDecision, CardPlanner};
pub use deduction::{
    Clue, ClueKind, Exposure, OpponentProfile, collect_clues, exposed_card, infer_opponent_ranks,
};
pub use effect::EffectPlanner;
pub use params::BotParams;

use crate::error::BotError;
use letter_core::game::{Game, HistoryEntry};
use letter_core::model::hand::Hand;
use letter_core::model::player::{Player, PlayerId};
use letter_core::model::rank::Rank;
use letter_core::model::rank_set::RankCounts;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotDifficulty {
    /// Uniformly random legal moves.
    Easy,
    #[default]
    Normal,
}

impl BotDifficulty {
    pub fn from_env() -> Self {
        static CACHED: OnceLock<BotDifficulty> = OnceLock::new();
        *CACHED.get_or_init(|| match std::env::var("LL_BOT_DIFFICULTY") {
            Ok(raw) => Self::parse(&raw).unwrap_or_default(),
            Err(_) => BotDifficulty::default(),
        })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "random" => Some(BotDifficulty::Easy),
            "normal" | "default" | "heuristic" => Some(BotDifficulty::Normal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotFeatures {
    deduction: bool,
    bluff: bool,
}

impl BotFeatures {
    pub const fn new(deduction: bool, bluff: bool) -> Self {
        Self { deduction, bluff }
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub const fn deduction_enabled(self) -> bool {
        self.deduction
    }

    pub const fn bluff_enabled(self) -> bool {
        self.bluff
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let deduction = read("LL_ENABLE_DEDUCTION")
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(defaults.deduction);
        let bluff = read("LL_ENABLE_BLUFF")
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(defaults.bluff);
        Self { deduction, bluff }
    }
}

impl Default for BotFeatures {
    fn default() -> Self {
        Self {
            deduction: true,
            bluff: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "on" | "ON" => Some(true),
        "0" | "false" | "FALSE" | "off" | "OFF" => Some(false),
        _ => None,
    }
}

/// How far the current round has run, from deck size against active players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStage {
    Early,
    Mid,
    Late,
}

impl RoundStage {
    pub fn of(game: &Game) -> Self {
        let deck = game.deck().len();
        let active = game.active_count();
        let total = game.player_count();
        if deck > 2 * active && active * 4 >= total * 3 {
            return RoundStage::Early;
        }
        if deck <= active || active <= 3 {
            return RoundStage::Late;
        }
        RoundStage::Mid
    }
}

/// How close the strongest rival is to winning the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStatus {
    Early,
    Mid,
    Late,
    Critical,
}

impl ScoreStatus {
    /// Rival scores count a pending Spy token when exactly one rival has
    /// discarded a Spy this round.
    pub fn of(game: &Game, me: PlayerId) -> Self {
        let rivals: Vec<&Player> = game
            .active_players()
            .filter(|player| player.id != me)
            .collect();
        let needed = game.points_to_win();
        let deck = game.deck().len();
        let highest = rivals.iter().map(|player| player.score).max().unwrap_or(0);
        if highest == 0 {
            return ScoreStatus::Early;
        }
        if highest + 2 < needed {
            return ScoreStatus::Mid;
        }

        let spies = rivals
            .iter()
            .filter(|player| player.has_discarded(Rank::Spy))
            .count();
        let adjusted = rivals
            .iter()
            .map(|player| {
                let bonus = u32::from(spies == 1 && player.has_discarded(Rank::Spy));
                player.score + bonus
            })
            .max()
            .unwrap_or(0);

        if adjusted + 1 == needed {
            return ScoreStatus::Critical;
        }
        if rivals.len() <= 3 && deck < 2 * rivals.len() {
            return ScoreStatus::Critical;
        }
        if deck >= 2 * rivals.len() {
            return ScoreStatus::Late;
        }
        ScoreStatus::Mid
    }
}

/// Everything a planner may look at for one decision.
///
/// The history is the viewer-filtered current round, so planners never see
/// private fields of effects they did not take part in.
#[derive(Debug, Clone)]
pub struct BotContext<'a> {
    pub me: PlayerId,
    pub game: &'a Game,
    pub player: &'a Player,
    pub params: &'a BotParams,
    pub features: BotFeatures,
    pub difficulty: BotDifficulty,
    view: Vec<HistoryEntry>,
}

impl<'a> BotContext<'a> {
    pub fn new(
        me: PlayerId,
        game: &'a Game,
        params: &'a BotParams,
        features: BotFeatures,
        difficulty: BotDifficulty,
    ) -> Result<Self, BotError> {
        let player = game.player(me)?;
        Ok(Self {
            me,
            game,
            player,
            params,
            features,
            difficulty,
            view: game.history().round_view(me),
        })
    }

    pub fn hand(&self) -> &'a Hand {
        &self.player.hand
    }

    pub fn view(&self) -> &[HistoryEntry] {
        &self.view
    }

    pub fn round_stage(&self) -> RoundStage {
        RoundStage::of(self.game)
    }

    pub fn score_status(&self) -> ScoreStatus {
        ScoreStatus::of(self.game, self.me)
    }

    /// Cards this bot cannot account for.
    pub fn remaining(&self) -> RankCounts {
        self.game.remaining_cards(self.me)
    }

    pub fn opponents(&self) -> impl Iterator<Item = &'a Player> + '_ {
        let me = self.me;
        self.game
            .active_players()
            .filter(move |player| player.id != me)
    }

    /// Opponents an effect could currently name.
    pub fn targetable_opponents(&self) -> impl Iterator<Item = &'a Player> + '_ {
        self.opponents().filter(|player| player.is_targetable())
    }

    /// True when some unaccounted card outranks `rank`.
    pub fn better_card_outstanding(&self, rank: Rank) -> bool {
        self.remaining().probability_above(rank) > 0.0
    }
}

/// Uniform pick among `options`, `None` when empty.
pub(crate) fn pick<T: Copy, R: Rng + ?Sized>(options: &[T], rng: &mut R) -> Option<T> {
    options.choose(rng).copied()
}

#[cfg(test)]
pub(crate) mod testing {
    use letter_core::game::{Game, GameSnapshot, SeatedUser};
    use letter_core::model::deck::Deck;
    use letter_core::model::player::PlayerId;
    use letter_core::model::rank::Rank;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Deck whose first draws are `draws`, the rest of the catalog below.
    pub fn stacked_deck(draws: &[Rank]) -> Deck {
        let mut rest = Deck::standard().cards().to_vec();
        let mut top = Vec::with_capacity(draws.len());
        for rank in draws {
            let position = rest
                .iter()
                .position(|card| card.rank == *rank)
                .expect("rank available in catalog");
            top.push(rest.remove(position));
        }
        top.reverse();
        rest.extend(top);
        Deck::from_cards(rest)
    }

    /// Dealt game with P0 to act, first draws taken from `draws`.
    pub fn dealt(players: usize, draws: &[Rank]) -> Game {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = Game::new(&[SeatedUser::new("Host")], players, &mut rng).unwrap();
        game.init_turn(PlayerId(0)).unwrap();
        game.init_round_with_deck(stacked_deck(draws)).unwrap();
        game.distribute_initial_cards().unwrap();
        game
    }

    /// Moves the top `count` deck cards onto `player`'s discard pile.
    pub fn burn(game: &Game, player: PlayerId, count: usize) -> Game {
        let mut snapshot = GameSnapshot::capture(game);
        for _ in 0..count {
            let card = snapshot.deck.pop().expect("deck has cards to burn");
            snapshot.players[player.index()].discards.push(card);
        }
        snapshot.restore().unwrap()
    }

    pub fn with_scores(game: &Game, scores: &[u32]) -> Game {
        let mut snapshot = GameSnapshot::capture(game);
        for (player, score) in snapshot.players.iter_mut().zip(scores) {
            player.score = *score;
        }
        snapshot.restore().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{burn, dealt, with_scores};
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn bot_features_default_fallbacks() {
        let features = BotFeatures::from_reader(|_| None);
        assert!(features.deduction_enabled());
        assert!(features.bluff_enabled());
    }

    #[test]
    fn bot_features_respect_flags() {
        let mut vars = HashMap::new();
        vars.insert("LL_ENABLE_DEDUCTION".to_string(), "off".to_string());
        vars.insert("LL_ENABLE_BLUFF".to_string(), "0".to_string());
        let features = BotFeatures::from_reader(|key| vars.get(key).cloned());
        assert!(!features.deduction_enabled());
        assert!(!features.bluff_enabled());
    }

    #[test]
    fn unknown_flag_values_keep_defaults() {
        let features = BotFeatures::from_reader(|_| Some("maybe".to_string()));
        assert_eq!(features, BotFeatures::default());
    }

    #[test]
    fn difficulty_parses_aliases() {
        assert_eq!(BotDifficulty::parse(" Easy "), Some(BotDifficulty::Easy));
        assert_eq!(BotDifficulty::parse("default"), Some(BotDifficulty::Normal));
        assert_eq!(BotDifficulty::parse("hard"), None);
    }

    #[test]
    fn fresh_four_player_round_is_early() {
        let game = dealt(4, &[]);
        assert_eq!(game.deck().len(), 15);
        assert_eq!(RoundStage::of(&game), RoundStage::Early);
    }

    #[test]
    fn two_player_round_goes_late_once_early_ends() {
        let game = dealt(2, &[]);
        assert_eq!(RoundStage::of(&game), RoundStage::Early);
        let game = burn(&game, PlayerId(1), game.deck().len() - 4);
        assert_eq!(RoundStage::of(&game), RoundStage::Late);
    }

    #[test]
    fn five_player_round_passes_through_mid() {
        let game = dealt(5, &[]);
        let game = burn(&game, PlayerId(4), game.deck().len() - 8);
        assert_eq!(RoundStage::of(&game), RoundStage::Mid);
        let game = burn(&game, PlayerId(4), 3);
        assert_eq!(RoundStage::of(&game), RoundStage::Late);
    }

    #[test]
    fn score_status_tracks_the_leading_rival() {
        let game = dealt(3, &[]);
        assert_eq!(ScoreStatus::of(&game, PlayerId(0)), ScoreStatus::Early);
        let game = with_scores(&game, &[0, 1, 0]);
        assert_eq!(ScoreStatus::of(&game, PlayerId(0)), ScoreStatus::Mid);
        let game = with_scores(&game, &[0, 4, 0]);
        assert_eq!(ScoreStatus::of(&game, PlayerId(0)), ScoreStatus::Critical);
        let game = with_scores(&game, &[0, 3, 0]);
        assert_eq!(ScoreStatus::of(&game, PlayerId(0)), ScoreStatus::Late);
        // My own score never raises the alarm.
        let game = with_scores(&game, &[4, 0, 0]);
        assert_eq!(ScoreStatus::of(&game, PlayerId(0)), ScoreStatus::Early);
    }

    #[test]
    fn context_view_is_filtered_for_the_bot() {
        let game = dealt(2, &[]);
        let params = BotParams::default();
        let ctx = BotContext::new(
            PlayerId(1),
            &game,
            &params,
            BotFeatures::default(),
            BotDifficulty::Normal,
        )
        .unwrap();
        assert_eq!(ctx.hand().len(), 1);
        assert_eq!(ctx.opponents().count(), 1);
        assert!(ctx.view().is_empty());
    }
}
