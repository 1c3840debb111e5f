use letter_bot::{
    BotDifficulty, BotFeatures, BotParams, HeuristicPolicy, Policy, PolicyContext, policy_for,
};
use letter_core::game::{Game, GameStatus, HistoryEntry};
use letter_core::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn play_game(seed: u64, seats: Vec<Box<dyn Policy>>, features: BotFeatures) -> Game {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut policies = seats;
    let mut game = Game::new(&[], policies.len(), &mut rng).unwrap();
    let start = game.random_starting_player(&mut rng);
    game.init_turn(start).unwrap();

    for _ in 0..64 {
        game.init_round(&mut rng).unwrap();
        game.distribute_initial_cards().unwrap();
        loop {
            let actor = game.turn().unwrap();
            let ctx = PolicyContext {
                me: actor,
                game: &game,
                features,
            };
            let index = policies[actor.index()].choose_card(&ctx).unwrap();
            game.play_card(actor, index).unwrap();
            assert!(game.is_conserved());

            if let Some((actor, pending)) = game.pending_effect() {
                let pending = pending.clone();
                let ctx = PolicyContext {
                    me: actor,
                    game: &game,
                    features,
                };
                let params = policies[actor.index()].choose_effect(&ctx, &pending).unwrap();
                game.resolve_effect(Some(params)).unwrap();
                assert!(game.is_conserved());
            }
            if game.check_end_of_round(&mut rng).is_end_of_round {
                break;
            }
            game.next_turn().unwrap().expect("a player is left");
        }
        if game.check_end_of_game() {
            return game;
        }
    }
    panic!("seeded game {seed} did not finish");
}

fn heuristic_table(players: usize, seed: u64) -> Vec<Box<dyn Policy>> {
    (0..players)
        .map(|seat| Box::new(HeuristicPolicy::with_seed(seed + seat as u64)) as Box<dyn Policy>)
        .collect()
}

#[test]
fn heuristic_bots_finish_games_without_playing_the_princess() {
    for (seed, players) in [(11, 2), (12, 3), (13, 4), (14, 5), (15, 6)] {
        let game = play_game(seed, heuristic_table(players, seed), BotFeatures::default());
        assert_eq!(game.status(), GameStatus::Finished);
        assert!(game.winner().is_some());
        let princess_played = game.history().entries().iter().any(|entry| {
            matches!(entry, HistoryEntry::CardPlayed { card, .. } if card.rank == Rank::Princess)
        });
        assert!(!princess_played);
    }
}

#[test]
fn mixed_tables_finish_with_features_off() {
    for seed in 0..4 {
        let seats = vec![
            policy_for(BotDifficulty::Normal, BotParams::default(), seed),
            policy_for(BotDifficulty::Easy, BotParams::default(), seed + 100),
            policy_for(BotDifficulty::Normal, BotParams::default(), seed + 200),
        ];
        let game = play_game(seed, seats, BotFeatures::new(false, false));
        assert_eq!(game.status(), GameStatus::Finished);
    }
}

#[test]
fn seeded_bot_games_replay_identically() {
    let a = play_game(77, heuristic_table(4, 77), BotFeatures::default());
    let b = play_game(77, heuristic_table(4, 77), BotFeatures::default());
    assert_eq!(a, b);
}
