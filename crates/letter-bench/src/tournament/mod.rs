mod rotations;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use letter_bot::{BotDifficulty, BotError, BotFeatures, BotParams, Policy, PolicyContext, policy_for};
use letter_core::game::{Game, GameError};
use letter_core::model::player::PlayerId;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};

pub use rotations::SeatRotations;

/// Rounds after which a game is abandoned as stuck.
const MAX_ROUNDS: u32 = 200;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    rotations: SeatRotations,
    logging_enabled: bool,
    bot_features: BotFeatures,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rotations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents);
        let players = config.games.player_count();

        if agents.len() != players {
            return Err(RunnerError::SeatCount {
                expected: players,
                found: agents.len(),
            });
        }

        if config.games.rotation_count() > players {
            return Err(RunnerError::RotationLimit {
                requested: config.games.rotation_count(),
                max: players,
            });
        }

        let rotations = SeatRotations::new(players, config.games.rotation_count());

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            rotations,
            bot_features: BotFeatures::from_env(),
        })
    }

    /// Replace the env-derived bot features, e.g. to compare with deduction off.
    pub fn with_features(mut self, features: BotFeatures) -> Self {
        self.bot_features = features;
        self
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for game_index in 0..self.config.games.games {
            let base_seed = rng.next_u64();

            for (rotation_index, rotation) in self.rotations.as_slice().iter().enumerate() {
                let outcome = self.play_game(game_index, rotation_index, base_seed, rotation)?;
                analytics.record_game(&outcome)?;
                rows_written += write_game_rows(
                    &mut writer,
                    &self.config,
                    game_index,
                    rotation_index,
                    base_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.games.games,
            rotations: self.rotations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn game_id(game_index: usize, rotation_index: usize) -> String {
    format!("G{game_index:05}_R{rotation_index:02}")
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    rotation_index: usize,
    base_seed: u64,
    outcome: &GameOutcome,
) -> Result<usize, RunnerError> {
    let game_id = game_id(game_index, rotation_index);

    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let row = GameLogRow {
            run_id: config.run_id.clone(),
            game_id: game_id.clone(),
            game_index,
            rotation_index,
            game_seed: base_seed,
            seat: seat_result.seat.index(),
            bot: seat_result.agent_name.clone(),
            seating: outcome.seating.clone(),
            rounds: outcome.rounds,
            score: seat_result.score,
            rounds_won: seat_result.rounds_won,
            won: seat_result.won,
            speed_ms_decision: seat_result.metrics.avg_ms_per_decision,
            decisions: seat_result.metrics.decisions,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

impl TournamentRunner {
    /// Plays one game to completion with agents seated per `rotation`,
    /// checking card conservation after every action.
    fn play_game(
        &self,
        game_index: usize,
        rotation_index: usize,
        base_seed: u64,
        rotation: &[usize],
    ) -> Result<GameOutcome, RunnerError> {
        let game_id = game_id(game_index, rotation_index);
        let mut rng = StdRng::seed_from_u64(base_seed);
        let mut seats = build_seat_states(rotation, &self.agents, base_seed)?;
        let mut game = Game::new(&[], seats.len(), &mut rng)?;
        let start = game.random_starting_player(&mut rng);
        game.init_turn(start)?;

        loop {
            if game.round_number() >= MAX_ROUNDS {
                return Err(RunnerError::Stalled {
                    game_id,
                    rounds: game.round_number(),
                });
            }
            game.init_round(&mut rng)?;
            game.distribute_initial_cards()?;

            loop {
                let actor = game.turn().ok_or(GameError::NoTurn)?;
                let seat = &mut seats[actor.index()];
                let ctx = PolicyContext {
                    me: actor,
                    game: &game,
                    features: self.bot_features,
                };
                let started = Instant::now();
                let index = seat.policy.choose_card(&ctx)?;
                let elapsed_ms = seat.metrics.record(started.elapsed());
                let card = game.play_card(actor, index)?;
                self.ensure_conserved(&game, &game_id)?;

                if self.logging_enabled && tracing::enabled!(Level::INFO) {
                    event!(
                        target: "letter_bench::play",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        game_id = %game_id,
                        round = game.round_number(),
                        seat = %actor,
                        bot = %seat.agent_name,
                        card = %card.rank,
                        elapsed_ms
                    );
                }

                if let Some((actor, pending)) = game.pending_effect() {
                    let pending = pending.clone();
                    let seat = &mut seats[actor.index()];
                    let ctx = PolicyContext {
                        me: actor,
                        game: &game,
                        features: self.bot_features,
                    };
                    let started = Instant::now();
                    let params = seat.policy.choose_effect(&ctx, &pending)?;
                    seat.metrics.record(started.elapsed());
                    game.resolve_effect(Some(params))?;
                    self.ensure_conserved(&game, &game_id)?;
                }

                let check = game.check_end_of_round(&mut rng);
                if check.is_end_of_round {
                    if let Some(summary) = check.summary {
                        for winner in summary.winners() {
                            seats[winner.index()].rounds_won += 1;
                        }
                    }
                    break;
                }
                game.next_turn()?.ok_or(GameError::NoTurn)?;
            }

            if game.check_end_of_game() {
                break;
            }
        }

        let winner = game.winner();
        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "letter_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_id = %game_id,
                rounds = game.round_number(),
                winner = ?winner,
            );
        }

        let seating = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat.seat.index(),
                bot: seat.agent_name.clone(),
            })
            .collect();

        let mut seat_results = Vec::with_capacity(seats.len());
        for seat in seats {
            let score = game.player(seat.seat)?.score;
            seat_results.push(SeatResult {
                agent_name: seat.agent_name,
                seat: seat.seat,
                score,
                rounds_won: seat.rounds_won,
                won: winner == Some(seat.seat),
                metrics: seat.metrics.finalize(),
            });
        }

        Ok(GameOutcome {
            seating,
            seat_results,
            rounds: game.round_number(),
        })
    }

    fn ensure_conserved(&self, game: &Game, game_id: &str) -> Result<(), RunnerError> {
        if game.is_conserved() {
            return Ok(());
        }
        Err(RunnerError::Conservation {
            game_id: game_id.to_string(),
            round: game.round_number(),
            cards: game.card_total(),
        })
    }
}

fn build_seat_states(
    rotation: &[usize],
    agents: &[AgentBlueprint],
    base_seed: u64,
) -> Result<Vec<SeatState>, RunnerError> {
    let mut seats = Vec::with_capacity(rotation.len());
    for (seat_idx, agent_idx) in rotation.iter().enumerate() {
        let agent = agents.get(*agent_idx).ok_or(RunnerError::InvalidRotation {
            index: seat_idx,
            agent_index: *agent_idx,
        })?;
        // Policy seeds follow the agent, not the seat it lands on.
        let seed = base_seed.wrapping_add(*agent_idx as u64 + 1);
        seats.push(SeatState::new(PlayerId::from_index(seat_idx), agent, seed));
    }
    Ok(seats)
}

struct SeatState {
    seat: PlayerId,
    agent_name: String,
    policy: Box<dyn Policy>,
    rounds_won: u32,
    metrics: DecisionMetrics,
}

impl SeatState {
    fn new(seat: PlayerId, agent: &AgentBlueprint, seed: u64) -> Self {
        Self {
            seat,
            agent_name: agent.name.clone(),
            policy: agent.spawn_policy(seed),
            rounds_won: 0,
            metrics: DecisionMetrics::default(),
        }
    }
}

pub struct GameOutcome {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    pub rounds: u32,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: usize,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: PlayerId,
    pub score: u32,
    pub rounds_won: u32,
    pub won: bool,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    rotation_index: usize,
    game_seed: u64,
    seat: usize,
    bot: String,
    seating: Vec<SeatSnapshot>,
    rounds: u32,
    score: u32,
    rounds_won: u32,
    won: bool,
    speed_ms_decision: f64,
    decisions: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {0}")]
    Game(#[from] GameError),
    #[error("bot decision failed: {0}")]
    Bot(#[from] BotError),
    #[error("card count drifted to {cards} in {game_id} round {round}")]
    Conservation {
        game_id: String,
        round: u32,
        cards: usize,
    },
    #[error("{game_id} still undecided after {rounds} rounds")]
    Stalled { game_id: String, rounds: u32 },
    #[error("configuration requires {expected} agents but found {found}")]
    SeatCount { expected: usize, found: usize },
    #[error("requested {requested} seat rotations exceeds maximum of {max}")]
    RotationLimit { requested: usize, max: usize },
    #[error("rotation seat {index} references invalid agent index {agent_index}")]
    InvalidRotation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Heuristic(BotParams),
    Random,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Vec<Self> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Self {
        let implementation = match config.kind {
            AgentKind::Heuristic => {
                AgentImplementation::Heuristic(config.params.clone().unwrap_or_default())
            }
            AgentKind::Random => AgentImplementation::Random,
        };

        Self {
            name: config.name.clone(),
            implementation,
        }
    }

    fn spawn_policy(&self, seed: u64) -> Box<dyn Policy> {
        match &self.implementation {
            AgentImplementation::Heuristic(params) => {
                policy_for(BotDifficulty::Normal, params.clone(), seed)
            }
            AgentImplementation::Random => {
                policy_for(BotDifficulty::Easy, BotParams::default(), seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GamesConfig, LoggingConfig, MetricsConfig, OutputsConfig};

    fn config(kinds: &[AgentKind], games: usize) -> BenchmarkConfig {
        let agents = kinds
            .iter()
            .enumerate()
            .map(|(idx, kind)| AgentConfig {
                name: format!("agent{idx}"),
                kind: *kind,
                params: None,
            })
            .collect();
        let mut cfg = BenchmarkConfig {
            run_id: "unit".to_string(),
            games: GamesConfig {
                seed: Some(9),
                games,
                players: None,
                rotations: None,
            },
            agents,
            outputs: OutputsConfig {
                jsonl: "unused.jsonl".to_string(),
                summary_md: "unused.md".to_string(),
            },
            metrics: MetricsConfig {
                baseline: Some("agent0".to_string()),
                ..MetricsConfig::default()
            },
            logging: LoggingConfig::default(),
        };
        cfg.validate().expect("valid config");
        cfg
    }

    fn runner(kinds: &[AgentKind]) -> TournamentRunner {
        let cfg = config(kinds, 1);
        let outputs = cfg.resolved_outputs();
        TournamentRunner::new(cfg, outputs)
            .expect("runner")
            .with_features(BotFeatures::default())
    }

    #[test]
    fn game_ends_with_one_winner_at_the_target_score() {
        let runner = runner(&[AgentKind::Heuristic, AgentKind::Random, AgentKind::Heuristic]);
        let rotation = runner.rotations.as_slice()[0].clone();
        let outcome = runner.play_game(0, 0, 42, &rotation).expect("game completes");

        let winners: Vec<&SeatResult> = outcome.seat_results.iter().filter(|s| s.won).collect();
        assert_eq!(winners.len(), 1);
        assert!(winners[0].score >= letter_core::game::points_to_win(3));
        assert!(outcome.rounds >= 1);
        let rounds_won: u32 = outcome.seat_results.iter().map(|s| s.rounds_won).sum();
        assert!(rounds_won >= outcome.rounds);
    }

    #[test]
    fn rotation_moves_agents_between_seats() {
        let runner = runner(&[AgentKind::Heuristic, AgentKind::Random]);
        let rotation = runner.rotations.as_slice()[1].clone();
        let outcome = runner.play_game(0, 1, 7, &rotation).expect("game completes");
        assert_eq!(outcome.seating[0].bot, "agent1");
        assert_eq!(outcome.seating[1].bot, "agent0");
    }

    #[test]
    fn same_seed_replays_the_same_scores() {
        let runner = runner(&[AgentKind::Heuristic, AgentKind::Heuristic, AgentKind::Random]);
        let rotation = runner.rotations.as_slice()[2].clone();
        let scores = |outcome: GameOutcome| -> Vec<(u32, u32)> {
            outcome
                .seat_results
                .iter()
                .map(|s| (s.score, s.rounds_won))
                .collect()
        };
        let a = runner.play_game(3, 2, 1234, &rotation).expect("first run");
        let b = runner.play_game(3, 2, 1234, &rotation).expect("second run");
        assert_eq!(scores(a), scores(b));
    }

    #[test]
    fn heuristic_params_default_when_omitted() {
        let cfg = AgentConfig {
            name: "bot".to_string(),
            kind: AgentKind::Heuristic,
            params: None,
        };
        let blueprint = AgentBlueprint::from_config(&cfg);
        assert!(matches!(
            blueprint.implementation,
            AgentImplementation::Heuristic(ref params) if *params == BotParams::default()
        ));
    }
}
