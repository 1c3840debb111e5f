use letter_bot::BotParams;
use letter_core::game::state::{MAX_PLAYERS, MIN_PLAYERS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LATENCY_BUDGET_MS: u64 = 50;

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Reads, parses and validates a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            source,
            path: path.clone(),
        })?;
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                source,
                path: path.clone(),
            })?;
        cfg.validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(cfg)
    }

    /// Checks every block and fills in the seat and rotation counts left
    /// out of the file.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_name("run_id", &self.run_id)?;
        validate_agents(&self.agents)?;
        self.games.normalize(self.agents.len());
        self.games.validate(self.agents.len())?;
        self.outputs.validate(&self.run_id)?;
        self.metrics.validate(&self.agents)
    }

    /// Output paths with `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        self.outputs.resolve(&self.run_id)
    }
}

/// How many games to play and how seats rotate between them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub games: usize,
    /// Table size; defaults to one seat per agent.
    #[serde(default)]
    pub players: Option<usize>,
    /// Seat rotations played per seed; defaults to every rotation.
    #[serde(default)]
    pub rotations: Option<usize>,
}

impl GamesConfig {
    fn normalize(&mut self, agents: usize) {
        let players = *self.players.get_or_insert(agents);
        self.rotations.get_or_insert(players);
    }

    fn validate(&self, agents: usize) -> Result<(), ValidationError> {
        if self.games == 0 {
            return Err(invalid("games.games", "at least one game per rotation"));
        }
        let players = self.player_count();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
            return Err(invalid(
                "games.players",
                format!("table size must be between {MIN_PLAYERS} and {MAX_PLAYERS}"),
            ));
        }
        if players != agents {
            return Err(invalid(
                "games.players",
                format!("{players} seats configured but {agents} agents listed"),
            ));
        }
        let rotations = self.rotation_count();
        if rotations == 0 || rotations > players {
            return Err(invalid(
                "games.rotations",
                format!("rotations must be between 1 and {players}"),
            ));
        }
        Ok(())
    }

    pub fn player_count(&self) -> usize {
        self.players.unwrap_or(0)
    }

    pub fn rotation_count(&self) -> usize {
        self.rotations.unwrap_or(1)
    }
}

/// Definition of a tournament participant.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    /// Heuristic tuning; missing keys keep their defaults.
    #[serde(default)]
    pub params: Option<BotParams>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Heuristic,
    Random,
}

/// Where the per-seat rows and the Markdown summary go. Both may use
/// `{run_id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn resolve(&self, run_id: &str) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: PathBuf::from(self.jsonl.replace("{run_id}", run_id)),
            summary_md: PathBuf::from(self.summary_md.replace("{run_id}", run_id)),
        }
    }

    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let resolved = self.resolve(run_id);
        for (field, path) in [
            ("outputs.jsonl", &resolved.jsonl),
            ("outputs.summary_md", &resolved.summary_md),
        ] {
            if path.file_name().is_none() {
                return Err(invalid(field, "must name a file"));
            }
        }
        if resolved.jsonl == resolved.summary_md {
            return Err(invalid(
                "outputs.summary_md",
                "summary would overwrite the game log",
            ));
        }
        Ok(())
    }
}

/// Baseline for the significance column and the per-decision latency budget.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, agents: &[AgentConfig]) -> Result<(), ValidationError> {
        match &self.baseline {
            None => return Err(invalid("metrics.baseline", "name the agent to compare against")),
            Some(baseline) if !agents.iter().any(|agent| &agent.name == baseline) => {
                return Err(invalid(
                    "metrics.baseline",
                    format!("'{baseline}' is not one of the agents"),
                ));
            }
            Some(_) => {}
        }
        if self.latency_budget_ms == 0 {
            return Err(invalid("metrics.latency_budget_ms", "budget must be positive"));
        }
        Ok(())
    }
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Structured event log, off unless asked for.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default)]
    pub tracing_level: Option<String>,
}

impl LoggingConfig {
    /// Configured level, `None` when unset or unrecognised.
    pub fn level(&self) -> Option<Level> {
        self.tracing_level.as_deref()?.trim().parse().ok()
    }
}

/// Run ids and agent names end up in paths and table rows.
fn check_name(field: &str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid(field, "only letters, digits, '.', '_' and '-' are allowed"));
    }
    Ok(())
}

fn validate_agents(agents: &[AgentConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for agent in agents {
        check_name(&format!("agents[{}].name", agent.name), &agent.name)?;
        if !seen.insert(agent.name.as_str()) {
            return Err(invalid(
                "agents",
                format!("agent '{}' is listed twice", agent.name),
            ));
        }
        match (agent.kind, &agent.params) {
            (AgentKind::Random, Some(_)) => {
                return Err(invalid(
                    &format!("agents[{}].params", agent.name),
                    "random agents take no parameters",
                ));
            }
            (_, Some(params)) if !(0.0..=1.0).contains(&params.countess_bluff_rate) => {
                return Err(invalid(
                    &format!("agents[{}].params.countess_bluff_rate", agent.name),
                    "bluff rate must be a probability",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("{path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}
