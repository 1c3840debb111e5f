use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::tournament::{DecisionSummary, GameOutcome};

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in tournament results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        })
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), AnalyticsError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;

            acc.record_game(seat.won, seat.score, seat.rounds_won, outcome.rounds, &seat.metrics);
        }
        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let baseline = reports
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| (report.wins, report.games))
            .ok_or_else(|| AnalyticsError::MissingBaseline(self.baseline.clone()))?;

        let comparisons = reports
            .iter()
            .map(|report| {
                let p_value = if report.name == self.baseline {
                    1.0
                } else {
                    two_proportion_p_value((report.wins, report.games), baseline)
                };
                ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size: report.games,
                }
            })
            .collect();

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    games: u32,
    wins: u32,
    total_score: u64,
    rounds_won: u64,
    rounds_seen: u64,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            games: 0,
            wins: 0,
            total_score: 0,
            rounds_won: 0,
            rounds_seen: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_game(
        &mut self,
        won: bool,
        score: u32,
        rounds_won: u32,
        rounds: u32,
        metrics: &DecisionSummary,
    ) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
        self.total_score += u64::from(score);
        self.rounds_won += u64::from(rounds_won);
        self.rounds_seen += u64::from(rounds);
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += u64::from(metrics.decisions);
    }

    fn into_report(self) -> AgentReport {
        let games = self.games as usize;
        let win_rate = ratio(self.wins as f64, games as f64);
        let avg_latency = ratio(self.total_latency_ms, self.total_decisions as f64);

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind,
            games,
            wins: self.wins as usize,
            win_rate,
            ci95: win_rate_interval(self.wins as usize, games),
            avg_score: ratio(self.total_score as f64, games as f64),
            round_win_rate: ratio(self.rounds_won as f64, self.rounds_seen as f64),
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0,
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// Two-sided z for the configured confidence level.
fn critical_z() -> f64 {
    standard_normal()
        .map(|normal| normal.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0))
        .unwrap_or(1.96)
}

/// Normal-approximation interval for a win rate, clamped to [0, 1].
fn win_rate_interval(wins: usize, games: usize) -> (f64, f64) {
    if games == 0 {
        return (0.0, 0.0);
    }
    let n = games as f64;
    let p = wins as f64 / n;
    let margin = critical_z() * (p * (1.0 - p) / n).sqrt();
    ((p - margin).max(0.0), (p + margin).min(1.0))
}

/// Pooled two-proportion z-test, two-sided.
fn two_proportion_p_value((wins_a, games_a): (usize, usize), (wins_b, games_b): (usize, usize)) -> f64 {
    if games_a == 0 || games_b == 0 {
        return 1.0;
    }
    let (na, nb) = (games_a as f64, games_b as f64);
    let pooled = (wins_a + wins_b) as f64 / (na + nb);
    let variance = pooled * (1.0 - pooled) * (1.0 / na + 1.0 / nb);
    if variance <= 0.0 {
        return 1.0;
    }
    let z = (wins_a as f64 / na - wins_b as f64 / nb).abs() / variance.sqrt();
    let Some(normal) = standard_normal() else {
        return 1.0;
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_rate = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.win_rate)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.win_rate - baseline_rate;
        }

        self
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Baseline: {} · latency budget: {} ms average per decision\n\n",
            self.baseline, self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Games | Win % | Δ vs baseline | 95% CI | Avg tokens | Round win % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|-------|-------|---------------|--------|------------|-------------|-----------------|-------------|---------|\n");

        for agent in &self.agents {
            let p_value = self
                .comparisons
                .iter()
                .find(|c| c.agent == agent.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);

            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | {delta:+.1} | [{ci_low:.1}%, {ci_high:.1}%] | {score:.2} | {round_win:.1}% | {latency:.3} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = agent.win_rate * 100.0,
                delta = agent.delta_vs_baseline * 100.0,
                ci_low = agent.ci95.0 * 100.0,
                ci_high = agent.ci95.1 * 100.0,
                score = agent.avg_score,
                round_win = agent.round_win_rate * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = p_value,
            ));
        }
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    /// Favor tokens held at game end, averaged.
    pub avg_score: f64,
    pub round_win_rate: f64,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_brackets_the_observed_rate() {
        let (low, high) = win_rate_interval(30, 100);
        assert!(low < 0.3 && 0.3 < high);
        assert!((high - low - 2.0 * 1.96 * (0.21f64 / 100.0).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn interval_is_clamped_to_probabilities() {
        assert_eq!(win_rate_interval(0, 10), (0.0, 0.0));
        assert_eq!(win_rate_interval(10, 10), (1.0, 1.0));
        assert_eq!(win_rate_interval(0, 0), (0.0, 0.0));
    }

    #[test]
    fn identical_records_are_not_significant() {
        assert!((two_proportion_p_value((40, 100), (40, 100)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lopsided_records_are_significant() {
        assert!(two_proportion_p_value((80, 100), (20, 100)) < 0.001);
    }

    #[test]
    fn markdown_lists_every_agent() {
        let report = |name: &str, wins: usize| AgentReport {
            name: name.to_string(),
            kind: AgentKind::Heuristic,
            games: 10,
            wins,
            win_rate: wins as f64 / 10.0,
            ci95: win_rate_interval(wins, 10),
            avg_score: 2.0,
            round_win_rate: 0.4,
            average_ms_per_decision: 0.01,
            delta_vs_baseline: 0.0,
            over_budget: false,
        };
        let summary = AnalyticsSummary {
            baseline: "normal".to_string(),
            agents: vec![report("normal", 6), report("random", 4)],
            comparisons: Vec::new(),
            latency_budget_ms: 50,
        }
        .enrich();

        assert!((summary.agents[1].delta_vs_baseline + 0.2).abs() < 1e-9);
        let markdown = summary.to_markdown();
        assert!(markdown.contains("| normal | Heuristic | 10 | 60.0% |"));
        assert!(markdown.contains("| random | Heuristic | 10 | 40.0% | -20.0 |"));
    }
}
