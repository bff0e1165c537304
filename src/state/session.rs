//! Match controller: sequences the oracle calls around the state machine.

use super::machine::{Exchange, MatchState, TurnOutcome};
use super::AppState;
use crate::error::{ArenaError, ArenaResult};
use crate::judge::Judge;
use crate::opponent::Opponent;
use crate::report::ReportGenerator;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Everything a caller needs to render one completed turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub outcome: TurnOutcome,
    pub record: ScoreRecord,
    pub rebuttal: Option<String>,
    pub state: MatchState,
}

/// Final report lookup result; `report` is None when the generator failed
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub outcome: MatchStatus,
    pub report: Option<Report>,
}

/// Marks a match as busy until dropped
struct TurnGuard {
    in_flight: Arc<Mutex<HashSet<MatchId>>>,
    match_id: MatchId,
}

impl TurnGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<MatchId>>>, match_id: &str) -> ArenaResult<Self> {
        let mut busy = in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !busy.insert(match_id.to_string()) {
            return Err(ArenaError::TurnInProgress(match_id.to_string()));
        }
        Ok(Self {
            in_flight: in_flight.clone(),
            match_id: match_id.to_string(),
        })
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.match_id);
    }
}

impl AppState {
    fn lock_report_gates(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<MatchId, Arc<tokio::sync::Mutex<()>>>> {
        self.report_gates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a match and open it with the opponent's first statement
    pub async fn start_match(&self, mut config: MatchConfig) -> ArenaResult<MatchState> {
        config.topic = config.topic.trim().to_string();
        if config.topic.is_empty() {
            return Err(ArenaError::InvalidInput("topic must not be empty".to_string()));
        }

        let opening = Opponent::new(self.llm.as_deref())
            .opening_or_fallback(&config)
            .await;

        let mut state = MatchState::new(ulid::Ulid::new().to_string(), config);
        state.begin(opening)?;

        tracing::info!(
            match_id = %state.id(),
            topic = %state.config().topic,
            mode = ?state.config().mode,
            "Match started"
        );
        self.matches
            .write()
            .await
            .insert(state.id().to_string(), state.clone());
        Ok(state)
    }

    pub async fn get_match(&self, match_id: &str) -> ArenaResult<MatchState> {
        self.matches
            .read()
            .await
            .get(match_id)
            .cloned()
            .ok_or_else(|| ArenaError::MatchNotFound(match_id.to_string()))
    }

    /// Score one user argument and apply it.
    ///
    /// Oracles run without any lock held; the match is mutated once at the
    /// end, so dropping this future leaves the match untouched.
    pub async fn submit_turn(&self, match_id: &str, argument: &str) -> ArenaResult<TurnResult> {
        let argument = argument.trim();
        if argument.is_empty() {
            return Err(ArenaError::InvalidInput("argument must not be empty".to_string()));
        }

        let _guard = TurnGuard::acquire(&self.in_flight, match_id)?;

        let snapshot = self.get_match(match_id).await?;
        if snapshot.status() != MatchStatus::InProgress {
            return Err(ArenaError::InvalidStateTransition {
                from: snapshot.status(),
                action: "submit a turn",
            });
        }

        let llm = self.llm.as_deref();
        let judge = Judge::new(llm);
        let opponent = Opponent::new(llm);
        let config = snapshot.config();

        let (record, rebuttal) = match config.mode {
            CombatMode::SingleHealth => {
                let record = judge.score_or_neutral(&config.topic, argument, None).await;
                let rebuttal = if snapshot.would_end(&record) {
                    None
                } else {
                    Some(
                        opponent
                            .rebuttal_or_fallback(config, snapshot.history(), argument)
                            .await,
                    )
                };
                (record, rebuttal)
            }
            CombatMode::TwoSided => {
                let rebuttal = opponent
                    .rebuttal_or_fallback(config, snapshot.history(), argument)
                    .await;
                let record = judge
                    .score_or_neutral(&config.topic, argument, Some(&rebuttal))
                    .await;
                (record, Some(rebuttal))
            }
        };

        let mut matches = self.matches.write().await;
        // Reset or removed while the oracles were running
        let state = matches
            .get_mut(match_id)
            .ok_or_else(|| ArenaError::MatchNotFound(match_id.to_string()))?;

        let outcome = state.apply_turn(Exchange::new(argument, rebuttal.clone()), &record)?;
        tracing::info!(
            match_id = %match_id,
            user_damage = outcome.damage.user,
            ai_damage = outcome.damage.ai,
            user_health = outcome.user_health,
            status = ?outcome.status,
            degraded = record.degraded,
            "Turn applied"
        );

        Ok(TurnResult {
            outcome,
            record,
            rebuttal,
            state: state.clone(),
        })
    }

    /// Forfeit the match
    pub async fn quit_match(&self, match_id: &str) -> ArenaResult<MatchState> {
        let mut matches = self.matches.write().await;
        let state = matches
            .get_mut(match_id)
            .ok_or_else(|| ArenaError::MatchNotFound(match_id.to_string()))?;

        state.quit()?;
        tracing::info!(match_id = %match_id, "Match forfeited");
        Ok(state.clone())
    }

    /// Drop a match and everything cached for it
    pub async fn remove_match(&self, match_id: &str) -> ArenaResult<MatchState> {
        let removed = self
            .matches
            .write()
            .await
            .remove(match_id)
            .ok_or_else(|| ArenaError::MatchNotFound(match_id.to_string()))?;
        self.reports.write().await.remove(match_id);
        self.lock_report_gates().remove(match_id);

        tracing::info!(match_id = %match_id, "Match removed");
        Ok(removed)
    }

    /// Replace a match with a fresh one using the same config and a new id
    pub async fn restart_match(&self, match_id: &str) -> ArenaResult<MatchState> {
        let old = self.remove_match(match_id).await?;
        tracing::info!(match_id = %match_id, "Restarting match");
        self.start_match(old.config().clone()).await
    }

    /// Final coaching report for a finished match. A successful report is
    /// cached; a failed one yields `report: None` and may be asked for again.
    pub async fn final_report(&self, match_id: &str) -> ArenaResult<FinalReport> {
        let request = {
            let mut matches = self.matches.write().await;
            let state = matches
                .get_mut(match_id)
                .ok_or_else(|| ArenaError::MatchNotFound(match_id.to_string()))?;
            state.end_match()?
        };

        let gate = self
            .lock_report_gates()
            .entry(match_id.to_string())
            .or_default()
            .clone();
        let _serialized = gate.lock().await;

        if let Some(report) = self.reports.read().await.get(match_id) {
            return Ok(FinalReport {
                outcome: request.outcome,
                report: Some(report.clone()),
            });
        }

        let generated = ReportGenerator::new(self.llm.as_deref())
            .summarize(&request)
            .await;

        // Holding the match map keeps a concurrent removal from leaving a
        // cached report behind
        let matches = self.matches.read().await;
        if !matches.contains_key(match_id) {
            self.lock_report_gates().remove(match_id);
        }

        let report = match generated {
            Ok(report) => {
                if matches.contains_key(match_id) {
                    self.reports
                        .write()
                        .await
                        .insert(match_id.to_string(), report.clone());
                }
                Some(report)
            }
            Err(e) => {
                tracing::warn!(match_id = %match_id, "Report generation failed: {}", e);
                None
            }
        };

        Ok(FinalReport {
            outcome: request.outcome,
            report,
        })
    }
}
