//! Match state machine.
//!
//! `NotStarted -> InProgress -> {UserVictory | AiVictory | Draw}`. Only
//! `InProgress` accepts turns, and a terminal match never comes back; a
//! restart builds a fresh `MatchState`.

use super::damage::{self, TurnDamage};
use crate::error::{ArenaError, ArenaResult};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// The user's argument and the opponent's reply that went with it
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub argument: String,
    pub rebuttal: Option<String>,
}

impl Exchange {
    pub fn new(argument: impl Into<String>, rebuttal: Option<String>) -> Self {
        Self {
            argument: argument.into(),
            rebuttal,
        }
    }
}

/// Result of applying one scored turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnOutcome {
    pub damage: TurnDamage,
    pub user_health: u8,
    pub ai_health: Option<u8>,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchState {
    id: MatchId,
    config: MatchConfig,
    status: MatchStatus,
    user_health: u8,
    ai_health: Option<u8>,
    history: Vec<TurnEntry>,
    turns_played: u32,
    ended_by: Option<EndReason>,
    last_score: Option<ScoreRecord>,
    frozen: bool,
    created_at: String,
}

fn drain(health: u8, damage: u32) -> u8 {
    let remaining = u32::from(health).saturating_sub(damage);
    remaining.min(u32::from(MAX_HEALTH)) as u8
}

impl MatchState {
    pub fn new(id: MatchId, config: MatchConfig) -> Self {
        let ai_health = (config.mode == CombatMode::TwoSided).then_some(MAX_HEALTH);
        Self {
            id,
            config,
            status: MatchStatus::NotStarted,
            user_health: MAX_HEALTH,
            ai_health,
            history: Vec::new(),
            turns_played: 0,
            ended_by: None,
            last_score: None,
            frozen: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn user_health(&self) -> u8 {
        self.user_health
    }

    pub fn ai_health(&self) -> Option<u8> {
        self.ai_health
    }

    pub fn history(&self) -> &[TurnEntry] {
        &self.history
    }

    pub fn turns_played(&self) -> u32 {
        self.turns_played
    }

    pub fn ended_by(&self) -> Option<EndReason> {
        self.ended_by
    }

    pub fn last_score(&self) -> Option<&ScoreRecord> {
        self.last_score.as_ref()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Check if a status transition is valid
    fn is_valid_transition(from: MatchStatus, to: MatchStatus) -> bool {
        use MatchStatus::*;

        match (from, to) {
            (NotStarted, InProgress) => true,
            // Quitting before the opening arrives is still a forfeit
            (NotStarted, AiVictory) => true,
            (InProgress, UserVictory | AiVictory | Draw) => true,
            _ => false,
        }
    }

    fn transition(&mut self, to: MatchStatus, action: &'static str) -> ArenaResult<()> {
        if !Self::is_valid_transition(self.status, to) {
            return Err(ArenaError::InvalidStateTransition {
                from: self.status,
                action,
            });
        }
        tracing::debug!(match_id = %self.id, from = ?self.status, ?to, "Match status change");
        self.status = to;
        Ok(())
    }

    /// Start the match with the opponent's opening statement
    pub fn begin(&mut self, opening: impl Into<String>) -> ArenaResult<()> {
        self.transition(MatchStatus::InProgress, "begin the match")?;
        let opening = opening.into();
        if !opening.trim().is_empty() {
            self.history.push(TurnEntry::now(Speaker::Opponent, opening));
        }
        Ok(())
    }

    /// Apply one scored turn. Rejected without side effects unless the match
    /// is in progress.
    pub fn apply_turn(
        &mut self,
        exchange: Exchange,
        record: &ScoreRecord,
    ) -> ArenaResult<TurnOutcome> {
        if self.status != MatchStatus::InProgress {
            return Err(ArenaError::InvalidStateTransition {
                from: self.status,
                action: "apply a turn",
            });
        }

        let damage = damage::assess(self.config.mode, record);
        self.user_health = drain(self.user_health, damage.user);
        self.ai_health = self.ai_health.map(|health| drain(health, damage.ai));

        self.history
            .push(TurnEntry::now(Speaker::User, exchange.argument));
        if let Some(rebuttal) = exchange.rebuttal {
            self.history.push(TurnEntry::now(Speaker::Opponent, rebuttal));
        }
        self.turns_played += 1;
        self.last_score = Some(record.clone());

        if let Some(outcome) = self.knockout_status() {
            self.transition(outcome, "finish the match")?;
            self.ended_by = Some(EndReason::Knockout);
        }

        Ok(TurnOutcome {
            damage,
            user_health: self.user_health,
            ai_health: self.ai_health,
            status: self.status,
        })
    }

    /// Whether applying this record would end the match
    pub fn would_end(&self, record: &ScoreRecord) -> bool {
        if self.status != MatchStatus::InProgress {
            return false;
        }
        let damage = damage::assess(self.config.mode, record);
        drain(self.user_health, damage.user) == 0
            || self
                .ai_health
                .is_some_and(|health| drain(health, damage.ai) == 0)
    }

    fn knockout_status(&self) -> Option<MatchStatus> {
        let user_down = self.user_health == 0;
        let ai_down = self.ai_health == Some(0);

        match (user_down, ai_down) {
            (true, true) => Some(MatchStatus::Draw),
            (true, false) => Some(MatchStatus::AiVictory),
            (false, true) => Some(MatchStatus::UserVictory),
            (false, false) => None,
        }
    }

    /// Forfeit: the opponent wins regardless of health
    pub fn quit(&mut self) -> ArenaResult<()> {
        self.transition(MatchStatus::AiVictory, "quit the match")?;
        self.ended_by = Some(EndReason::Forfeit);
        Ok(())
    }

    /// Freeze the transcript and build the request for the report generator
    pub fn end_match(&mut self) -> ArenaResult<ReportRequest> {
        if !self.status.is_terminal() {
            return Err(ArenaError::InvalidStateTransition {
                from: self.status,
                action: "end the match",
            });
        }
        self.frozen = true;

        Ok(ReportRequest {
            match_id: self.id.clone(),
            topic: self.config.topic.clone(),
            history: self.history.clone(),
            outcome: self.status,
        })
    }
}
