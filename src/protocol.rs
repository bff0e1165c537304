//! JSON bodies exchanged over the HTTP API.

use crate::prompts::{DIFFICULTIES, PERSONAS};
use crate::state::{DamageHit, FinalReport, MatchState, TurnResult};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMatchRequest {
    pub topic: String,
    pub persona: String,
    pub difficulty: String,
    #[serde(default)]
    pub stance: Stance,
    #[serde(default)]
    pub mode: CombatMode,
}

impl From<StartMatchRequest> for MatchConfig {
    fn from(req: StartMatchRequest) -> Self {
        MatchConfig {
            topic: req.topic,
            persona: req.persona,
            difficulty: req.difficulty,
            stance: req.stance,
            mode: req.mode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTurnRequest {
    pub argument: String,
}

/// Public view of one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    pub id: MatchId,
    pub config: MatchConfig,
    pub status: MatchStatus,
    /// True only while the match is in progress
    pub accepts_turns: bool,
    pub user_health: u8,
    /// Present in two-sided mode only
    pub ai_health: Option<u8>,
    pub history: Vec<TurnEntry>,
    pub turns_played: u32,
    pub ended_by: Option<EndReason>,
    pub last_score: Option<ScoreRecord>,
    pub created_at: String,
}

impl From<&MatchState> for MatchView {
    fn from(state: &MatchState) -> Self {
        MatchView {
            id: state.id().to_string(),
            config: state.config().clone(),
            status: state.status(),
            accepts_turns: state.status() == MatchStatus::InProgress,
            user_health: state.user_health(),
            ai_health: state.ai_health(),
            history: state.history().to_vec(),
            turns_played: state.turns_played(),
            ended_by: state.ended_by(),
            last_score: state.last_score().cloned(),
            created_at: state.created_at().to_string(),
        }
    }
}

/// What happened during a single turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSummary {
    pub user_damage: u32,
    pub ai_damage: u32,
    pub hits: Vec<DamageHit>,
    /// One line per hit, e.g. "You took 10 damage: weak logic"
    pub notices: Vec<String>,
    pub winner: Winner,
    pub reasoning: String,
    pub fallacies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coaching_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check: Option<String>,
    /// Set when the judge failed and the turn was scored as a draw
    pub degraded: bool,
    /// None when the turn ended the match before the opponent replied
    pub rebuttal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(rename = "match")]
    pub match_view: MatchView,
    pub turn: TurnSummary,
}

impl From<TurnResult> for TurnResponse {
    fn from(result: TurnResult) -> Self {
        let damage = result.outcome.damage;
        let record = result.record;
        TurnResponse {
            match_view: MatchView::from(&result.state),
            turn: TurnSummary {
                user_damage: damage.user,
                ai_damage: damage.ai,
                notices: damage.hits.iter().map(DamageHit::notice).collect(),
                hits: damage.hits,
                winner: record.winner,
                reasoning: record.reasoning,
                fallacies: record.fallacies,
                skills: record.skills,
                coaching_tip: record.coaching_tip,
                fact_check: record.fact_check,
                degraded: record.degraded,
                rebuttal: result.rebuttal,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReportResponse {
    pub match_id: MatchId,
    pub outcome: MatchStatus,
    /// Null when the report generator was unavailable
    pub report: Option<Report>,
}

impl FinalReportResponse {
    pub fn new(match_id: &str, final_report: FinalReport) -> Self {
        Self {
            match_id: match_id.to_string(),
            outcome: final_report.outcome,
            report: final_report.report,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionInfo {
    pub name: String,
    pub description: String,
}

/// Choices offered on the setup screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub personas: Vec<OptionInfo>,
    pub difficulties: Vec<OptionInfo>,
    pub stances: Vec<Stance>,
    pub modes: Vec<CombatMode>,
}

fn option_infos(table: &[(&str, &str)]) -> Vec<OptionInfo> {
    table
        .iter()
        .map(|(name, description)| OptionInfo {
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
}

impl OptionsResponse {
    pub fn current() -> Self {
        Self {
            personas: option_infos(PERSONAS),
            difficulties: option_infos(DIFFICULTIES),
            stances: vec![Stance::Against, Stance::InFavour],
            modes: vec![CombatMode::SingleHealth, CombatMode::TwoSided],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub msg: String,
}
