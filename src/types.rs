use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type MatchId = String;

/// Upper bound of both health pools and of every judged score
pub const MAX_HEALTH: u8 = 100;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    UserVictory,
    AiVictory,
    Draw,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchStatus::UserVictory | MatchStatus::AiVictory | MatchStatus::Draw
        )
    }

    /// Winner of a terminal match
    pub fn winner(&self) -> Option<Winner> {
        match self {
            MatchStatus::UserVictory => Some(Winner::User),
            MatchStatus::AiVictory => Some(Winner::Ai),
            MatchStatus::Draw => Some(Winner::Draw),
            MatchStatus::NotStarted | MatchStatus::InProgress => None,
        }
    }
}

/// How a terminal match ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A health pool reached zero
    Knockout,
    /// The user quit
    Forfeit,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CombatMode {
    /// Only the user has health; penalties come from the user's own scores
    #[default]
    SingleHealth,
    /// Both sides have health and trade damage each turn
    TwoSided,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    User,
    Ai,
    Draw,
}

impl Winner {
    /// Map a free-form oracle label; anything unrecognized is a draw
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "user" | "you" | "human" => Winner::User,
            "ai" | "opponent" | "assistant" | "model" => Winner::Ai,
            _ => Winner::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Against,
    InFavour,
}

impl Stance {
    pub fn label(&self) -> &'static str {
        match self {
            Stance::Against => "AGAINST",
            Stance::InFavour => "IN FAVOUR",
        }
    }
}

/// Immutable per-match configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub topic: String,
    pub persona: String,
    pub difficulty: String,
    #[serde(default)]
    pub stance: Stance,
    #[serde(default)]
    pub mode: CombatMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Opponent,
}

impl Speaker {
    /// Role label used when replaying history to the model
    pub fn role(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Opponent => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnEntry {
    pub speaker: Speaker,
    pub text: String,
    /// ISO timestamp
    pub at: String,
}

impl TurnEntry {
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Secondary judged axes shown as a skill profile; they never cause damage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillProfile {
    pub evidence: u8,
    pub civility: u8,
    pub conciseness: u8,
}

/// One judged turn, already clamped and normalized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub user_logic: u8,
    pub user_relevance: Option<u8>,
    pub ai_logic: Option<u8>,
    pub ai_relevance: Option<u8>,
    pub winner: Winner,
    pub reasoning: String,
    pub fallacies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coaching_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check: Option<String>,
    /// True when this record was synthesized because the judge was unavailable
    #[serde(default)]
    pub degraded: bool,
}

impl ScoreRecord {
    /// Draw-equivalent stand-in for a failed judge call
    pub fn neutral(mode: CombatMode) -> Self {
        let two_sided = mode == CombatMode::TwoSided;
        Self {
            user_logic: 50,
            user_relevance: Some(50),
            ai_logic: two_sided.then_some(50),
            ai_relevance: two_sided.then_some(50),
            winner: Winner::Draw,
            reasoning: "Judge unavailable; turn scored as a draw.".to_string(),
            fallacies: Vec::new(),
            skills: None,
            coaching_tip: None,
            fact_check: None,
            degraded: true,
        }
    }
}

/// Final coaching report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub winner: Winner,
    pub best_point_user: String,
    pub weakest_point_user: String,
    pub tips: [String; 3],
}

/// Frozen transcript handed to the report generator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRequest {
    pub match_id: MatchId,
    pub topic: String,
    pub history: Vec<TurnEntry>,
    pub outcome: MatchStatus,
}
