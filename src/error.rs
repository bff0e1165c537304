use crate::types::MatchStatus;

pub type ArenaResult<T> = Result<T, ArenaError>;

/// Errors raised by the match controller and its oracles
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// Judge call failed or returned malformed data
    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    /// Opening or rebuttal text could not be generated
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Report unavailable: {0}")]
    ReportUnavailable(String),

    #[error("Cannot {action} while match is {from:?}")]
    InvalidStateTransition {
        from: MatchStatus,
        action: &'static str,
    },

    #[error("A turn is already being processed for match {0}")]
    TurnInProgress(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ArenaError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ArenaError::ScoringUnavailable(_) => "SCORING_UNAVAILABLE",
            ArenaError::GenerationUnavailable(_) => "GENERATION_UNAVAILABLE",
            ArenaError::ReportUnavailable(_) => "REPORT_UNAVAILABLE",
            ArenaError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ArenaError::TurnInProgress(_) => "TURN_IN_PROGRESS",
            ArenaError::MatchNotFound(_) => "MATCH_NOT_FOUND",
            ArenaError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}
