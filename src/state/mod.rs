mod damage;
mod machine;
mod session;

pub use damage::{assess, DamageCause, DamageHit, TurnDamage};
pub use machine::{Exchange, MatchState, TurnOutcome};
pub use session::{FinalReport, TurnResult};

use crate::llm::LlmManager;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub matches: Arc<RwLock<HashMap<MatchId, MatchState>>>,
    /// Successful final reports, keyed by match
    pub reports: Arc<RwLock<HashMap<MatchId, Report>>>,
    /// Matches with a turn currently being scored
    in_flight: Arc<Mutex<HashSet<MatchId>>>,
    /// Per-match gate so concurrent report requests share one oracle call
    report_gates: Arc<Mutex<HashMap<MatchId, Arc<tokio::sync::Mutex<()>>>>>,
    /// Oracle providers (None when nothing is configured)
    pub llm: Option<Arc<LlmManager>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::new_with_llm(None)
    }

    pub fn new_with_llm(llm: Option<LlmManager>) -> Self {
        Self {
            matches: Arc::new(RwLock::new(HashMap::new())),
            reports: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            report_gates: Arc::new(Mutex::new(HashMap::new())),
            llm: llm.map(Arc::new),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
