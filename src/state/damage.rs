//! Damage rules for each combat mode.
//!
//! Pure functions of a `ScoreRecord`; the state machine applies the result.

use crate::types::{CombatMode, ScoreRecord, Speaker, Winner};
use serde::{Deserialize, Serialize};

/// Scores below this count as a failing axis
pub const PASSING_SCORE: u8 = 50;
pub const OFF_TOPIC_PENALTY: u32 = 15;
pub const WEAK_LOGIC_PENALTY: u32 = 10;
pub const FALLACY_PENALTY: u32 = 5;
/// Minimum damage of a decisive exchange in two-sided mode
pub const DECISIVE_FLOOR: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    OffTopic,
    WeakLogic,
    Fallacy(String),
    LostExchange,
}

/// One itemized penalty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DamageHit {
    pub target: Speaker,
    pub cause: DamageCause,
    pub amount: u32,
}

impl DamageHit {
    /// Short notice for the UI
    pub fn notice(&self) -> String {
        let who = match self.target {
            Speaker::User => "You",
            Speaker::Opponent => "Opponent",
        };
        match &self.cause {
            DamageCause::OffTopic => format!("{} took {} damage: off-topic", who, self.amount),
            DamageCause::WeakLogic => format!("{} took {} damage: weak logic", who, self.amount),
            DamageCause::Fallacy(name) => {
                format!("{} took {} damage: fallacy ({})", who, self.amount, name)
            }
            DamageCause::LostExchange => {
                format!("{} took {} damage: lost the exchange", who, self.amount)
            }
        }
    }
}

/// Damage dealt by a single turn
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnDamage {
    pub user: u32,
    pub ai: u32,
    pub hits: Vec<DamageHit>,
}

impl TurnDamage {
    fn hit(&mut self, target: Speaker, cause: DamageCause, amount: u32) {
        if amount == 0 {
            return;
        }
        match target {
            Speaker::User => self.user += amount,
            Speaker::Opponent => self.ai += amount,
        }
        self.hits.push(DamageHit {
            target,
            cause,
            amount,
        });
    }
}

/// Compute the damage a record deals under the given mode
pub fn assess(mode: CombatMode, record: &ScoreRecord) -> TurnDamage {
    match mode {
        CombatMode::SingleHealth => single_health(record),
        CombatMode::TwoSided => two_sided(record),
    }
}

fn single_health(record: &ScoreRecord) -> TurnDamage {
    let mut damage = TurnDamage::default();

    // Logic stands in for relevance when the judge did not score it
    let relevance = record.user_relevance.unwrap_or(record.user_logic);
    if relevance < PASSING_SCORE {
        damage.hit(Speaker::User, DamageCause::OffTopic, OFF_TOPIC_PENALTY);
    }
    if record.user_logic < PASSING_SCORE {
        damage.hit(Speaker::User, DamageCause::WeakLogic, WEAK_LOGIC_PENALTY);
    }
    for fallacy in &record.fallacies {
        damage.hit(
            Speaker::User,
            DamageCause::Fallacy(fallacy.clone()),
            FALLACY_PENALTY,
        );
    }

    damage
}

fn two_sided(record: &ScoreRecord) -> TurnDamage {
    let mut damage = TurnDamage::default();
    let user = i32::from(record.user_logic);
    let ai = i32::from(record.ai_logic.unwrap_or(record.user_logic));

    match record.winner {
        Winner::Ai => damage.hit(
            Speaker::User,
            DamageCause::LostExchange,
            decisive_amount(ai - user),
        ),
        Winner::User => damage.hit(
            Speaker::Opponent,
            DamageCause::LostExchange,
            decisive_amount(user - ai),
        ),
        Winner::Draw => {}
    }

    damage
}

fn decisive_amount(margin: i32) -> u32 {
    margin.max(DECISIVE_FLOOR as i32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_logic: u8, user_relevance: Option<u8>, fallacies: &[&str]) -> ScoreRecord {
        ScoreRecord {
            user_logic,
            user_relevance,
            ai_logic: None,
            ai_relevance: None,
            winner: Winner::Draw,
            reasoning: String::new(),
            fallacies: fallacies.iter().map(|f| f.to_string()).collect(),
            skills: None,
            coaching_tip: None,
            fact_check: None,
            degraded: false,
        }
    }

    fn exchange(winner: Winner, user_logic: u8, ai_logic: u8) -> ScoreRecord {
        ScoreRecord {
            ai_logic: Some(ai_logic),
            winner,
            ..record(user_logic, Some(80), &[])
        }
    }

    #[test]
    fn test_off_topic_only() {
        let damage = assess(CombatMode::SingleHealth, &record(60, Some(40), &[]));
        assert_eq!(damage.user, 15);
        assert_eq!(damage.ai, 0);
        assert_eq!(damage.hits.len(), 1);
        assert_eq!(damage.hits[0].cause, DamageCause::OffTopic);
    }

    #[test]
    fn test_penalties_are_additive() {
        let damage = assess(CombatMode::SingleHealth, &record(30, Some(40), &["strawman"]));
        assert_eq!(damage.user, 15 + 10 + 5);
        assert_eq!(
            damage.hits.last().map(|h| h.cause.clone()),
            Some(DamageCause::Fallacy("strawman".to_string()))
        );
    }

    #[test]
    fn test_each_fallacy_counts() {
        let damage = assess(
            CombatMode::SingleHealth,
            &record(90, Some(90), &["strawman", "ad hominem", "strawman"]),
        );
        assert_eq!(damage.user, 15);
    }

    #[test]
    fn test_passing_scores_deal_nothing() {
        let damage = assess(CombatMode::SingleHealth, &record(50, Some(50), &[]));
        assert_eq!(damage, TurnDamage::default());
    }

    #[test]
    fn test_logic_is_relevance_proxy() {
        let damage = assess(CombatMode::SingleHealth, &record(30, None, &[]));
        assert_eq!(damage.user, 15 + 10);

        let damage = assess(CombatMode::SingleHealth, &record(70, None, &[]));
        assert_eq!(damage.user, 0);
    }

    #[test]
    fn test_single_health_ignores_winner() {
        let mut rec = record(80, Some(80), &[]);
        rec.winner = Winner::Ai;
        assert_eq!(assess(CombatMode::SingleHealth, &rec).user, 0);
    }

    #[test]
    fn test_ai_wins_by_margin() {
        let damage = assess(CombatMode::TwoSided, &exchange(Winner::Ai, 50, 80));
        assert_eq!(damage.user, 30);
        assert_eq!(damage.ai, 0);
    }

    #[test]
    fn test_decisive_floor_applies_to_narrow_and_inverted_margins() {
        // Winner disagrees with the logic scores; the floor still applies
        let damage = assess(CombatMode::TwoSided, &exchange(Winner::Ai, 90, 20));
        assert_eq!(damage.user, DECISIVE_FLOOR);

        let damage = assess(CombatMode::TwoSided, &exchange(Winner::User, 55, 50));
        assert_eq!(damage.ai, DECISIVE_FLOOR);
        assert_eq!(damage.user, 0);
    }

    #[test]
    fn test_user_wins_by_margin() {
        let damage = assess(CombatMode::TwoSided, &exchange(Winner::User, 95, 15));
        assert_eq!(damage.ai, 80);
        assert_eq!(damage.hits[0].target, Speaker::Opponent);
    }

    #[test]
    fn test_draw_deals_nothing_two_sided() {
        let mut rec = exchange(Winner::Draw, 10, 90);
        rec.fallacies = vec!["strawman".to_string()];
        assert_eq!(assess(CombatMode::TwoSided, &rec), TurnDamage::default());
    }

    #[test]
    fn test_notice_text() {
        let hit = DamageHit {
            target: Speaker::User,
            cause: DamageCause::Fallacy("strawman".to_string()),
            amount: 5,
        };
        assert_eq!(hit.notice(), "You took 5 damage: fallacy (strawman)");
    }
}
