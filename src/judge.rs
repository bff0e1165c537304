//! Judge adapter: asks the scoring oracle for a verdict on a turn and turns
//! its reply into a validated `ScoreRecord`.
//!
//! The oracle is untrusted. Scores are clamped, unknown winners become draws,
//! and anything structurally wrong is `ScoringUnavailable`.

use crate::error::{ArenaError, ArenaResult};
use crate::llm::{GenerateRequest, LlmManager};
use crate::prompts;
use crate::types::{CombatMode, ScoreRecord, SkillProfile, Winner, MAX_SCORE};
use serde_json::{Map, Value};

/// Fallacy entries models emit when they found none
const NO_FALLACY_MARKERS: &[&str] = &["none", "n/a", "na", "no fallacies", "no fallacy"];

/// Keys the judge may use for each field, preferred spelling first
const USER_LOGIC_KEYS: &[&str] = &["user_logic", "logic_score", "logic"];
const USER_RELEVANCE_KEYS: &[&str] = &["user_relevance", "relevance_score", "relevance"];
const EVIDENCE_KEYS: &[&str] = &["evidence", "evidence_score"];
const CIVILITY_KEYS: &[&str] = &["civility", "civility_score"];
const CONCISENESS_KEYS: &[&str] = &["conciseness", "conciseness_score"];

/// First non-null value among `keys`
pub(crate) fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Trimmed, non-blank string; anything else is absent
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Parse the outermost object of a reply, or None when there is none
pub(crate) fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(extract_json_object(raw)?) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Slice out the outermost JSON object; models like to wrap it in prose or
/// code fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Accepts numbers or numeric strings, rounds, clamps to [0, 100]
fn clamp_score(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, f64::from(MAX_SCORE)) as u8)
}

fn score_field(object: &Map<String, Value>, keys: &[&str]) -> Option<u8> {
    lookup(object, keys).and_then(clamp_score)
}

/// A list, a single string or nothing; "none" markers are dropped
fn clean_fallacies(raw: Option<&Value>) -> Vec<String> {
    let items: Vec<&Value> = match raw {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) if single.is_string() => vec![single],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| item.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            !NO_FALLACY_MARKERS.contains(&lower.as_str())
        })
        .collect()
}

/// Parse and validate a raw oracle reply. Only a missing or non-numeric
/// `user_logic` (or `ai_logic` in two-sided mode) rejects the record; every
/// other field is coerced.
pub fn parse_score_record(raw: &str, mode: CombatMode) -> ArenaResult<ScoreRecord> {
    let object = parse_object(raw).ok_or_else(|| {
        ArenaError::ScoringUnavailable("judge reply contained no JSON object".to_string())
    })?;

    let user_logic = score_field(&object, USER_LOGIC_KEYS).ok_or_else(|| {
        ArenaError::ScoringUnavailable("judge reply is missing user_logic".to_string())
    })?;

    let (ai_logic, ai_relevance) = match mode {
        CombatMode::SingleHealth => (None, None),
        CombatMode::TwoSided => {
            let ai_logic = score_field(&object, &["ai_logic"]).ok_or_else(|| {
                ArenaError::ScoringUnavailable("judge reply is missing ai_logic".to_string())
            })?;
            (Some(ai_logic), score_field(&object, &["ai_relevance"]))
        }
    };

    let skills = match (
        score_field(&object, EVIDENCE_KEYS),
        score_field(&object, CIVILITY_KEYS),
        score_field(&object, CONCISENESS_KEYS),
    ) {
        (Some(evidence), Some(civility), Some(conciseness)) => Some(SkillProfile {
            evidence,
            civility,
            conciseness,
        }),
        _ => None,
    };

    Ok(ScoreRecord {
        user_logic,
        user_relevance: score_field(&object, USER_RELEVANCE_KEYS),
        ai_logic,
        ai_relevance,
        winner: text_field(lookup(&object, &["winner"]))
            .map(|label| Winner::from_label(&label))
            .unwrap_or(Winner::Draw),
        reasoning: text_field(lookup(&object, &["reasoning"])).unwrap_or_default(),
        fallacies: clean_fallacies(lookup(&object, &["fallacies"])),
        skills,
        coaching_tip: text_field(lookup(&object, &["coaching_tip"])),
        fact_check: text_field(lookup(&object, &["fact_check"])),
        degraded: false,
    })
}

/// Scoring oracle client
pub struct Judge<'a> {
    llm: Option<&'a LlmManager>,
}

impl<'a> Judge<'a> {
    pub fn new(llm: Option<&'a LlmManager>) -> Self {
        Self { llm }
    }

    /// Score one turn. `ai_argument` is given only in two-sided mode.
    pub async fn score(
        &self,
        topic: &str,
        user_argument: &str,
        ai_argument: Option<&str>,
    ) -> ArenaResult<ScoreRecord> {
        if topic.trim().is_empty() || user_argument.trim().is_empty() {
            return Err(ArenaError::InvalidInput(
                "topic and argument must not be empty".to_string(),
            ));
        }
        let llm = self.llm.ok_or_else(|| {
            ArenaError::ScoringUnavailable("no LLM providers configured".to_string())
        })?;

        let (prompt, mode) = match ai_argument {
            Some(rebuttal) => (
                prompts::judge_exchange(topic, user_argument, rebuttal),
                CombatMode::TwoSided,
            ),
            None => (
                prompts::judge_single(topic, user_argument),
                CombatMode::SingleHealth,
            ),
        };
        let request =
            GenerateRequest::from_config(&llm.config, Some(prompts::JUDGE_SYSTEM.to_string()), prompt)
                .json();

        // Each provider attempt is bounded by the configured timeout
        let response = llm
            .generate(request)
            .await
            .map_err(|e| ArenaError::ScoringUnavailable(e.to_string()))?;

        parse_score_record(&response.text, mode)
    }

    /// Score a turn, degrading to a neutral draw when the oracle fails
    pub async fn score_or_neutral(
        &self,
        topic: &str,
        user_argument: &str,
        ai_argument: Option<&str>,
    ) -> ScoreRecord {
        let mode = if ai_argument.is_some() {
            CombatMode::TwoSided
        } else {
            CombatMode::SingleHealth
        };

        match self.score(topic, user_argument, ai_argument).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Judge failed, scoring turn as a draw: {}", e);
                ScoreRecord::neutral(mode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmConfig, ScriptedProvider};
    use std::sync::Arc;
    use std::time::Duration;

    fn manager(script: &Arc<ScriptedProvider>) -> LlmManager {
        LlmManager::new(vec![Box::new(script.clone())], LlmConfig::default())
    }

    #[test]
    fn test_parse_plain_json() {
        let record = parse_score_record(
            r#"{"user_logic": 72, "user_relevance": 40, "fallacies": ["strawman"], "reasoning": "ok"}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();

        assert_eq!(record.user_logic, 72);
        assert_eq!(record.user_relevance, Some(40));
        assert_eq!(record.fallacies, vec!["strawman".to_string()]);
        assert_eq!(record.winner, Winner::Draw);
        assert!(!record.degraded);
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let raw = "Here is my verdict:\n```json\n{\"user_logic\": 55, \"ai_logic\": 60, \"winner\": \"AI\"}\n```";
        let record = parse_score_record(raw, CombatMode::TwoSided).unwrap();
        assert_eq!(record.ai_logic, Some(60));
        assert_eq!(record.winner, Winner::Ai);
    }

    #[test]
    fn test_parse_clamps_and_rounds() {
        let record = parse_score_record(
            r#"{"user_logic": 140, "user_relevance": -12, "ai_logic": "87.6", "winner": "user"}"#,
            CombatMode::TwoSided,
        )
        .unwrap();
        assert_eq!(record.user_logic, 100);
        assert_eq!(record.user_relevance, Some(0));
        assert_eq!(record.ai_logic, Some(88));
    }

    #[test]
    fn test_parse_accepts_legacy_field_names() {
        let record = parse_score_record(
            r#"{"logic_score": 30, "relevance_score": 45, "evidence_score": 10,
                "civility_score": 90, "conciseness_score": 70, "coaching_tip": " Cite a source. "}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(record.user_logic, 30);
        assert_eq!(record.user_relevance, Some(45));
        assert_eq!(
            record.skills,
            Some(SkillProfile {
                evidence: 10,
                civility: 90,
                conciseness: 70
            })
        );
        assert_eq!(record.coaching_tip.as_deref(), Some("Cite a source."));
    }

    #[test]
    fn test_parse_unknown_winner_is_draw() {
        let record = parse_score_record(
            r#"{"user_logic": 50, "ai_logic": 50, "winner": "the audience"}"#,
            CombatMode::TwoSided,
        )
        .unwrap();
        assert_eq!(record.winner, Winner::Draw);
    }

    #[test]
    fn test_parse_cleans_fallacies() {
        let record = parse_score_record(
            r#"{"user_logic": 50, "fallacies": [" strawman ", "", "None", 3, "slippery slope"]}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(
            record.fallacies,
            vec!["strawman".to_string(), "slippery slope".to_string()]
        );
    }

    #[test]
    fn test_parse_fallacies_as_plain_string() {
        let none = parse_score_record(
            r#"{"user_logic": 10, "user_relevance": 10, "fallacies": "None"}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(none.user_logic, 10);
        assert!(none.fallacies.is_empty());

        let one = parse_score_record(
            r#"{"user_logic": 10, "fallacies": " ad hominem "}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(one.fallacies, vec!["ad hominem".to_string()]);

        let bare = parse_score_record(
            r#"{"user_logic": 10, "fallacies": 2}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert!(bare.fallacies.is_empty());
    }

    #[test]
    fn test_parse_coerces_non_string_text_fields() {
        let record = parse_score_record(
            r#"{"user_logic": 20, "ai_logic": 70, "winner": 1,
                "reasoning": {"summary": "weak"}, "coaching_tip": 5, "fact_check": null}"#,
            CombatMode::TwoSided,
        )
        .unwrap();
        assert_eq!(record.user_logic, 20);
        assert_eq!(record.winner, Winner::Draw);
        assert_eq!(record.reasoning, "");
        assert_eq!(record.coaching_tip, None);
        assert_eq!(record.fact_check, None);
    }

    #[test]
    fn test_parse_prefers_canonical_key_over_legacy() {
        let record = parse_score_record(
            r#"{"user_logic": 10, "logic": 12, "relevance": 30, "relevance_score": 35}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(record.user_logic, 10);
        assert_eq!(record.user_relevance, Some(35));

        let fallback = parse_score_record(
            r#"{"user_logic": null, "logic_score": 44}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(fallback.user_logic, 44);
    }

    #[test]
    fn test_low_score_with_odd_fields_still_damages() {
        let record = parse_score_record(
            r#"{"user_logic": 10, "user_relevance": 10, "fallacies": "None", "reasoning": 3}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        let damage = crate::state::assess(CombatMode::SingleHealth, &record);
        assert_eq!(damage.user, 25);
        assert!(!record.degraded);
    }

    #[test]
    fn test_parse_single_mode_drops_ai_scores() {
        let record = parse_score_record(
            r#"{"user_logic": 50, "ai_logic": 90}"#,
            CombatMode::SingleHealth,
        )
        .unwrap();
        assert_eq!(record.ai_logic, None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "I think the user did great!",
            "{not json}",
            r#"{"user_relevance": 80}"#,
            r#"{"user_logic": "high"}"#,
            "} backwards {",
            r#"[{"user_logic": 50}]"#,
        ] {
            assert!(
                matches!(
                    parse_score_record(raw, CombatMode::SingleHealth),
                    Err(ArenaError::ScoringUnavailable(_))
                ),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn test_parse_two_sided_requires_ai_logic() {
        for raw in [
            r#"{"user_logic": 50}"#,
            r#"{"user_logic": 50, "ai_logic": "strong"}"#,
        ] {
            let result = parse_score_record(raw, CombatMode::TwoSided);
            assert!(matches!(result, Err(ArenaError::ScoringUnavailable(_))));
        }
    }

    #[tokio::test]
    async fn test_score_uses_exchange_prompt() {
        let script = Arc::new(ScriptedProvider::new("script"));
        script.push_text(r#"{"user_logic": 50, "ai_logic": 80, "winner": "ai"}"#);
        let llm = manager(&script);

        let record = Judge::new(Some(&llm))
            .score("Topic", "My point", Some("Your point"))
            .await
            .unwrap();

        assert_eq!(record.winner, Winner::Ai);
        assert!(script.prompts()[0].contains("AI Rebuttal: \"Your point\""));
    }

    #[tokio::test]
    async fn test_score_without_llm_is_unavailable() {
        let result = Judge::new(None).score("Topic", "Point", None).await;
        assert!(matches!(result, Err(ArenaError::ScoringUnavailable(_))));
    }

    #[tokio::test]
    async fn test_score_rejects_empty_input() {
        let script = Arc::new(ScriptedProvider::new("script"));
        let llm = manager(&script);
        let result = Judge::new(Some(&llm)).score("Topic", "   ", None).await;
        assert!(matches!(result, Err(ArenaError::InvalidInput(_))));
        assert!(script.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_failures_degrade_to_one_neutral_record() {
        let script = Arc::new(ScriptedProvider::new("script"));
        script.push_error("upstream 500").push_text("garbage");
        let llm = manager(&script);
        let judge = Judge::new(Some(&llm));

        let first = judge.score_or_neutral("Topic", "Point", None).await;
        let second = judge.score_or_neutral("Topic", "Point", Some("Reply")).await;

        assert_eq!(first, ScoreRecord::neutral(CombatMode::SingleHealth));
        assert_eq!(second, ScoreRecord::neutral(CombatMode::TwoSided));
        assert_eq!(script.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_judge_times_out() {
        let script = Arc::new(
            ScriptedProvider::new("slow").with_latency(Duration::from_millis(200)),
        );
        script.push_text(r#"{"user_logic": 90}"#);
        let config = LlmConfig {
            default_timeout: Duration::from_millis(20),
            ..LlmConfig::default()
        };
        let llm = LlmManager::new(vec![Box::new(script.clone())], config);

        let result = Judge::new(Some(&llm)).score("Topic", "Point", None).await;
        assert!(matches!(result, Err(ArenaError::ScoringUnavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_first_provider_leaves_time_for_backup() {
        let first = Arc::new(ScriptedProvider::new("first").with_latency(Duration::from_millis(60)));
        first.push_error("overloaded");
        let second =
            Arc::new(ScriptedProvider::new("second").with_latency(Duration::from_millis(60)));
        second.push_text(r#"{"user_logic": 30, "user_relevance": 30}"#);
        let config = LlmConfig {
            default_timeout: Duration::from_millis(100),
            ..LlmConfig::default()
        };
        let llm = LlmManager::new(vec![Box::new(first.clone()), Box::new(second.clone())], config);

        let record = Judge::new(Some(&llm))
            .score("Topic", "Point", None)
            .await
            .unwrap();

        assert_eq!(record.user_logic, 30);
        assert_eq!(second.remaining(), 0);
    }
}
