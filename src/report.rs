//! Final coaching report.

use crate::error::{ArenaError, ArenaResult};
use crate::judge::{lookup, parse_object, text_field};
use crate::llm::{GenerateRequest, LlmManager};
use crate::prompts;
use crate::types::{Report, ReportRequest, Winner};
use serde_json::{Map, Value};

fn required(object: &Map<String, Value>, name: &str) -> ArenaResult<String> {
    text_field(lookup(object, &[name]))
        .ok_or_else(|| ArenaError::ReportUnavailable(format!("report is missing {}", name)))
}

/// A list of tips or a single string; non-string entries are dropped
fn collect_tips(raw: Option<&Value>) -> Vec<String> {
    let items: Vec<&Value> = match raw {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) if single.is_string() => vec![single],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| text_field(Some(item)))
        .take(3)
        .collect()
}

/// Validate a raw oracle reply. The winner always comes from the match.
pub fn parse_report(raw: &str, winner: Winner) -> ArenaResult<Report> {
    let object = parse_object(raw).ok_or_else(|| {
        ArenaError::ReportUnavailable("report reply contained no JSON object".to_string())
    })?;

    let tips = collect_tips(lookup(&object, &["improvement_tips", "tips"]));
    let tips: [String; 3] = tips.try_into().map_err(|tips: Vec<String>| {
        ArenaError::ReportUnavailable(format!("expected 3 tips, got {}", tips.len()))
    })?;

    Ok(Report {
        winner,
        best_point_user: required(&object, "best_point_user")?,
        weakest_point_user: required(&object, "weakest_point_user")?,
        tips,
    })
}

pub struct ReportGenerator<'a> {
    llm: Option<&'a LlmManager>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(llm: Option<&'a LlmManager>) -> Self {
        Self { llm }
    }

    /// One attempt, no retry
    pub async fn summarize(&self, request: &ReportRequest) -> ArenaResult<Report> {
        let winner = request.outcome.winner().ok_or(ArenaError::InvalidStateTransition {
            from: request.outcome,
            action: "summarize the match",
        })?;
        let llm = self.llm.ok_or_else(|| {
            ArenaError::ReportUnavailable("no LLM providers configured".to_string())
        })?;

        let prompt = prompts::report(&request.topic, &request.history);
        let generate = GenerateRequest::from_config(
            &llm.config,
            Some(prompts::REPORT_SYSTEM.to_string()),
            prompt,
        )
        .json();

        let response = llm
            .generate(generate)
            .await
            .map_err(|e| ArenaError::ReportUnavailable(e.to_string()))?;

        parse_report(&response.text, winner)
    }
}
