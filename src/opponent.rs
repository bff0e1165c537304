//! The AI opponent: opening statements and rebuttals.

use crate::error::{ArenaError, ArenaResult};
use crate::llm::{GenerateRequest, LlmManager};
use crate::prompts;
use crate::types::{MatchConfig, TurnEntry};

/// Shown when the opening cannot be generated
pub const FALLBACK_OPENING: &str = "Let's debate.";
/// Shown when a rebuttal cannot be generated
pub const FALLBACK_REBUTTAL: &str = "I disagree.";

pub struct Opponent<'a> {
    llm: Option<&'a LlmManager>,
}

impl<'a> Opponent<'a> {
    pub fn new(llm: Option<&'a LlmManager>) -> Self {
        Self { llm }
    }

    async fn generate(&self, system: String, prompt: String) -> ArenaResult<String> {
        let llm = self.llm.ok_or_else(|| {
            ArenaError::GenerationUnavailable("no LLM providers configured".to_string())
        })?;
        let request = GenerateRequest::from_config(&llm.config, Some(system), prompt);

        let response = llm
            .generate(request)
            .await
            .map_err(|e| ArenaError::GenerationUnavailable(e.to_string()))?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(ArenaError::GenerationUnavailable(
                "model returned empty text".to_string(),
            ));
        }
        Ok(text.to_string())
    }

    pub async fn opening(&self, config: &MatchConfig) -> ArenaResult<String> {
        let (system, prompt) = prompts::opening(config);
        self.generate(system, prompt).await
    }

    pub async fn rebuttal(
        &self,
        config: &MatchConfig,
        history: &[TurnEntry],
        argument: &str,
    ) -> ArenaResult<String> {
        let (system, prompt) = prompts::rebuttal(config, history, argument);
        self.generate(system, prompt).await
    }

    /// Opening text, or the stock fallback
    pub async fn opening_or_fallback(&self, config: &MatchConfig) -> String {
        self.opening(config).await.unwrap_or_else(|e| {
            tracing::warn!("Opening generation failed: {}", e);
            FALLBACK_OPENING.to_string()
        })
    }

    /// Rebuttal text, or the stock fallback
    pub async fn rebuttal_or_fallback(
        &self,
        config: &MatchConfig,
        history: &[TurnEntry],
        argument: &str,
    ) -> String {
        self.rebuttal(config, history, argument)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Rebuttal generation failed: {}", e);
                FALLBACK_REBUTTAL.to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmConfig, ScriptedProvider};
    use crate::types::{CombatMode, Speaker, Stance};
    use std::sync::Arc;

    fn config() -> MatchConfig {
        MatchConfig {
            topic: "Homework should be banned".to_string(),
            persona: "The Bureaucrat".to_string(),
            difficulty: "Easy".to_string(),
            stance: Stance::Against,
            mode: CombatMode::SingleHealth,
        }
    }

    #[tokio::test]
    async fn test_opening_text_is_trimmed() {
        let script = Arc::new(ScriptedProvider::new("script"));
        script.push_text("  Homework builds discipline.  ");
        let llm = LlmManager::new(vec![Box::new(script.clone())], LlmConfig::default());

        let opening = Opponent::new(Some(&llm)).opening(&config()).await.unwrap();
        assert_eq!(opening, "Homework builds discipline.");
    }

    #[tokio::test]
    async fn test_fallbacks() {
        let script = Arc::new(ScriptedProvider::new("script"));
        script.push_error("down").push_text("   ");
        let llm = LlmManager::new(vec![Box::new(script.clone())], LlmConfig::default());
        let opponent = Opponent::new(Some(&llm));

        assert_eq!(opponent.opening_or_fallback(&config()).await, FALLBACK_OPENING);
        assert_eq!(
            opponent
                .rebuttal_or_fallback(&config(), &[], "No more homework")
                .await,
            FALLBACK_REBUTTAL
        );
    }

    #[tokio::test]
    async fn test_rebuttal_sees_history() {
        let script = Arc::new(ScriptedProvider::new("script"));
        script.push_text("Citation needed.");
        let llm = LlmManager::new(vec![Box::new(script.clone())], LlmConfig::default());
        let history = vec![TurnEntry::now(Speaker::Opponent, "Homework builds discipline.")];

        let reply = Opponent::new(Some(&llm))
            .rebuttal(&config(), &history, "Kids need rest")
            .await
            .unwrap();

        assert_eq!(reply, "Citation needed.");
        assert!(script.prompts()[0].contains("assistant: Homework builds discipline."));
    }

    #[tokio::test]
    async fn test_no_llm_is_unavailable() {
        let result = Opponent::new(None).opening(&config()).await;
        assert!(matches!(result, Err(ArenaError::GenerationUnavailable(_))));
    }
}
