//! Prompt text: persona / difficulty lookup tables and the templates sent to
//! the oracles.

use crate::types::{MatchConfig, Stance, TurnEntry};

/// How many history entries the rebuttal prompt replays
pub const REBUTTAL_HISTORY_WINDOW: usize = 5;

pub const DEFAULT_PERSONA_INSTRUCTION: &str = "Skilled debater.";
pub const DEFAULT_DIFFICULTY_INSTRUCTION: &str = "Standard level.";

/// Opponent personas offered to players
pub const PERSONAS: &[(&str, &str)] = &[
    (
        "Logical Vulcan",
        "Purely logical, cold, focuses on data and contradictions.",
    ),
    (
        "Aggressive Troll",
        "Emotional, interruptive, sarcastic. Try to fluster the user.",
    ),
    (
        "Socratic Teacher",
        "Ask probing questions to make the user realize their own errors.",
    ),
    (
        "Devil's Advocate",
        "Contrarian but polite. Always find the opposing view.",
    ),
    (
        "The Bureaucrat",
        "Obsessed with definitions and citations. Demand proof for everything.",
    ),
];

pub const DIFFICULTIES: &[(&str, &str)] = &[
    ("Easy", "Use simple language. Make occasional logical errors."),
    ("Medium", "Standard debate level. Competent and clear."),
    ("Hard", "Use complex vocabulary. Be ruthless about weak points."),
    (
        "God Mode",
        "Point out every micro-contradiction. You never concede a point.",
    ),
];

fn lookup(table: &[(&str, &'static str)], key: &str, default: &'static str) -> &'static str {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key.trim()))
        .map(|(_, instruction)| *instruction)
        .unwrap_or(default)
}

pub fn persona_instruction(persona: &str) -> &'static str {
    lookup(PERSONAS, persona, DEFAULT_PERSONA_INSTRUCTION)
}

pub fn difficulty_instruction(difficulty: &str) -> &'static str {
    lookup(DIFFICULTIES, difficulty, DEFAULT_DIFFICULTY_INSTRUCTION)
}

fn stance_line(stance: Stance) -> String {
    format!("You must ARGUE {} the topic.", stance.label())
}

fn opponent_system(config: &MatchConfig) -> String {
    format!(
        "You are debating as {persona}. Role: {role}\nDifficulty: {difficulty}\n{stance}",
        persona = config.persona.trim(),
        role = persona_instruction(&config.persona),
        difficulty = difficulty_instruction(&config.difficulty),
        stance = stance_line(config.stance),
    )
}

/// (system, prompt) for the opponent's opening statement
pub fn opening(config: &MatchConfig) -> (String, String) {
    let prompt = format!(
        "Topic: \"{}\"\nGenerate a strong, 2-sentence opening argument. Do NOT say \"Prove me wrong.\"",
        config.topic
    );
    (opponent_system(config), prompt)
}

/// Render the tail of the transcript as `role: text` lines
pub fn format_history(history: &[TurnEntry], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|entry| format!("{}: {}", entry.speaker.role(), entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// (system, prompt) for a rebuttal to the user's latest argument
pub fn rebuttal(config: &MatchConfig, history: &[TurnEntry], argument: &str) -> (String, String) {
    let prompt = format!(
        "Topic: \"{topic}\"\nHistory:\n{history}\nUser Argument: \"{argument}\"\n\n\
         Rebut the user based on your role and difficulty. Keep it under 4 sentences.",
        topic = config.topic,
        history = format_history(history, REBUTTAL_HISTORY_WINDOW),
        argument = argument,
    );
    (opponent_system(config), prompt)
}

pub const JUDGE_SYSTEM: &str = "Act as a neutral, impartial debate judge. \
    Reply with a single JSON object and nothing else.";

/// Prompt for scoring the user's argument alone
pub fn judge_single(topic: &str, argument: &str) -> String {
    format!(
        "Topic: \"{topic}\"\nArgument: \"{argument}\"\n\n\
         Score the argument from 0 to 100 on logic, relevance, evidence, civility and conciseness. \
         Identify logical fallacies, fact-check the claims and give one short coaching tip.\n\
         Respond with JSON: {{\"user_logic\": int, \"user_relevance\": int, \"evidence\": int, \
         \"civility\": int, \"conciseness\": int, \"fallacies\": [string], \
         \"coaching_tip\": string, \"fact_check\": string, \"reasoning\": string}}"
    )
}

/// Prompt for judging one exchange between the user and the opponent
pub fn judge_exchange(topic: &str, argument: &str, rebuttal: &str) -> String {
    format!(
        "Topic: \"{topic}\"\nUser Argument: \"{argument}\"\nAI Rebuttal: \"{rebuttal}\"\n\n\
         1. Score the user's logic and relevance (0-100).\n\
         2. Score the AI's logic and relevance (0-100).\n\
         3. Decide who won this exchange: \"user\", \"ai\" or \"draw\".\n\
         4. List the user's logical fallacies and give brief reasoning.\n\
         Respond with JSON: {{\"user_logic\": int, \"user_relevance\": int, \"ai_logic\": int, \
         \"ai_relevance\": int, \"winner\": string, \"fallacies\": [string], \"reasoning\": string}}"
    )
}

pub const REPORT_SYSTEM: &str = "You are a debate coach. \
    Reply with a single JSON object and nothing else.";

/// Prompt for the end-of-match coaching report
pub fn report(topic: &str, history: &[TurnEntry]) -> String {
    format!(
        "Analyze this full debate.\nTopic: \"{topic}\"\nHistory:\n{history}\n\n\
         Write a coaching report for the user: their best point, their weakest moment \
         and exactly 3 specific tips to improve.\n\
         Respond with JSON: {{\"best_point_user\": string, \"weakest_point_user\": string, \
         \"improvement_tips\": [string, string, string]}}",
        history = format_history(history, history.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CombatMode, Speaker};

    fn config() -> MatchConfig {
        MatchConfig {
            topic: "AI will replace doctors".to_string(),
            persona: "Socratic Teacher".to_string(),
            difficulty: "Hard".to_string(),
            stance: Stance::InFavour,
            mode: CombatMode::SingleHealth,
        }
    }

    #[test]
    fn test_known_keys_resolve() {
        assert_eq!(
            persona_instruction("Logical Vulcan"),
            "Purely logical, cold, focuses on data and contradictions."
        );
        assert_eq!(
            difficulty_instruction("god mode"),
            "Point out every micro-contradiction. You never concede a point."
        );
    }

    #[test]
    fn test_unknown_keys_fall_back() {
        assert_eq!(persona_instruction("Pirate"), DEFAULT_PERSONA_INSTRUCTION);
        assert_eq!(persona_instruction(""), DEFAULT_PERSONA_INSTRUCTION);
        assert_eq!(
            difficulty_instruction("Nightmare"),
            DEFAULT_DIFFICULTY_INSTRUCTION
        );
    }

    #[test]
    fn test_opening_mentions_stance_and_role() {
        let (system, prompt) = opening(&config());
        assert!(system.contains("IN FAVOUR"));
        assert!(system.contains("probing questions"));
        assert!(prompt.contains("AI will replace doctors"));
    }

    #[test]
    fn test_history_window_keeps_latest() {
        let history: Vec<TurnEntry> = (0..8)
            .map(|i| {
                let speaker = if i % 2 == 0 {
                    Speaker::Opponent
                } else {
                    Speaker::User
                };
                TurnEntry::now(speaker, format!("line {}", i))
            })
            .collect();

        let text = format_history(&history, REBUTTAL_HISTORY_WINDOW);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "user: line 3");
        assert_eq!(lines[4], "assistant: line 7");

        assert_eq!(format_history(&history[..2], 5).lines().count(), 2);
        assert_eq!(format_history(&[], 5), "");
    }

    #[test]
    fn test_rebuttal_includes_argument() {
        let (_, prompt) = rebuttal(&config(), &[], "Doctors need empathy");
        assert!(prompt.contains("User Argument: \"Doctors need empathy\""));
    }
}
