use std::collections::HashMap;

pub const DIGIT_PLACEHOLDER: &str = "{digit}";

pub const ASK_KEY: &str = "ask_digit";
pub const CORRECT_KEY: &str = "correct";

const DEFAULT_ASK: &str = "Please show me the number {digit}.";
const DEFAULT_CORRECT: &str = "That's right, it was {digit}!";

/// Spoken prompt templates. Each template may embed `{digit}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    ask: String,
    correct: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            ask: DEFAULT_ASK.to_string(),
            correct: DEFAULT_CORRECT.to_string(),
        }
    }
}

impl Prompts {
    pub fn new(ask: impl Into<String>, correct: impl Into<String>) -> Self {
        Self {
            ask: ask.into(),
            correct: correct.into(),
        }
    }

    /// Builds templates from a map keyed by prompt name. Missing or blank entries
    /// fall back to the built-in wording.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let pick = |key: &str, default: &str| {
            map.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            ask: pick(ASK_KEY, DEFAULT_ASK),
            correct: pick(CORRECT_KEY, DEFAULT_CORRECT),
        }
    }

    pub fn ask(&self, digit: u8) -> String {
        render(&self.ask, digit)
    }

    pub fn praise(&self, digit: u8) -> String {
        render(&self.correct, digit)
    }
}

fn render(template: &str, digit: u8) -> String {
    template.replace(DIGIT_PLACEHOLDER, &digit.to_string())
}
