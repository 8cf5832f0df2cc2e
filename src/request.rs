use anyhow::{Result, bail};
use serde::Serialize;

pub const MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

const MIN_TEMPERATURE: f64 = 0.0;
const MAX_TEMPERATURE: f64 = 2.0;

const ASSISTANT_PERSONA: &str =
    "You are an expert programming assistant. You will help with the code provided by the user.";
const CONTEXT_PREFIX: &str = "This is the code I need help with:\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl SamplingOptions {
    /// Validates raw command-line values. `max_tokens` is signed so that zero
    /// and negative input is rejected here instead of by the parser.
    pub fn new(temperature: f64, max_tokens: i64) -> Result<Self> {
        check_temperature(temperature)?;
        if max_tokens <= 0 {
            bail!("max tokens must be greater than 0 (got {})", max_tokens);
        }
        let max_tokens = u32::try_from(max_tokens)
            .map_err(|_| anyhow::anyhow!("max tokens must be at most {}", u32::MAX))?;

        Ok(Self {
            temperature,
            max_tokens,
        })
    }

    fn validate(&self) -> Result<()> {
        check_temperature(self.temperature)?;
        if self.max_tokens == 0 {
            bail!("max tokens must be greater than 0 (got 0)");
        }
        Ok(())
    }
}

fn check_temperature(temperature: f64) -> Result<()> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        bail!(
            "temperature must be between {:.1} and {:.1} (got {})",
            MIN_TEMPERATURE,
            MAX_TEMPERATURE,
            temperature
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

impl CompletionRequest {
    /// Builds the conversation: persona and context messages when `input` is
    /// non-empty, then the prompt as the final user message.
    pub fn build(input: &str, prompt: &str, sampling: SamplingOptions) -> Result<Self> {
        sampling.validate()?;

        let mut messages = Vec::with_capacity(3);
        if !input.is_empty() {
            messages.push(Message::system(ASSISTANT_PERSONA));
            messages.push(Message::user(format!("{CONTEXT_PREFIX}{input}")));
        }
        messages.push(Message::user(prompt));

        Ok(Self {
            model: MODEL.to_string(),
            messages,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            stream: false,
        })
    }
}
