//! Token counting and context-window budgets
//!
//! A `TextTokenizer` turns text into a token count. `estimate` relates that
//! count to the context windows of a list of models.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Encoding used by the default tokenizer.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Marker reported per model when no token count is available.
pub const TOKENIZATION_ERROR: &str = "tokenization error";

/// Token count reported when tokenization failed.
pub const TOKEN_COUNT_UNKNOWN: i64 = -1;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load encoding '{encoding}': {message}")]
    Load { encoding: String, message: String },
    #[error("tokenization failed: {0}")]
    Encode(String),
}

/// Anything that can count tokens in a piece of text.
pub trait TextTokenizer: Send + Sync {
    fn count(&self, text: &str) -> Result<usize, TokenizerError>;
}

/// `cl100k_base` tokenizer backed by tiktoken.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn cl100k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::Load {
            encoding: DEFAULT_ENCODING.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl TextTokenizer for TiktokenTokenizer {
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        // Special-token text is encoded like any other text
        Ok(self.bpe.encode_ordinary(text).len())
    }
}

impl fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("encoding", &DEFAULT_ENCODING)
            .finish()
    }
}

/// A model and the number of tokens it accepts as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelWindow {
    pub name: String,
    pub window: u64,
}

impl ModelWindow {
    pub fn new(name: impl Into<String>, window: u64) -> Self {
        Self {
            name: name.into(),
            window,
        }
    }

    /// Parse `NAME=WINDOW`, e.g. `4o=128000`.
    pub fn parse(arg: &str) -> Result<Self, String> {
        let (name, window) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=WINDOW, got '{}'", arg))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing model name in '{}'", arg));
        }
        let window: u64 = window
            .trim()
            .parse()
            .map_err(|_| format!("invalid window size: {}", window.trim()))?;
        Ok(Self::new(name, window))
    }
}

/// Context windows reported by default.
pub fn default_models() -> Vec<ModelWindow> {
    vec![
        ModelWindow::new("4o", 128_000),
        ModelWindow::new("o3", 200_000),
        ModelWindow::new("GmP", 1_000_000),
        ModelWindow::new("Grk3", 1_000_000),
    ]
}

/// Share of a model's window, or a marker when the count is unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Value(f64),
    Unavailable,
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::Value(v) => serializer.serialize_f64(*v),
            Percentage::Unavailable => serializer.serialize_str(TOKENIZATION_ERROR),
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::Value(v) => write!(f, "{:.2}%", v),
            Percentage::Unavailable => f.write_str(TOKENIZATION_ERROR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPercentage {
    pub name: String,
    pub percentage: Percentage,
}

/// Token count plus per-model usage, in the order the models were given.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEstimate {
    pub token_count: i64,
    pub per_model: Vec<ModelPercentage>,
}

/// Count tokens in `text` and relate them to each model's window.
///
/// Without a tokenizer the count is 0; when tokenization fails it is
/// `TOKEN_COUNT_UNKNOWN`. In both cases every model reports the
/// `TOKENIZATION_ERROR` marker instead of a number.
pub fn estimate(
    text: &str,
    tokenizer: Option<&dyn TextTokenizer>,
    models: &[ModelWindow],
) -> TokenEstimate {
    let Some(tokenizer) = tokenizer else {
        tracing::warn!("no tokenizer available, token count is 0");
        return unavailable(0, models);
    };

    let token_count = match tokenizer.count(text) {
        Ok(n) => n as i64,
        Err(e) => {
            tracing::error!(error = %e, "tokenizing text failed");
            return unavailable(TOKEN_COUNT_UNKNOWN, models);
        }
    };

    let per_model = models
        .iter()
        .map(|m| ModelPercentage {
            name: m.name.clone(),
            percentage: Percentage::Value(window_percentage(token_count as u64, m.window)),
        })
        .collect();

    TokenEstimate {
        token_count,
        per_model,
    }
}

fn unavailable(token_count: i64, models: &[ModelWindow]) -> TokenEstimate {
    TokenEstimate {
        token_count,
        per_model: models
            .iter()
            .map(|m| ModelPercentage {
                name: m.name.clone(),
                percentage: Percentage::Unavailable,
            })
            .collect(),
    }
}

/// Percentage of `window` used by `tokens`, rounded to two decimals.
///
/// Non-zero usage never rounds down to zero: anything below 0.01 shows as
/// 0.01. A zero-sized window is full as soon as there is any token.
pub fn window_percentage(tokens: u64, window: u64) -> f64 {
    if window == 0 {
        return if tokens > 0 { 100.0 } else { 0.0 };
    }
    let raw = tokens as f64 / window as f64 * 100.0;
    let rounded = round_to_cents(raw);
    if raw > 0.0 && rounded < 0.01 {
        0.01
    } else {
        rounded
    }
}

/// Round to two decimals on the exact binary value, ties to even.
///
/// Multiplying by 100 first would turn 0.07499.. into an exact 7.5 tie, so
/// the rounding goes through the correctly rounded decimal expansion.
fn round_to_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
