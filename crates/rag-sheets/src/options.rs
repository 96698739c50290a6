//! Chunking options and budget validation

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Row budget used when neither `max_rows` nor `max_tokens` is given
pub const DEFAULT_MAX_ROWS: usize = 8;

/// Characters per estimated token
pub const DEFAULT_TOKEN_RATIO: f64 = 2.5;

/// Separator placed between chunks in joined output
pub const DEFAULT_SEPARATOR: &str = "!!!_CHUNK_BREAK_!!!";

/// Leading rows inspected when inferring header depth
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 5;

/// How a token budget with a minimum is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStrategy {
    /// Fill each chunk up to the maximum
    #[default]
    PreferMax,
    /// Close a chunk as soon as it reaches the minimum
    PreferMin,
}

impl fmt::Display for TokenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStrategy::PreferMax => f.write_str("prefer_max"),
            TokenStrategy::PreferMin => f.write_str("prefer_min"),
        }
    }
}

/// A validated chunk size policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBudget {
    /// At most this many data rows per chunk
    Rows(usize),
    /// At most `max` estimated tokens per chunk, assets included
    Tokens {
        max: usize,
        min: Option<usize>,
        strategy: TokenStrategy,
    },
}

impl ChunkBudget {
    /// Token limit, if this is a token budget
    pub fn token_limit(&self) -> Option<usize> {
        match self {
            ChunkBudget::Tokens { max, .. } => Some(*max),
            ChunkBudget::Rows(_) => None,
        }
    }

    /// Minimum token target, if any
    pub fn min_token_limit(&self) -> Option<usize> {
        match self {
            ChunkBudget::Tokens { min, .. } => *min,
            ChunkBudget::Rows(_) => None,
        }
    }

    /// Strategy of a token budget
    pub fn strategy(&self) -> Option<TokenStrategy> {
        match self {
            ChunkBudget::Tokens { strategy, .. } => Some(*strategy),
            ChunkBudget::Rows(_) => None,
        }
    }
}

impl Default for ChunkBudget {
    fn default() -> Self {
        ChunkBudget::Rows(DEFAULT_MAX_ROWS)
    }
}

/// Options controlling normalization and chunking
///
/// `max_rows` and `max_tokens` are mutually exclusive. When both are unset the
/// budget is [`DEFAULT_MAX_ROWS`] rows per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOptions {
    /// Row budget
    pub max_rows: Option<usize>,
    /// Token budget
    pub max_tokens: Option<usize>,
    /// Minimum tokens per chunk (token budget only)
    pub min_tokens: Option<usize>,
    /// Fill strategy when `min_tokens` is set
    pub strategy: TokenStrategy,
    /// Characters per token for the default estimator
    pub token_ratio: f64,
    /// Separator between joined chunks
    pub separator: String,
    /// Leading rows inspected for multi-level headers
    pub max_header_scan_rows: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_rows: None,
            max_tokens: None,
            min_tokens: None,
            strategy: TokenStrategy::default(),
            token_ratio: DEFAULT_TOKEN_RATIO,
            separator: DEFAULT_SEPARATOR.to_string(),
            max_header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
        }
    }
}

impl ChunkOptions {
    /// Options with a row budget
    pub fn rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
            ..Default::default()
        }
    }

    /// Options with a token budget
    pub fn tokens(max_tokens: usize) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }

    /// Set a minimum token target and strategy
    pub fn with_min_tokens(mut self, min_tokens: usize, strategy: TokenStrategy) -> Self {
        self.min_tokens = Some(min_tokens);
        self.strategy = strategy;
        self
    }

    /// Set the character/token ratio
    pub fn with_token_ratio(mut self, ratio: f64) -> Self {
        self.token_ratio = ratio;
        self
    }

    /// Set the chunk separator
    pub fn with_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.separator = separator.into();
        self
    }

    /// Validate every field and resolve the chunk budget
    pub fn budget(&self) -> Result<ChunkBudget> {
        if !self.token_ratio.is_finite() || self.token_ratio <= 0.0 {
            return Err(Error::invalid_config(
                "token_ratio",
                format!("must be a positive number, got {}", self.token_ratio),
            ));
        }
        if self.max_header_scan_rows == 0 {
            return Err(Error::invalid_config(
                "max_header_scan_rows",
                "must be at least 1",
            ));
        }

        match (self.max_rows, self.max_tokens) {
            (Some(_), Some(_)) => Err(Error::invalid_config(
                "max_rows",
                "cannot be combined with max_tokens",
            )),
            (Some(0), None) => Err(Error::invalid_config("max_rows", "must be positive")),
            (Some(rows), None) => {
                if self.min_tokens.is_some() {
                    return Err(Error::invalid_config(
                        "min_tokens",
                        "requires a token budget (max_tokens)",
                    ));
                }
                Ok(ChunkBudget::Rows(rows))
            }
            (None, Some(0)) => Err(Error::invalid_config("max_tokens", "must be positive")),
            (None, Some(max)) => {
                match self.min_tokens {
                    Some(0) => {
                        return Err(Error::invalid_config("min_tokens", "must be positive"));
                    }
                    Some(min) if min >= max => {
                        return Err(Error::invalid_config(
                            "min_tokens",
                            format!("must be less than max_tokens ({min} >= {max})"),
                        ));
                    }
                    _ => {}
                }
                Ok(ChunkBudget::Tokens {
                    max,
                    min: self.min_tokens,
                    strategy: self.strategy,
                })
            }
            (None, None) => {
                if self.min_tokens.is_some() {
                    return Err(Error::invalid_config(
                        "min_tokens",
                        "requires a token budget (max_tokens)",
                    ));
                }
                Ok(ChunkBudget::default())
            }
        }
    }
}
