//! Token cost estimation
//!
//! The splitter only needs `text -> count`. [`CharRatioEstimator`] is a cheap
//! heuristic tuned for mixed CJK/Latin markup; any closure or, with the
//! `tiktoken` feature, a real BPE tokenizer can stand in for it.

use crate::error::{Error, Result};
use crate::options::DEFAULT_TOKEN_RATIO;

/// Approximates the language-model token cost of a text
///
/// Implementations must be non-decreasing in text length.
pub trait TokenEstimator: Send + Sync {
    /// Estimated token count of `text`
    fn estimate(&self, text: &str) -> usize;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

/// `floor(chars / ratio)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharRatioEstimator {
    ratio: f64,
}

impl CharRatioEstimator {
    /// Estimator with a custom ratio; the ratio must be positive and finite
    pub fn new(ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::invalid_config(
                "token_ratio",
                format!("must be a positive number, got {ratio}"),
            ));
        }
        Ok(Self { ratio })
    }

    /// Characters per token
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_TOKEN_RATIO,
        }
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.ratio).floor() as usize
    }
}

/// Exact counts from the `cl100k_base` BPE
#[cfg(feature = "tiktoken")]
pub struct TiktokenEstimator {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenEstimator {
    /// Load the `cl100k_base` encoding
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl std::fmt::Debug for TiktokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TiktokenEstimator(cl100k_base)")
    }
}

#[cfg(feature = "tiktoken")]
impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
