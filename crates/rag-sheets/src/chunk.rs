//! Greedy, order-preserving chunking of data rows
//!
//! The budget is checked before a row is appended, never after: a chunk only
//! overshoots a token budget when it holds a single row that is too large on
//! its own. Rows are never split or dropped.

use std::ops::Range;

use log::{info, warn};
use serde::Serialize;

use crate::assets::SharedAssets;
use crate::notes::select_notes;
use crate::options::{ChunkBudget, TokenStrategy};
use crate::render::Renderer;
use crate::table::DataRow;
use crate::token::TokenEstimator;

/// Rows of one chunk and its estimated total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    /// Indices into the data rows
    pub rows: Range<usize>,
    /// Asset overhead plus row tokens
    pub tokens: usize,
}

/// Partition rows, given their token costs, under a budget
///
/// `overhead` returns the asset cost of a chunk made of the given rows. It is
/// constant for tables without conditional notes.
///
/// ```
/// use rag_sheets::chunk::plan_chunks;
/// use rag_sheets::ChunkBudget;
/// use rag_sheets::TokenStrategy;
///
/// let budget = ChunkBudget::Tokens { max: 512, min: None, strategy: TokenStrategy::PreferMax };
/// let plan = plan_chunks(&[50, 60, 200, 80, 300, 40, 50], &budget, |_| 150);
/// let sizes: Vec<usize> = plan.iter().map(|c| c.tokens).collect();
/// assert_eq!(sizes, vec![460, 230, 490, 200]);
/// ```
pub fn plan_chunks<F>(
    row_tokens: &[usize],
    budget: &ChunkBudget,
    mut overhead: F,
) -> Vec<PlannedChunk>
where
    F: FnMut(Range<usize>) -> usize,
{
    let mut plan = Vec::new();
    let mut start = 0;
    let mut current = 0;

    for (i, &tokens) in row_tokens.iter().enumerate() {
        if i > start {
            let split = match *budget {
                ChunkBudget::Rows(max_rows) => i - start >= max_rows,
                ChunkBudget::Tokens { max, min, strategy } => {
                    if overhead(start..i + 1) + current + tokens > max {
                        true
                    } else {
                        match (strategy, min) {
                            (TokenStrategy::PreferMin, Some(min)) => {
                                overhead(start..i) + current >= min
                            }
                            _ => false,
                        }
                    }
                }
            };

            if split {
                plan.push(PlannedChunk {
                    rows: start..i,
                    tokens: overhead(start..i) + current,
                });
                start = i;
                current = 0;
            }
        }
        current += tokens;
    }

    if start < row_tokens.len() {
        plan.push(PlannedChunk {
            rows: start..row_tokens.len(),
            tokens: overhead(start..row_tokens.len()) + current,
        });
    }

    plan
}

/// A self-contained slice of a table
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position in the chunk sequence
    pub index: usize,
    /// Owned copy of the table's shared assets
    pub assets: SharedAssets,
    /// Note texts attached to this chunk
    pub notes: Vec<String>,
    /// Data rows, in table order
    pub rows: Vec<DataRow>,
    /// Estimated tokens: asset overhead plus row costs
    pub tokens: usize,
}

/// A chunk over the token budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkWarning {
    /// Index of the offending chunk
    pub chunk_index: usize,
    /// Estimated tokens of the chunk
    pub actual_tokens: usize,
    /// The `max_tokens` budget it broke
    pub limit: usize,
    /// Tokens over the limit
    pub overflow: usize,
    /// Data rows in the chunk
    pub row_count: usize,
    /// Why the chunk could not be split further
    pub reason: String,
}

/// Summary of one chunking run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStats {
    /// Number of chunks produced
    pub total_chunks: usize,
    /// Chunks over the token limit
    pub oversized_chunks: usize,
    /// Estimated tokens per chunk, in chunk order
    pub token_counts: Vec<usize>,
    /// Largest chunk, 0 without chunks
    pub max_token_count: usize,
    /// Smallest chunk, 0 without chunks
    pub min_token_count: usize,
    /// Mean chunk size, 0.0 without chunks
    pub avg_token_count: f64,
    /// Tokens of a chunk frame carrying only the header notes
    pub fixed_overhead: usize,
    /// `max_tokens` of a token budget
    pub token_limit: Option<usize>,
    /// `min_tokens` of a token budget
    pub min_token_limit: Option<usize>,
    /// Fill strategy of a token budget
    pub strategy: Option<TokenStrategy>,
}

/// Chunks of one table with their diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub chunks: Vec<Chunk>,
    pub warnings: Vec<ChunkWarning>,
    pub stats: ChunkStats,
}

/// Splits data rows into chunks, measuring cost in rendered text
pub struct ChunkSplitter<'a> {
    budget: ChunkBudget,
    estimator: &'a dyn TokenEstimator,
    renderer: &'a dyn Renderer,
}

impl<'a> ChunkSplitter<'a> {
    /// Splitter measuring `renderer` output with `estimator` against `budget`
    pub fn new(
        budget: ChunkBudget,
        estimator: &'a dyn TokenEstimator,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Self {
            budget,
            estimator,
            renderer,
        }
    }

    /// Chunk `rows`, attaching a copy of `assets` to each chunk
    pub fn split(&self, rows: &[DataRow], assets: &SharedAssets) -> ChunkResult {
        let header_notes: Vec<&str> = assets.header_notes.iter().map(String::as_str).collect();
        let fixed_overhead = self
            .estimator
            .estimate(&self.renderer.chunk_frame(assets, &header_notes).text());

        let row_tokens: Vec<usize> = rows
            .iter()
            .map(|row| self.estimator.estimate(&self.renderer.render_row(row)))
            .collect();

        let conditional = assets.has_conditional_notes();
        let row_texts: Vec<String> = if conditional {
            rows.iter().map(DataRow::text).collect()
        } else {
            Vec::new()
        };
        let header_text = assets.header_text();

        let notes_for = |range: Range<usize>| {
            if !conditional {
                return header_notes.clone();
            }
            let mut text = row_texts[range].join(" ");
            text.push(' ');
            text.push_str(&header_text);
            select_notes(&assets.notes, &text)
        };

        let plan = plan_chunks(&row_tokens, &self.budget, |range| {
            let notes = notes_for(range);
            if notes.len() == header_notes.len() {
                fixed_overhead
            } else {
                self.estimator
                    .estimate(&self.renderer.chunk_frame(assets, &notes).text())
            }
        });

        let chunks: Vec<Chunk> = plan
            .iter()
            .enumerate()
            .map(|(index, planned)| Chunk {
                index,
                assets: assets.clone(),
                notes: notes_for(planned.rows.clone())
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                rows: rows[planned.rows.clone()].to_vec(),
                tokens: planned.tokens,
            })
            .collect();

        let warnings = self.warnings(&chunks);
        for warning in &warnings {
            warn!(
                "Sheet '{}' chunk {}: {} ({} tokens, limit {}, over by {})",
                assets.banner.sheet,
                warning.chunk_index,
                warning.reason,
                warning.actual_tokens,
                warning.limit,
                warning.overflow
            );
        }

        let stats = self.stats(&chunks, warnings.len(), fixed_overhead);
        info!(
            "Sheet '{}': {} rows -> {} chunks ({} oversized)",
            assets.banner.sheet,
            rows.len(),
            stats.total_chunks,
            stats.oversized_chunks
        );

        ChunkResult {
            chunks,
            warnings,
            stats,
        }
    }

    fn warnings(&self, chunks: &[Chunk]) -> Vec<ChunkWarning> {
        let Some(limit) = self.budget.token_limit() else {
            return Vec::new();
        };

        chunks
            .iter()
            .filter(|chunk| chunk.tokens > limit)
            .map(|chunk| ChunkWarning {
                chunk_index: chunk.index,
                actual_tokens: chunk.tokens,
                limit,
                overflow: chunk.tokens - limit,
                row_count: chunk.rows.len(),
                reason: if chunk.rows.len() == 1 {
                    "single row plus shared assets exceeds the token limit".to_string()
                } else {
                    "accumulated rows exceed the token limit".to_string()
                },
            })
            .collect()
    }

    fn stats(&self, chunks: &[Chunk], oversized: usize, fixed_overhead: usize) -> ChunkStats {
        let token_counts: Vec<usize> = chunks.iter().map(|c| c.tokens).collect();
        let total: usize = token_counts.iter().sum();

        ChunkStats {
            total_chunks: chunks.len(),
            oversized_chunks: oversized,
            max_token_count: token_counts.iter().copied().max().unwrap_or(0),
            min_token_count: token_counts.iter().copied().min().unwrap_or(0),
            avg_token_count: if token_counts.is_empty() {
                0.0
            } else {
                total as f64 / token_counts.len() as f64
            },
            token_counts,
            fixed_overhead,
            token_limit: self.budget.token_limit(),
            min_token_limit: self.budget.min_token_limit(),
            strategy: self.budget.strategy(),
        }
    }
}
