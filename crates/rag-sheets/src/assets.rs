//! Shared assets: the context every chunk of a table carries

use chrono::NaiveDateTime;

use crate::notes::{NoteScope, TableNote};
use crate::table::{DataRow, NormalizedTable};

/// Most keywords a caption lists
pub const CAPTION_KEYWORD_LIMIT: usize = 5;

/// Per-conversion values threaded through the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionContext {
    /// Source file name shown in the banner
    pub source_name: String,
    /// Generation time shown in the banner; `None` keeps output reproducible
    pub generated_at: Option<NaiveDateTime>,
    /// Retrieval keywords for the caption
    pub keywords: Vec<String>,
}

impl ConversionContext {
    /// Context for a named source
    pub fn new<S: Into<String>>(source_name: S) -> Self {
        Self {
            source_name: source_name.into(),
            ..Default::default()
        }
    }

    /// Set the caption keywords
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set the banner timestamp
    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Stamp the banner with the current local time
    pub fn stamped_now(self) -> Self {
        self.with_timestamp(chrono::Local::now().naive_local())
    }
}

/// Where a table came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBanner {
    pub source: String,
    pub sheet: String,
    pub generated_at: Option<NaiveDateTime>,
}

impl ContextBanner {
    /// Banner line content
    pub fn text(&self) -> String {
        let mut text = format!(
            "【文档上下文】来源：{} | 工作表：{} | 数据类型：表格数据",
            self.source, self.sheet
        );
        if let Some(ts) = self.generated_at {
            text.push_str(&format!(" | 生成时间：{}", ts.format("%Y-%m-%d %H:%M:%S")));
        }
        text
    }
}

/// Retrieval keywords shown above the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub keywords: Vec<String>,
}

impl Caption {
    /// Caption from raw keywords: trimmed, empties dropped, at most
    /// [`CAPTION_KEYWORD_LIMIT`]; `None` when nothing is left
    pub fn from_keywords<S: AsRef<str>>(keywords: &[S]) -> Option<Self> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .take(CAPTION_KEYWORD_LIMIT)
            .map(str::to_string)
            .collect();
        (!keywords.is_empty()).then_some(Self { keywords })
    }

    /// Caption line content
    pub fn text(&self) -> String {
        format!("关键检索词：{}", self.keywords.join("，"))
    }
}

/// Everything a chunk repeats from its table
///
/// Built once per table and cloned into each chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedAssets {
    pub banner: ContextBanner,
    pub caption: Option<Caption>,
    /// Flattened column labels
    pub columns: Vec<String>,
    /// Texts of notes referenced by the header
    pub header_notes: Vec<String>,
    /// Every note of the table, header and conditional
    pub notes: Vec<TableNote>,
}

impl SharedAssets {
    /// Labels joined with a space
    pub fn header_text(&self) -> String {
        self.columns.join(" ")
    }

    /// Whether any conditional note could be attached to a chunk
    pub fn has_conditional_notes(&self) -> bool {
        self.notes.iter().any(|n| n.scope == NoteScope::Conditional)
    }
}

/// Splits a normalized table into shared assets and data rows
#[derive(Debug, Clone, Copy)]
pub struct AssetExtractor<'a> {
    context: &'a ConversionContext,
}

impl<'a> AssetExtractor<'a> {
    pub fn new(context: &'a ConversionContext) -> Self {
        Self { context }
    }

    /// Snapshot the table's assets; the rows are borrowed as-is
    pub fn extract<'t>(&self, table: &'t NormalizedTable) -> (SharedAssets, &'t [DataRow]) {
        let mut header_notes: Vec<String> = Vec::new();
        for note in table.header_notes() {
            if !header_notes.contains(&note.text) {
                header_notes.push(note.text.clone());
            }
        }

        let assets = SharedAssets {
            banner: ContextBanner {
                source: self.context.source_name.clone(),
                sheet: table.sheet_name.clone(),
                generated_at: self.context.generated_at,
            },
            caption: Caption::from_keywords(&self.context.keywords),
            columns: table.columns.clone(),
            header_notes,
            notes: table.notes.clone(),
        };
        (assets, &table.rows)
    }
}
