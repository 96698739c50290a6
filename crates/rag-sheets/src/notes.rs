//! Footer notes: detection, keying and reference matching
//!
//! Tables often end with annotation rows (`注1：...`, `* ...`, a merged row of
//! remarks). Those rows are not data. They are lifted out of the table and
//! attached to chunks: notes referenced by the header travel with every
//! chunk, the rest only with chunks whose rows mention their key.

use std::collections::BTreeSet;

use lazy_regex::{regex, regex_captures};
use serde::Serialize;

use crate::grid::SheetGrid;
use crate::merge::MergedRegionMap;

/// Prefixes that mark a narrow row as a note
pub const NOTE_MARKERS: &[&str] = &[
    "注", "备注", "说明", "注意", "*", "※", "●", "◆", "△", "▲", "[注", "（注", "(注",
];

const SYMBOL_KEYS: &[char] = &['*', '※', '●', '◆', '△', '▲'];

/// Where a note is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteScope {
    /// Referenced by the header; attached to every chunk
    Header,
    /// Attached only to chunks that reference it
    Conditional,
}

/// One annotation lifted from the bottom of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableNote {
    /// Reference keys, e.g. `注1`, `备注`, `*`
    pub keys: Vec<String>,
    /// Full note text
    pub text: String,
    /// Attachment scope
    pub scope: NoteScope,
}

impl TableNote {
    /// Whether any of this note's keys is in `refs`
    pub fn is_referenced_by(&self, refs: &BTreeSet<String>) -> bool {
        self.keys.iter().any(|k| refs.contains(k))
    }
}

/// Note rows found at the bottom of a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FooterNotes {
    /// 0-based row indices of note rows, ascending
    pub rows: Vec<usize>,
    /// Note row contents, top to bottom
    pub texts: Vec<String>,
}

/// Finds and parses footer notes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteExtractor;

impl NoteExtractor {
    /// Scan upward from the last row, stopping at the first data row
    ///
    /// Blank rows are passed over. The header rows are never scanned.
    pub fn detect(grid: &SheetGrid, spans: &MergedRegionMap, header_rows: usize) -> FooterNotes {
        let mut found = FooterNotes::default();

        for row in (header_rows..grid.rows()).rev() {
            match classify_row(grid, spans, row) {
                None => continue,
                Some((content, true)) => {
                    found.rows.push(row);
                    found.texts.push(content);
                }
                Some((_, false)) => break,
            }
        }

        found.rows.reverse();
        found.texts.reverse();
        found
    }

    /// Key each note and decide its scope from the header labels
    ///
    /// A row holding several bracketed notes becomes several notes.
    pub fn parse(texts: &[String], header_labels: &[String]) -> Vec<TableNote> {
        let header_refs = extract_references(&header_labels.join(" "));

        texts
            .iter()
            .flat_map(|text| split_notes(text))
            .map(|part| {
                let keys = note_keys(part);
                let scope = if keys.iter().any(|k| header_refs.contains(k)) {
                    NoteScope::Header
                } else {
                    NoteScope::Conditional
                };
                TableNote {
                    keys,
                    text: part.to_string(),
                    scope,
                }
            })
            .collect()
    }
}

/// `Some((content, is_note))` for a non-blank row
fn classify_row(grid: &SheetGrid, spans: &MergedRegionMap, row: usize) -> Option<(String, bool)> {
    let cols = grid.cols();
    let mut filled = 0;
    let mut content = "";

    for col in 0..cols {
        match spans.get(row, col) {
            Some(info) if info.is_origin() && info.col_span() > cols / 2 => {
                let wide = info.value().trim();
                return (!wide.is_empty()).then(|| (wide.to_string(), true));
            }
            Some(info) if info.skip() => continue,
            _ => {}
        }

        let text = grid.resolved(spans, row, col);
        if !text.trim().is_empty() {
            filled += 1;
            if content.is_empty() {
                content = text;
            }
        }
    }

    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let is_note = filled <= 2 && NOTE_MARKERS.iter().any(|m| content.starts_with(m));
    Some((content.to_string(), is_note))
}

/// Split a note row before each bracketed note marker
pub fn split_notes(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = regex!(r"\[注[\d、,，]+\]|\[备注\d*\]|\[说明\d*\]")
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    starts.push(text.len());

    let mut parts = Vec::with_capacity(starts.len());
    let mut begin = 0;
    for end in starts {
        let part = text[begin..end].trim();
        if !part.is_empty() {
            parts.push(part);
        }
        begin = end;
    }
    parts
}

/// Keys a single note answers to, derived from its leading marker
///
/// ```
/// use rag_sheets::notes::note_keys;
///
/// assert_eq!(note_keys("[注1、2] 含税"), vec!["注1", "注2"]);
/// assert_eq!(note_keys("(注3) 预估"), vec!["注3"]);
/// assert_eq!(note_keys("注意：单位万元"), vec!["注意"]);
/// assert_eq!(note_keys("* 未审计"), vec!["*"]);
/// ```
pub fn note_keys(note: &str) -> Vec<String> {
    let note = note.trim();

    if let Some((_, prefix, nums)) = regex_captures!(r"^\[(注)([\d、,，]+)\]", note) {
        return split_numbers(nums)
            .map(|num| format!("{prefix}{num}"))
            .collect();
    }
    if let Some((_, key)) = regex_captures!(r"^\[([注备说][注明意]?\d*)\]", note) {
        return vec![key.to_string()];
    }
    if let Some((_, key)) = regex_captures!(r"^[（(]([注备说][注明意]?\d*)[）)]", note) {
        return vec![key.to_string()];
    }
    if let Some((_, key)) = regex_captures!(r"^(注意\d*|备注\d*|说明\d*|注\d*)", note) {
        return vec![key.to_string()];
    }
    match note.chars().next() {
        Some(c) if SYMBOL_KEYS.contains(&c) => vec![c.to_string()],
        Some(_) => vec![note.chars().take(10).collect()],
        None => Vec::new(),
    }
}

/// Note keys referenced anywhere in `text`
///
/// ```
/// use rag_sheets::notes::extract_references;
///
/// let refs = extract_references("收入[注1,2] 成本 注3：x");
/// assert!(refs.contains("注1") && refs.contains("注2") && refs.contains("注3"));
/// ```
pub fn extract_references(text: &str) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();

    for caps in regex!(r"\[(注)([\d、,，]+)\]").captures_iter(text) {
        for num in split_numbers(&caps[2]) {
            refs.insert(format!("{}{}", &caps[1], num));
        }
    }
    let bracketed = regex!(r"\[(注\s*\d*|备注\s*\d*|说明\s*\d*|注意\s*\d*)\s*\]");
    for caps in bracketed.captures_iter(text) {
        refs.insert(caps[1].chars().filter(|c| *c != ' ').collect());
    }
    for caps in regex!(r"[^\[](注\d+)(?:[：:）)]|$|\s)").captures_iter(text) {
        refs.insert(caps[1].to_string());
    }
    for symbol in ['*', '※'] {
        if text.contains(symbol) {
            refs.insert(symbol.to_string());
        }
    }

    refs
}

/// Note texts a chunk carries: every header note, then the conditional notes
/// referenced by `text`, each text once
pub fn select_notes<'a>(notes: &'a [TableNote], text: &str) -> Vec<&'a str> {
    let mut selected: Vec<&str> = Vec::new();

    for note in notes.iter().filter(|n| n.scope == NoteScope::Header) {
        if !selected.contains(&note.text.as_str()) {
            selected.push(&note.text);
        }
    }

    if notes.iter().any(|n| n.scope == NoteScope::Conditional) {
        let refs = extract_references(text);
        for note in notes.iter().filter(|n| n.scope == NoteScope::Conditional) {
            if note.is_referenced_by(&refs) && !selected.contains(&note.text.as_str()) {
                selected.push(&note.text);
            }
        }
    }

    selected
}

fn split_numbers(nums: &str) -> impl Iterator<Item = &str> {
    nums.split(['、', ',', '，'])
        .map(str::trim)
        .filter(|n| !n.is_empty())
}
