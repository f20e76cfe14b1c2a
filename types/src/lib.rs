use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Date period ──────────────────────────────────────────────────────────

/// Qualifier on a date value: approximation or range semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    /// Exact date, no qualifier found
    #[default]
    None,
    /// ABT
    About,
    /// BEF
    Before,
    /// AFT
    After,
    /// BET … AND …
    BetweenAnd,
    /// CAL
    Calculated,
    /// EST
    Estimated,
}

impl Period {
    /// The canonical GEDCOM keyword for this period, `None` for exact dates.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::About => Some("ABT"),
            Self::Before => Some("BEF"),
            Self::After => Some("AFT"),
            Self::BetweenAnd => Some("BET"),
            Self::Calculated => Some("CAL"),
            Self::Estimated => Some("EST"),
        }
    }

    /// Label used for statistics keys; identical to the serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::About => "About",
            Self::Before => "Before",
            Self::After => "After",
            Self::BetweenAnd => "BetweenAnd",
            Self::Calculated => "Calculated",
            Self::Estimated => "Estimated",
        }
    }
}

// ── Date value attached to a DATE node ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    /// Date text exactly as it appeared in the file
    pub raw: String,
    pub period: Period,
    /// What is left for the numeric date parser
    pub residual: String,
}

// ── Record tree ──────────────────────────────────────────────────────────

/// One line of the file placed in the reconstructed hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordNode {
    /// 1-based physical line number
    pub line: usize,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xref: Option<String>,
    /// May be empty for untagged continuation lines
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RecordNode>,
}

impl RecordNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(RecordNode::subtree_len).sum::<usize>()
    }

    /// Depth-first, pre-order walk over this subtree.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RecordNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────────

/// A non-fatal problem found while building a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based physical line number
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiagnosticKind {
    /// Line could not be split into level/xref/tag/value; skipped
    MalformedLine { message: String },
    /// Level below zero; skipped
    NegativeLevel { level: i64 },
    /// Level above the supported range; skipped
    LevelOutOfRange { level: i64 },
    /// Depth increased by more than one; line kept as a child
    LevelJump { from: u32, to: u32, tag: String },
    /// CONT/CONC with no open parent to continue; skipped
    OrphanContinuation { tag: String },
}

// ── Whole document ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GedcomDocument {
    /// Level-0 records (and any roots at the base level of the file)
    pub records: Vec<RecordNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    pub line_count: usize,
}

// ── Per-file statistics ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSummary {
    pub file: String,
    pub line_count: usize,
    pub node_count: usize,
    /// Root record tag → count, e.g. "INDI" → 120
    pub record_counts: BTreeMap<String, usize>,
    pub date_count: usize,
    /// Period label → number of DATE values carrying it
    pub period_counts: BTreeMap<String, usize>,
    pub diagnostic_count: usize,
}

impl FileSummary {
    pub fn from_document(file: &str, doc: &GedcomDocument) -> Self {
        let mut summary = FileSummary {
            file: file.to_string(),
            line_count: doc.line_count,
            diagnostic_count: doc.diagnostics.len(),
            ..Default::default()
        };

        for record in &doc.records {
            *summary.record_counts.entry(record.tag.clone()).or_insert(0) += 1;
            summary.node_count += record.subtree_len();
            record.walk(&mut |node| {
                if let Some(date) = &node.date {
                    summary.date_count += 1;
                    *summary
                        .period_counts
                        .entry(date.period.as_str().to_string())
                        .or_insert(0) += 1;
                }
            });
        }

        summary
    }
}
