//! Record tree construction from a flat stream of GEDCOM lines.
//!
//! The level stack decides which open nodes close before each new line; the
//! builder keeps the matching partially built nodes in a parallel stack and
//! attaches each closed node to the one beneath it.

use gedcom_types::{Diagnostic, DiagnosticKind, GedcomDocument, RecordNode};

use crate::extract::extract;
use crate::level_stack::{LevelError, LevelStack};
use crate::line::{parse_line, physical_lines, strip_bom};
use crate::period::PeriodTable;

const TAG_DATE: &str = "DATE";
const TAG_CONT: &str = "CONT";
const TAG_CONC: &str = "CONC";

fn is_continuation(tag: &str) -> bool {
    tag.eq_ignore_ascii_case(TAG_CONT) || tag.eq_ignore_ascii_case(TAG_CONC)
}

/// One parsing session. Reusable: `finish` hands back the document and
/// leaves the builder ready for the next file.
pub struct DocumentBuilder<'t> {
    table: &'t PeriodTable,
    stack: LevelStack,
    /// Parallel to the level stack's entries
    open: Vec<RecordNode>,
    roots: Vec<RecordNode>,
    diagnostics: Vec<Diagnostic>,
    line_count: usize,
}

impl<'t> DocumentBuilder<'t> {
    pub fn new(table: &'t PeriodTable) -> Self {
        DocumentBuilder {
            table,
            stack: LevelStack::new(),
            open: Vec::new(),
            roots: Vec::new(),
            diagnostics: Vec::new(),
            line_count: 0,
        }
    }

    /// Build a whole file's worth of text.
    pub fn build(&mut self, content: &str) -> GedcomDocument {
        for (i, raw) in physical_lines(strip_bom(content)).enumerate() {
            self.push_line(i + 1, raw);
        }
        self.finish()
    }

    /// Feed one physical line. Bad lines are recorded and skipped.
    pub fn push_line(&mut self, line_no: usize, raw: &str) {
        self.line_count = self.line_count.max(line_no);
        if raw.trim().is_empty() {
            return;
        }

        let line = match parse_line(raw) {
            Ok(l) => l,
            Err(e) => {
                self.diagnose(
                    line_no,
                    DiagnosticKind::MalformedLine {
                        message: e.to_string(),
                    },
                );
                return;
            }
        };

        let observation = match self.stack.observe(line.level, line.tag) {
            Ok(o) => o,
            Err(e) => {
                let kind = match e {
                    LevelError::NegativeLevel(level) => DiagnosticKind::NegativeLevel { level },
                    LevelError::LevelOutOfRange(level) => {
                        DiagnosticKind::LevelOutOfRange { level }
                    }
                    LevelError::Flushed => DiagnosticKind::MalformedLine {
                        message: e.to_string(),
                    },
                };
                self.diagnose(line_no, kind);
                return;
            }
        };

        for _ in &observation.closed {
            self.close_top();
        }

        if let Some(jump) = observation.jump {
            self.diagnose(
                line_no,
                DiagnosticKind::LevelJump {
                    from: jump.from,
                    to: jump.to,
                    tag: jump.tag,
                },
            );
        }

        if is_continuation(line.tag) {
            let text = line.value.unwrap_or("");
            match self.open.last_mut() {
                Some(parent) => {
                    let value = parent.value.get_or_insert_with(String::new);
                    if line.tag.eq_ignore_ascii_case(TAG_CONT) {
                        value.push('\n');
                    }
                    value.push_str(text);
                }
                None => self.diagnose(
                    line_no,
                    DiagnosticKind::OrphanContinuation {
                        tag: line.tag.to_string(),
                    },
                ),
            }
        }

        // Continuations still occupy a stack slot so deeper lines nest and
        // close correctly; they are dropped when closed.
        self.open.push(RecordNode {
            line: line_no,
            level: observation.opened.level,
            xref: line.xref.map(str::to_string),
            tag: observation.opened.name,
            value: line.value.map(str::to_string),
            date: None,
            children: Vec::new(),
        });
        debug_assert_eq!(self.stack.depth(), self.open.len());
    }

    /// Close everything still open and return the document.
    pub fn finish(&mut self) -> GedcomDocument {
        for _ in self.stack.flush() {
            self.close_top();
        }
        self.stack.reset();

        let doc = GedcomDocument {
            records: std::mem::take(&mut self.roots),
            diagnostics: std::mem::take(&mut self.diagnostics),
            line_count: self.line_count,
        };
        self.line_count = 0;
        doc
    }

    fn close_top(&mut self) {
        let Some(mut node) = self.open.pop() else {
            return;
        };

        if is_continuation(&node.tag) {
            // Anything nested under a continuation moves up to its parent
            let children = std::mem::take(&mut node.children);
            match self.open.last_mut() {
                Some(parent) => parent.children.extend(children),
                None => self.roots.extend(children),
            }
            return;
        }

        if node.tag.eq_ignore_ascii_case(TAG_DATE)
            && let Some(value) = &node.value
        {
            node.date = Some(extract(value, self.table).into_date_value(value));
        }

        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn diagnose(&mut self, line: usize, kind: DiagnosticKind) {
        log::debug!("line {line}: {kind:?}");
        self.diagnostics.push(Diagnostic { line, kind });
    }
}

/// Build a document with a fresh single-use session.
pub fn build_document(content: &str, table: &PeriodTable) -> GedcomDocument {
    DocumentBuilder::new(table).build(content)
}
