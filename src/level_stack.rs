//! Level tracking for GEDCOM's depth-prefixed lines.
//!
//! Every line states its own nesting depth instead of closing its parent
//! explicitly. The stack keeps the chain of currently open tags and, for each
//! new line, reports which of them must close before the new one opens.

use thiserror::Error;

// ── Entries and observations ─────────────────────────────────────────

/// One open node in the hierarchy being reconstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLevelEntry {
    /// Tag identifier; empty for untagged continuation lines
    pub name: String,
    pub level: u32,
}

/// A depth increase of more than one level over the enclosing entry.
///
/// Accepted structurally (the line becomes a child of `from`), reported so
/// callers can decide how strict to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelJump {
    pub from: u32,
    pub to: u32,
    pub tag: String,
}

/// What happened when a line was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Entries closed by this line, most recently opened first
    pub closed: Vec<TagLevelEntry>,
    pub opened: TagLevelEntry,
    pub jump: Option<LevelJump>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("negative level {0}")]
    NegativeLevel(i64),
    #[error("level {0} is out of range")]
    LevelOutOfRange(i64),
    #[error("level stack was flushed; reset it before observing new lines")]
    Flushed,
}

// ── Stack ────────────────────────────────────────────────────────────

/// Owned by exactly one parsing session.
#[derive(Debug, Default)]
pub struct LevelStack {
    entries: Vec<TagLevelEntry>,
    flushed: bool,
}

impl LevelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new line at `level` carrying `tag`.
    ///
    /// Pops every open entry whose level is greater than or equal to `level`,
    /// then pushes the new entry. On error the stack is left untouched.
    pub fn observe(&mut self, level: i64, tag: &str) -> Result<Observation, LevelError> {
        if self.flushed {
            return Err(LevelError::Flushed);
        }
        if level < 0 {
            return Err(LevelError::NegativeLevel(level));
        }
        let level = u32::try_from(level).map_err(|_| LevelError::LevelOutOfRange(level))?;

        let mut closed = Vec::new();
        while let Some(top) = self.entries.last() {
            if top.level < level {
                break;
            }
            if let Some(entry) = self.entries.pop() {
                closed.push(entry);
            }
        }

        let jump = match self.entries.last() {
            Some(parent) if level > parent.level.saturating_add(1) => {
                log::debug!(
                    "level jump {} -> {} at tag {:?}",
                    parent.level,
                    level,
                    tag
                );
                Some(LevelJump {
                    from: parent.level,
                    to: level,
                    tag: tag.to_string(),
                })
            }
            _ => None,
        };

        let opened = TagLevelEntry {
            name: tag.to_string(),
            level,
        };
        self.entries.push(opened.clone());

        Ok(Observation {
            closed,
            opened,
            jump,
        })
    }

    /// Close everything still open (end of input), most recent first.
    ///
    /// The stack then rejects `observe` until [`LevelStack::reset`].
    pub fn flush(&mut self) -> Vec<TagLevelEntry> {
        self.flushed = true;
        let mut closed = std::mem::take(&mut self.entries);
        closed.reverse();
        closed
    }

    /// Make the stack usable for a new session.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.flushed = false;
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn top(&self) -> Option<&TagLevelEntry> {
        self.entries.last()
    }
}
