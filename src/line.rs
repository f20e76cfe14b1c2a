use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// ── Line grammar ───────────────────────────────────────────────────
//
// Real data examples:
//   0 HEAD
//   0 @I1@ INDI
//   1 NAME John /Smith/
//   2 DATE ABT 1900
//   2 CONT second line of a note
//   1 NOTE  two spaces: the value keeps its leading space
//
// LEVEL [XREF] [TAG] [VALUE], each part delimited by a single space. VALUE
// is everything after the space that follows the tag, and only exists when
// a tag does.

static RE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<level>-?\d+)(?: (?P<xref>@[^@\s]+@))?(?: (?P<tag>\S+)(?: (?P<value>.*))?)? ?$",
    )
    .unwrap()
});

static RE_LEVEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-?\d").unwrap());

/// One physical line, split but not yet placed in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GedcomLine<'a> {
    /// Signed so the level stack can reject negative depths itself
    pub level: i64,
    pub xref: Option<&'a str>,
    /// Empty for untagged continuation lines
    pub tag: &'a str,
    pub value: Option<&'a str>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line does not start with a level number")]
    MissingLevel,
    #[error("level {0:?} is not a valid integer")]
    InvalidLevel(String),
    #[error("expected single-space delimited LEVEL [XREF] [TAG] [VALUE]")]
    BadDelimiter,
}

pub fn parse_line(line: &str) -> Result<GedcomLine<'_>, LineError> {
    let Some(caps) = RE_LINE.captures(line) else {
        return Err(if RE_LEVEL.is_match(line) {
            LineError::BadDelimiter
        } else {
            LineError::MissingLevel
        });
    };
    let level_str = caps.name("level").ok_or(LineError::MissingLevel)?.as_str();
    let level = level_str
        .parse::<i64>()
        .map_err(|_| LineError::InvalidLevel(level_str.to_string()))?;

    Ok(GedcomLine {
        level,
        xref: caps.name("xref").map(|m| m.as_str()),
        tag: caps.name("tag").map(|m| m.as_str()).unwrap_or(""),
        value: caps.name("value").map(|m| m.as_str()),
    })
}

/// Strip a UTF-8 byte order mark, if the file starts with one.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Split file content into physical lines.
///
/// GEDCOM allows CR, LF, CR LF or LF CR as the terminator; each pair counts
/// as one terminator, so line numbers match what an editor shows.
pub fn physical_lines(content: &str) -> PhysicalLines<'_> {
    PhysicalLines { rest: content }
}

pub struct PhysicalLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for PhysicalLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(end) = self.rest.find(['\r', '\n']) else {
            return Some(std::mem::take(&mut self.rest));
        };

        let bytes = self.rest.as_bytes();
        let mut next = end + 1;
        if let Some(&pair) = bytes.get(next)
            && (pair == b'\r' || pair == b'\n')
            && pair != bytes[end]
        {
            next += 1;
        }

        let line = &self.rest[..end];
        self.rest = &self.rest[next..];
        Some(line)
    }
}
