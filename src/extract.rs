//! Date-period extraction: strip the qualifier keyword off a raw date.
//!
//! Only the qualifier is handled here. Day/month/year parsing, calendars and
//! the two halves of a between-range belong to the date parser downstream.

use gedcom_types::{DateValue, Period};
use serde::Serialize;

use crate::period::{MatchPosition, PeriodTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub residual_text: String,
    pub period: Period,
}

impl ExtractionResult {
    pub fn into_date_value(self, raw: &str) -> DateValue {
        DateValue {
            raw: raw.to_string(),
            period: self.period,
            residual: self.residual_text,
        }
    }
}

/// Find the first period keyword in `raw` and remove it.
///
/// On a match, one whitespace char separating the keyword from the rest of
/// the date is removed too: after a prefix, before a suffix, and for a
/// keyword in the middle, after it when text follows (else before it).
/// Without a match `raw` comes back unchanged, whitespace included.
pub fn extract(raw: &str, table: &PeriodTable) -> ExtractionResult {
    let Some(m) = table.find_first_match(raw) else {
        return ExtractionResult {
            residual_text: raw.to_string(),
            period: Period::None,
        };
    };

    let (mut start, mut end) = (m.start, m.end);
    let before = raw[..start].chars().next_back().filter(|c| c.is_whitespace());
    let after = raw[end..].chars().next().filter(|c| c.is_whitespace());

    match m.rule.position {
        MatchPosition::PrefixOfText => {
            if let Some(c) = after {
                end += c.len_utf8();
            }
        }
        MatchPosition::SuffixOfText => {
            if let Some(c) = before {
                start -= c.len_utf8();
            }
        }
        MatchPosition::AnywhereInText => match (before, after) {
            (_, Some(c)) if end + c.len_utf8() < raw.len() => end += c.len_utf8(),
            (Some(c), _) => start -= c.len_utf8(),
            (None, Some(c)) => end += c.len_utf8(),
            (None, None) => {}
        },
    }

    let mut residual_text = String::with_capacity(raw.len() - (end - start));
    residual_text.push_str(&raw[..start]);
    residual_text.push_str(&raw[end..]);

    log::trace!(
        "{:?}: {} keyword {:?} -> {:?}",
        raw,
        m.rule.position.as_str(),
        m.rule.match_text,
        m.rule.target
    );

    ExtractionResult {
        residual_text,
        period: m.rule.target,
    }
}
