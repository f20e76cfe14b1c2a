//! Keyword table mapping date qualifiers to periods.
//!
//! Rules are consulted strictly in table order and the first rule whose
//! keyword sits at its required position wins. Longer spellings therefore
//! come before their abbreviations ("BEFORE" before "BEF"), otherwise the
//! abbreviation would match and leave "ORE" behind.

use std::borrow::Cow;
use std::sync::LazyLock;

use gedcom_types::Period;
use thiserror::Error;

/// Where a rule's keyword must appear in the date text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPosition {
    PrefixOfText,
    SuffixOfText,
    AnywhereInText,
}

impl MatchPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrefixOfText => "prefix",
            Self::SuffixOfText => "suffix",
            Self::AnywhereInText => "anywhere",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRule {
    pub match_text: &'static str,
    pub position: MatchPosition,
    pub target: Period,
}

const fn prefix(match_text: &'static str, target: Period) -> PeriodRule {
    PeriodRule {
        match_text,
        position: MatchPosition::PrefixOfText,
        target,
    }
}

/// GEDCOM date-period vocabulary, in lookup order.
///
/// "BET" covers the whole between-range: the trailing "AND" stays in the
/// residual text for the date parser to split on.
pub const STANDARD_RULES: &[PeriodRule] = &[
    prefix("ABOUT", Period::About),
    prefix("ABT", Period::About),
    prefix("BEFORE", Period::Before),
    prefix("BEF", Period::Before),
    prefix("AFTER", Period::After),
    prefix("AFT", Period::After),
    prefix("BETWEEN", Period::BetweenAnd),
    prefix("BET", Period::BetweenAnd),
    prefix("CALCULATED", Period::Calculated),
    prefix("CAL", Period::Calculated),
    prefix("ESTIMATED", Period::Estimated),
    prefix("EST", Period::Estimated),
];

/// Keyword casing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseMatching {
    /// ASCII letters compare without regard to case
    #[default]
    Insensitive,
    Sensitive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("rule {index} has an empty keyword")]
    EmptyKeyword { index: usize },
}

/// A hit: the winning rule and the byte span of its keyword in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodMatch<'a> {
    pub rule: &'a PeriodRule,
    pub start: usize,
    pub end: usize,
}

/// Ordered, immutable rule set. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct PeriodTable {
    rules: Cow<'static, [PeriodRule]>,
    case: CaseMatching,
}

static STANDARD_TABLE: LazyLock<PeriodTable> = LazyLock::new(|| PeriodTable {
    rules: Cow::Borrowed(STANDARD_RULES),
    case: CaseMatching::Insensitive,
});

static STANDARD_TABLE_CASE_SENSITIVE: LazyLock<PeriodTable> = LazyLock::new(|| PeriodTable {
    rules: Cow::Borrowed(STANDARD_RULES),
    case: CaseMatching::Sensitive,
});

impl PeriodTable {
    pub fn new(rules: Vec<PeriodRule>, case: CaseMatching) -> Result<Self, TableError> {
        if let Some(index) = rules.iter().position(|r| r.match_text.is_empty()) {
            return Err(TableError::EmptyKeyword { index });
        }
        Ok(PeriodTable {
            rules: Cow::Owned(rules),
            case,
        })
    }

    /// The built-in table with case-insensitive matching.
    pub fn standard() -> &'static PeriodTable {
        &STANDARD_TABLE
    }

    /// The built-in rules under the given casing policy.
    pub fn standard_with(case: CaseMatching) -> &'static PeriodTable {
        match case {
            CaseMatching::Insensitive => Self::standard(),
            CaseMatching::Sensitive => &STANDARD_TABLE_CASE_SENSITIVE,
        }
    }

    pub fn rules(&self) -> &[PeriodRule] {
        &self.rules
    }

    pub fn case(&self) -> CaseMatching {
        self.case
    }

    /// First rule, in table order, whose keyword is found at its position.
    pub fn find_first_match(&self, text: &str) -> Option<PeriodMatch<'_>> {
        self.rules.iter().find_map(|rule| {
            self.locate(text, rule).map(|(start, end)| PeriodMatch { rule, start, end })
        })
    }

    fn locate(&self, text: &str, rule: &PeriodRule) -> Option<(usize, usize)> {
        let hay = text.as_bytes();
        let kw = rule.match_text.as_bytes();
        if kw.is_empty() || kw.len() > hay.len() {
            return None;
        }

        // Keyword bytes start and end on char boundaries, so any byte-wise
        // hit is also a valid str span.
        match rule.position {
            MatchPosition::PrefixOfText => self
                .bytes_eq(&hay[..kw.len()], kw)
                .then_some((0, kw.len())),
            MatchPosition::SuffixOfText => {
                let start = hay.len() - kw.len();
                self.bytes_eq(&hay[start..], kw).then_some((start, hay.len()))
            }
            MatchPosition::AnywhereInText => hay
                .windows(kw.len())
                .position(|window| self.bytes_eq(window, kw))
                .map(|start| (start, start + kw.len())),
        }
    }

    fn bytes_eq(&self, a: &[u8], b: &[u8]) -> bool {
        match self.case {
            CaseMatching::Insensitive => a.eq_ignore_ascii_case(b),
            CaseMatching::Sensitive => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rule(match_text: &'static str, position: MatchPosition, target: Period) -> PeriodRule {
        PeriodRule {
            match_text,
            position,
            target,
        }
    }

    #[rstest]
    #[case("ABT 1900", Period::About, 0, 3)]
    #[case("abt 1900", Period::About, 0, 3)]
    #[case("About 1900", Period::About, 0, 5)]
    #[case("BEF 1 JAN 1900", Period::Before, 0, 3)]
    #[case("BEFORE 1900", Period::Before, 0, 6)]
    #[case("AFT 1850", Period::After, 0, 3)]
    #[case("BET 1900 AND 1905", Period::BetweenAnd, 0, 3)]
    #[case("CAL 1777", Period::Calculated, 0, 3)]
    #[case("EST 1800", Period::Estimated, 0, 3)]
    fn test_standard_table_matches(
        #[case] text: &str,
        #[case] period: Period,
        #[case] start: usize,
        #[case] end: usize,
    ) {
        let m = PeriodTable::standard().find_first_match(text).unwrap();
        assert_eq!(m.rule.target, period);
        assert_eq!((m.start, m.end), (start, end));
    }

    #[rstest]
    #[case("1900")]
    #[case("")]
    #[case("12 MAR 1850")]
    #[case("FROM 1900 TO 1910")]
    fn test_standard_table_no_match(#[case] text: &str) {
        assert!(PeriodTable::standard().find_first_match(text).is_none());
    }

    #[test]
    fn test_standard_keywords_not_shadowed() {
        // A keyword must never be preceded by a shorter rule that is its prefix
        let rules = STANDARD_RULES;
        for (i, later) in rules.iter().enumerate() {
            assert!(!later.match_text.is_empty());
            for earlier in &rules[..i] {
                let shadowed = earlier.position == MatchPosition::PrefixOfText
                    && later.position == MatchPosition::PrefixOfText
                    && later.match_text.starts_with(earlier.match_text);
                assert!(
                    !shadowed,
                    "{} shadows {}",
                    earlier.match_text, later.match_text
                );
            }
        }
    }

    #[test]
    fn test_case_sensitive_policy() {
        let table = PeriodTable::standard_with(CaseMatching::Sensitive);
        assert!(table.find_first_match("abt 1900").is_none());
        assert!(table.find_first_match("ABT 1900").is_some());
        assert_eq!(table.case(), CaseMatching::Sensitive);
    }

    #[test]
    fn test_table_order_breaks_ties() {
        let first = rule("1900", MatchPosition::AnywhereInText, Period::Calculated);
        let second = rule("ABT", MatchPosition::PrefixOfText, Period::About);

        let table = PeriodTable::new(vec![first, second], CaseMatching::Insensitive).unwrap();
        let m = table.find_first_match("ABT 1900").unwrap();
        assert_eq!(m.rule.target, Period::Calculated);
        assert_eq!((m.start, m.end), (4, 8));

        let table = PeriodTable::new(vec![second, first], CaseMatching::Insensitive).unwrap();
        let m = table.find_first_match("ABT 1900").unwrap();
        assert_eq!(m.rule.target, Period::About);
    }

    #[test]
    fn test_suffix_position() {
        let table = PeriodTable::new(
            vec![rule("(EST)", MatchPosition::SuffixOfText, Period::Estimated)],
            CaseMatching::Insensitive,
        )
        .unwrap();
        let m = table.find_first_match("1900 (est)").unwrap();
        assert_eq!((m.start, m.end), (5, 10));
        assert!(table.find_first_match("(EST) 1900").is_none());
    }

    #[test]
    fn test_anywhere_takes_leftmost_occurrence() {
        let table = PeriodTable::new(
            vec![rule("CA", MatchPosition::AnywhereInText, Period::About)],
            CaseMatching::Insensitive,
        )
        .unwrap();
        let m = table.find_first_match("1900 ca 1901 CA").unwrap();
        assert_eq!((m.start, m.end), (5, 7));
    }

    #[test]
    fn test_non_ascii_text_is_safe() {
        let table = PeriodTable::new(
            vec![rule("ABT", MatchPosition::SuffixOfText, Period::About)],
            CaseMatching::Insensitive,
        )
        .unwrap();
        assert!(table.find_first_match("größe").is_none());
        let m = table.find_first_match("1900 grob abt").unwrap();
        assert_eq!(&"1900 grob abt"[m.start..m.end], "abt");
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let result = PeriodTable::new(
            vec![
                rule("ABT", MatchPosition::PrefixOfText, Period::About),
                rule("", MatchPosition::AnywhereInText, Period::Estimated),
            ],
            CaseMatching::Insensitive,
        );
        assert_eq!(result.unwrap_err(), TableError::EmptyKeyword { index: 1 });
    }

    #[test]
    fn test_standard_table_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    PeriodTable::standard()
                        .find_first_match("AFT 1900")
                        .map(|m| m.rule.target)
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Some(Period::After));
        }
    }
}
