//! Free-text candidate lines: duration extraction and title cleanup.
//!
//! `"Workout (1h 30m)"` becomes title `"Workout"` with 90 minutes. Lines that
//! name no duration get the caller's default.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Digits followed by an hour or minute marker. Longer markers are listed
/// first so that `hours` wins over `h`.
static DURATION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(hours|hour|hrs|hr|h|minutes|minute|mins|min|m)")
        .expect("valid duration regex")
});
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()\-–—]").expect("valid separator regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Hours,
    Minutes,
}

#[derive(Debug)]
struct DurationToken {
    span: Range<usize>,
    unit: Unit,
    value: u32,
}

/// Scan `line` for duration tokens.
///
/// A token must stand on its own: the digits may not continue a word or a
/// decimal number, and the marker may not run on into a word
/// (`"5 mangoes"` is not five minutes). `1h30m` is accepted as two tokens.
fn duration_tokens(line: &str) -> Vec<DurationToken> {
    let mut tokens: Vec<DurationToken> = Vec::new();

    for caps in DURATION_TOKEN.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        let glued_to_previous = tokens.last().is_some_and(|t| t.span.end == whole.start());
        let before_ok = glued_to_previous
            || line[..whole.start()]
                .chars()
                .next_back()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '.' || c == ','));
        let after_ok = line[whole.end()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphabetic());
        if !before_ok || !after_ok {
            continue;
        }

        let Ok(value) = caps[1].parse::<u32>() else { continue };
        let unit = if caps[2].to_ascii_lowercase().starts_with('h') {
            Unit::Hours
        } else {
            Unit::Minutes
        };
        tokens.push(DurationToken {
            span: whole.range(),
            unit,
            value,
        });
    }
    tokens
}

/// A candidate line after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCandidate {
    pub title: String,
    pub duration_minutes: u32,
    /// Whether the duration came from the line rather than the fallback.
    pub explicit_duration: bool,
}

/// An unplaced task line and the duration to use when it names none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub line: String,
    pub default_minutes: u32,
}

impl Candidate {
    pub fn new(line: impl Into<String>, default_minutes: u32) -> Self {
        Self {
            line: line.into(),
            default_minutes,
        }
    }

    pub fn parse(&self) -> ParsedCandidate {
        parse_candidate(&self.line, self.default_minutes)
    }
}

/// Parser bound to one configured default duration.
#[derive(Debug, Clone, Copy)]
pub struct DurationParser {
    default_minutes: u32,
}

impl DurationParser {
    pub fn new(default_minutes: u32) -> Self {
        Self { default_minutes }
    }

    pub fn default_minutes(&self) -> u32 {
        self.default_minutes
    }

    pub fn parse(&self, line: &str) -> ParsedCandidate {
        parse_candidate(line, self.default_minutes)
    }

    pub fn parse_all<I, S>(&self, lines: I) -> Vec<ParsedCandidate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines.into_iter().map(|l| self.parse(l.as_ref())).collect()
    }
}

/// Extract `(title, minutes)` from one line, falling back to
/// `fallback_minutes` when the line names no duration.
///
/// The first hour token and the first minute token are added together;
/// every recognised token is removed from the title.
pub fn parse_candidate(line: &str, fallback_minutes: u32) -> ParsedCandidate {
    let tokens = duration_tokens(line);

    let hours = tokens.iter().find(|t| t.unit == Unit::Hours).map(|t| t.value);
    let minutes = tokens.iter().find(|t| t.unit == Unit::Minutes).map(|t| t.value);
    let explicit_duration = hours.is_some() || minutes.is_some();
    let duration_minutes = if explicit_duration {
        hours
            .unwrap_or(0)
            .saturating_mul(60)
            .saturating_add(minutes.unwrap_or(0))
    } else {
        fallback_minutes
    };

    let mut stripped = String::with_capacity(line.len());
    let mut pos = 0;
    for token in &tokens {
        stripped.push_str(&line[pos..token.span.start]);
        stripped.push(' ');
        pos = token.span.end;
    }
    stripped.push_str(&line[pos..]);

    ParsedCandidate {
        title: clean_title(&stripped, line),
        duration_minutes,
        explicit_duration,
    }
}

/// Drop parentheses and dash separators, collapse whitespace, trim. Falls
/// back to the trimmed `original` if nothing is left.
fn clean_title(stripped: &str, original: &str) -> String {
    let without_separators = SEPARATORS.replace_all(stripped, " ");
    let collapsed = WHITESPACE.replace_all(&without_separators, " ");
    let title = collapsed.trim();
    if title.is_empty() {
        original.trim().to_string()
    } else {
        title.to_string()
    }
}
