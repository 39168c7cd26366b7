//! Recurrence rules and the date-match predicate.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Which calendar dates a recurring definition fires on.
///
/// Stored internally tagged, e.g. `{"type":"weekly","days_of_week":[1,3]}`.
/// Decoding never fails on an unknown `type` or a missing parameter; such
/// records become [`RecurrenceRule::Unsupported`], which never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRule", into = "RawRule")]
pub enum RecurrenceRule {
    Daily,
    /// Weekdays numbered 0 = Sunday .. 6 = Saturday.
    Weekly { days_of_week: BTreeSet<u8> },
    /// Exact day of month; no clamping in shorter months.
    Monthly { day_of_month: u32 },
    /// Fires on the month/day of the definition's creation timestamp.
    Yearly,
    Unsupported { reason: String },
}

impl RecurrenceRule {
    pub fn weekly(days: impl IntoIterator<Item = u8>) -> Self {
        Self::Weekly {
            days_of_week: days.into_iter().collect(),
        }
    }

    pub fn monthly(day_of_month: u32) -> Self {
        Self::Monthly { day_of_month }
    }

    /// Whether the rule fires on `date`.
    ///
    /// `anchor` is the owning definition's creation timestamp; only
    /// [`RecurrenceRule::Yearly`] reads it.
    pub fn matches(&self, date: NaiveDate, anchor: DateTime<Utc>) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly { days_of_week } => {
                let weekday = date.weekday().num_days_from_sunday() as u8;
                days_of_week.contains(&weekday)
            }
            Self::Monthly { day_of_month } => date.day() == *day_of_month,
            Self::Yearly => date.month() == anchor.month() && date.day() == anchor.day(),
            Self::Unsupported { .. } => false,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly { .. } => "weekly",
            Self::Monthly { .. } => "monthly",
            Self::Yearly => "yearly",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

/// Compact text form used on the command line: `daily`, `weekly:1,3,5`,
/// `monthly:15`, `yearly`.
impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly { days_of_week } => {
                let days: Vec<String> = days_of_week.iter().map(u8::to_string).collect();
                write!(f, "weekly:{}", days.join(","))
            }
            Self::Monthly { day_of_month } => write!(f, "monthly:{day_of_month}"),
            Self::Unsupported { reason } => write!(f, "unsupported ({reason})"),
            other => f.write_str(other.kind()),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: "rule".into(),
            message,
        };
        let lowered = s.trim().to_ascii_lowercase();
        let (kind, param) = match lowered.split_once(':') {
            Some((k, p)) => (k, Some(p.trim())),
            None => (lowered.as_str(), None),
        };

        match (kind, param) {
            ("daily", None) => Ok(Self::Daily),
            ("yearly", None) => Ok(Self::Yearly),
            ("weekly", param) => {
                let days = param
                    .unwrap_or("")
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(|d| match d.parse::<u8>() {
                        Ok(n) if n <= 6 => Ok(n),
                        _ => Err(invalid(format!("weekday '{d}' must be 0 (Sunday) to 6 (Saturday)"))),
                    })
                    .collect::<Result<BTreeSet<u8>, _>>()?;
                Ok(Self::Weekly { days_of_week: days })
            }
            ("monthly", Some(p)) => match p.parse::<u32>() {
                Ok(n) if (1..=31).contains(&n) => Ok(Self::Monthly { day_of_month: n }),
                _ => Err(invalid(format!("day of month '{p}' must be 1 to 31"))),
            },
            ("monthly", None) => Err(invalid("monthly rule needs a day, e.g. monthly:15".into())),
            _ => Err(invalid(format!(
                "'{s}' is not one of daily, weekly:<days>, monthly:<day>, yearly"
            ))),
        }
    }
}

/// Flat storage shape; every field optional so that decoding is total.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<RawRule> for RecurrenceRule {
    fn from(raw: RawRule) -> Self {
        match raw.kind.to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly {
                days_of_week: raw.days_of_week.unwrap_or_default().into_iter().collect(),
            },
            "monthly" => match raw.day_of_month {
                Some(day_of_month) => Self::Monthly { day_of_month },
                None => Self::Unsupported {
                    reason: "monthly rule without day_of_month".into(),
                },
            },
            "yearly" => Self::Yearly,
            "unsupported" => Self::Unsupported {
                reason: raw.reason.unwrap_or_default(),
            },
            other => Self::Unsupported {
                reason: format!("unknown rule type '{other}'"),
            },
        }
    }
}

impl From<RecurrenceRule> for RawRule {
    fn from(rule: RecurrenceRule) -> Self {
        let mut raw = RawRule {
            kind: rule.kind().to_string(),
            days_of_week: None,
            day_of_month: None,
            reason: None,
        };
        match rule {
            RecurrenceRule::Weekly { days_of_week } => {
                raw.days_of_week = Some(days_of_week.into_iter().collect())
            }
            RecurrenceRule::Monthly { day_of_month } => raw.day_of_month = Some(day_of_month),
            RecurrenceRule::Unsupported { reason } => raw.reason = Some(reason),
            RecurrenceRule::Daily | RecurrenceRule::Yearly => {}
        }
        raw
    }
}
