//! Schedule types: recurring definitions and their dated occurrences.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::ClockTime;
use crate::error::ValidationError;
use crate::recurrence::RecurrenceRule;

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("'{other}' is not one of low, medium, high"),
            }),
        }
    }
}

/// A task that repeats according to a [`RecurrenceRule`].
///
/// Read-only to the recurrence engine; created and edited by the user-facing
/// layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    /// Time of day copied onto every generated occurrence.
    pub time: Option<ClockTime>,
    pub rule: RecurrenceRule,
    pub created_at: DateTime<Utc>,
    /// Last calendar day (inclusive) on which the definition may generate.
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl RecurringDefinition {
    /// Create an active definition with a fresh id, created now.
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>, rule: RecurrenceRule) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            category: String::new(),
            priority: Priority::default(),
            time: None,
            rule,
            created_at: Utc::now(),
            end_date: None,
            is_active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_time(mut self, time: ClockTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A concrete, dated task instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub date: NaiveDate,
    pub time: Option<ClockTime>,
    /// Length used when this occurrence blocks time on the planner.
    pub duration_minutes: Option<u32>,
    /// Originating recurring definition, if generated.
    pub definition_id: Option<String>,
    pub completed: bool,
}

/// Request to create an [`Occurrence`]; identity and completion are assigned
/// by whoever persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOccurrence {
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub date: NaiveDate,
    pub time: Option<ClockTime>,
    pub duration_minutes: Option<u32>,
    pub definition_id: Option<String>,
}

impl NewOccurrence {
    /// Request for a one-off occurrence not tied to any definition.
    pub fn one_off(owner_id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            category: String::new(),
            priority: Priority::default(),
            date,
            time: None,
            duration_minutes: None,
            definition_id: None,
        }
    }

    /// Request generated from `definition` for `date`.
    pub fn from_definition(definition: &RecurringDefinition, date: NaiveDate) -> Self {
        Self {
            owner_id: definition.owner_id.clone(),
            title: definition.title.clone(),
            category: definition.category.clone(),
            priority: definition.priority,
            date,
            time: definition.time,
            duration_minutes: None,
            definition_id: Some(definition.id.clone()),
        }
    }

    pub fn with_time(mut self, time: ClockTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Materialize with a fresh id.
    pub fn into_occurrence(self) -> Occurrence {
        Occurrence {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: self.owner_id,
            title: self.title,
            category: self.category,
            priority: self.priority,
            date: self.date,
            time: self.time,
            duration_minutes: self.duration_minutes,
            definition_id: self.definition_id,
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn generated_request_copies_definition_fields() {
        let def = RecurringDefinition::new("alice", "Stand-up", RecurrenceRule::Daily)
            .with_category("work")
            .with_priority(Priority::High)
            .with_time(ClockTime::from_hm(9, 30).unwrap());
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        let req = NewOccurrence::from_definition(&def, date);
        assert_eq!(req.owner_id, "alice");
        assert_eq!(req.title, "Stand-up");
        assert_eq!(req.category, "work");
        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.time.map(|t| t.to_string()).as_deref(), Some("09:30"));
        assert_eq!(req.definition_id.as_deref(), Some(def.id.as_str()));

        let occ = req.into_occurrence();
        assert!(!occ.completed);
        assert!(!occ.id.is_empty());
    }

    #[test]
    fn definition_serializes_with_tagged_rule() {
        let def = RecurringDefinition::new("bob", "Gym", RecurrenceRule::weekly([1, 3, 5]));
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["rule"]["type"], "weekly");
        let back: RecurringDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, def);
    }
}
