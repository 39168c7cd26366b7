//! In-memory [`ScheduleStore`] adapter.

use chrono::NaiveDate;

use super::ScheduleStore;
use crate::error::{DatabaseError, Result};
use crate::schedule::{NewOccurrence, Occurrence, RecurringDefinition};

/// Vector-backed store. Enforces the same (owner, definition, date)
/// uniqueness rule as the SQLite adapter.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    definitions: Vec<RecurringDefinition>,
    occurrences: Vec<Occurrence>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&mut self, definition: RecurringDefinition) {
        self.definitions.push(definition);
    }

    pub fn definitions(&self) -> &[RecurringDefinition] {
        &self.definitions
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }
}

impl ScheduleStore for MemoryStore {
    fn list_active_definitions(&self, owner_id: &str) -> Result<Vec<RecurringDefinition>> {
        Ok(self
            .definitions
            .iter()
            .filter(|d| d.owner_id == owner_id && d.is_active)
            .cloned()
            .collect())
    }

    fn occurrence_exists(&self, owner_id: &str, definition_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self.occurrences.iter().any(|o| {
            o.owner_id == owner_id && o.date == date && o.definition_id.as_deref() == Some(definition_id)
        }))
    }

    fn insert_occurrence(&mut self, request: NewOccurrence) -> Result<Occurrence> {
        if let Some(definition_id) = request.definition_id.as_deref() {
            if self.occurrence_exists(&request.owner_id, definition_id, request.date)? {
                return Err(DatabaseError::DuplicateOccurrence {
                    owner_id: request.owner_id.clone(),
                    definition_id: definition_id.to_string(),
                    date: request.date,
                }
                .into());
            }
        }
        let occurrence = request.into_occurrence();
        self.occurrences.push(occurrence.clone());
        Ok(occurrence)
    }

    fn occurrences_on(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Occurrence>> {
        let mut found: Vec<Occurrence> = self
            .occurrences
            .iter()
            .filter(|o| o.owner_id == owner_id && o.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|o| o.time);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::recurrence::RecurrenceRule;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    #[test]
    fn rejects_second_generated_occurrence_for_same_day() {
        let mut store = MemoryStore::new();
        let def = RecurringDefinition::new("alice", "Journal", RecurrenceRule::Daily);

        store.insert_occurrence(NewOccurrence::from_definition(&def, day())).unwrap();
        let err = store
            .insert_occurrence(NewOccurrence::from_definition(&def, day()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Database(DatabaseError::DuplicateOccurrence { .. })));
        assert_eq!(store.occurrences().len(), 1);
    }

    #[test]
    fn one_off_occurrences_are_not_deduplicated() {
        let mut store = MemoryStore::new();
        store.insert_occurrence(NewOccurrence::one_off("alice", "Call", day())).unwrap();
        store.insert_occurrence(NewOccurrence::one_off("alice", "Call", day())).unwrap();
        assert_eq!(store.occurrences_on("alice", day()).unwrap().len(), 2);
    }

    #[test]
    fn lists_only_active_definitions_of_owner() {
        let mut store = MemoryStore::new();
        let mut inactive = RecurringDefinition::new("alice", "Old", RecurrenceRule::Daily);
        inactive.is_active = false;
        store.add_definition(inactive);
        store.add_definition(RecurringDefinition::new("alice", "New", RecurrenceRule::Daily));
        store.add_definition(RecurringDefinition::new("bob", "Other", RecurrenceRule::Daily));

        let listed = store.list_active_definitions("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "New");
    }
}
