//! Editable attribute rows for record forms
//!
//! The list always holds at least one row so a form has somewhere to type.
//! Incomplete rows are allowed while editing and dropped on submit.

use crate::error::{PhonedeskError, Result};
use crate::types::AttributeEntry;

/// Which half of an attribute row to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeField {
    Label,
    Value,
}

/// Ordered label/value buffer used while composing a create or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeList {
    entries: Vec<AttributeEntry>,
}

impl Default for AttributeList {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeList {
    /// A single blank row, as shown by a fresh create form.
    pub fn new() -> Self {
        Self {
            entries: vec![AttributeEntry::default()],
        }
    }

    /// Copy a record's attributes into a new buffer.
    pub fn from_entries(entries: &[AttributeEntry]) -> Self {
        if entries.is_empty() {
            return Self::new();
        }
        Self {
            entries: entries.to_vec(),
        }
    }

    pub fn add_blank_entry(&mut self) {
        self.entries.push(AttributeEntry::default());
    }

    /// Append a filled row, reusing a trailing blank row if there is one.
    pub fn push(&mut self, entry: AttributeEntry) {
        match self.entries.last_mut() {
            Some(last) if last.label.is_empty() && last.value.is_empty() => *last = entry,
            _ => self.entries.push(entry),
        }
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<AttributeEntry> {
        self.check_index(index)?;
        if self.entries.len() == 1 {
            return Err(PhonedeskError::LastAttribute);
        }
        Ok(self.entries.remove(index))
    }

    pub fn set_field(
        &mut self,
        index: usize,
        field: AttributeField,
        value: impl Into<String>,
    ) -> Result<()> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        match field {
            AttributeField::Label => entry.label = value.into(),
            AttributeField::Value => entry.value = value.into(),
        }
        Ok(())
    }

    /// Reset to a single blank row.
    pub fn clear(&mut self) {
        self.entries = vec![AttributeEntry::default()];
    }

    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows that will be sent to the store: both halves non-blank, trimmed,
    /// in their original order.
    pub fn submittable(&self) -> Vec<AttributeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.is_complete())
            .map(|entry| AttributeEntry::new(entry.label.trim(), entry.value.trim()))
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(PhonedeskError::AttributeIndex {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}
