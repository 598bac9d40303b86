//! Record form buffer for create and edit dialogs

use crate::error::{PhonedeskError, Result};
use crate::remote::{NewRecord, RecordUpdate};
use crate::types::{PhoneRecord, RecordStatus};

use super::attributes::AttributeList;

/// Whether the form creates a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: i64 },
}

/// Transient copy of a record being composed.
///
/// Never shares storage with the authoritative list; dropping the form
/// discards every unsaved change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    pub mode: FormMode,
    pub phone: String,
    pub name: String,
    pub info: String,
    pub status: RecordStatus,
    pub attributes: AttributeList,
}

impl RecordForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            phone: String::new(),
            name: String::new(),
            info: String::new(),
            status: RecordStatus::default(),
            attributes: AttributeList::new(),
        }
    }

    pub fn edit(record: &PhoneRecord) -> Self {
        Self {
            mode: FormMode::Edit { id: record.id },
            phone: record.phone.clone(),
            name: record.name.clone(),
            info: record.info.clone(),
            status: record.status,
            attributes: AttributeList::from_entries(&record.additional_info),
        }
    }

    pub fn record_id(&self) -> Option<i64> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit { id } => Some(id),
        }
    }

    /// Validate and build a create payload.
    pub fn new_record(&self) -> Result<NewRecord> {
        let (phone, name) = self.required_fields()?;
        Ok(NewRecord {
            phone,
            name,
            info: self.info.clone(),
            additional_info: self.attributes.submittable(),
        })
    }

    /// Validate and build an update payload. Requires a form opened for editing.
    pub fn record_update(&self) -> Result<RecordUpdate> {
        let id = self.record_id().ok_or_else(|| {
            PhonedeskError::Validation("form is not editing an existing record".to_string())
        })?;
        let (phone, name) = self.required_fields()?;
        if self.status == RecordStatus::Unknown {
            return Err(PhonedeskError::Validation(
                "status is not recognized, choose active or inactive".to_string(),
            ));
        }
        Ok(RecordUpdate {
            id,
            phone,
            name,
            info: self.info.clone(),
            status: self.status,
            additional_info: self.attributes.submittable(),
        })
    }

    fn required_fields(&self) -> Result<(String, String)> {
        let phone = self.phone.trim();
        let name = self.name.trim();
        match (phone.is_empty(), name.is_empty()) {
            (true, true) => Err(PhonedeskError::Validation(
                "phone and name are required".to_string(),
            )),
            (true, false) => Err(PhonedeskError::Validation("phone is required".to_string())),
            (false, true) => Err(PhonedeskError::Validation("name is required".to_string())),
            (false, false) => Ok((phone.to_string(), name.to_string())),
        }
    }
}
