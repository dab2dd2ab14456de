//! Typed value access.

use super::RecordFacade;
use crate::error::{RecordError, Result};
use crate::schema::FieldKind;
use crate::store::{RecordHandle, RecordStore};
use crate::types::{JournalEntry, RichValue};
use serde_json::Value;

/// Text form of a value as handed to the store.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl<'s, S: RecordStore> RecordFacade<'s, S> {
    /// Whether the field holds a non-empty value.
    pub fn has_value(&self, field: &str) -> Result<bool> {
        const OP: &str = "RecordFacade::has_value";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        Ok(self
            .handle
            .value(checked.name)
            .is_some_and(|value| !value.is_empty()))
    }

    /// Trimmed value of the field, or an empty string if unset.
    pub fn value(&self, field: &str) -> Result<String> {
        const OP: &str = "RecordFacade::value";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        Ok(self
            .handle
            .value(checked.name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default())
    }

    /// Plaintext of a two-way encrypted field.
    pub fn decrypted_value(&self, field: &str) -> Result<String> {
        const OP: &str = "RecordFacade::decrypted_value";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        if checked.schema.kind() != FieldKind::Encrypted {
            return Err(RecordError::schema(
                OP,
                format!("\"{}\" does not represent an encrypted field!", checked.name),
            ));
        }
        self.handle.decrypted_value(checked.name)
    }

    /// Handle for the row a reference field points at.
    ///
    /// An unset reference yields a handle that is not a valid record; check
    /// `is_valid_record()` on the result before relying on it.
    pub fn reference_record(&self, field: &str) -> Result<S::Handle> {
        const OP: &str = "RecordFacade::reference_record";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        if checked.schema.kind() != FieldKind::Reference {
            return Err(RecordError::schema(
                OP,
                format!("\"{}\" does not represent a reference field!", checked.name),
            ));
        }
        self.handle.reference_record(checked.name)
    }

    /// Typed representation of the field's value, for types that have one.
    /// `None` for empty fields and for types without one.
    pub fn rich_value(&self, field: &str) -> Result<Option<RichValue>> {
        const OP: &str = "RecordFacade::rich_value";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        Ok(self
            .handle
            .value(checked.name)
            .and_then(|raw| RichValue::parse(&checked.schema.internal_type, &raw)))
    }

    /// Entries of a journal field, newest first.
    pub fn journal_entries(&self, field: &str) -> Result<Vec<JournalEntry>> {
        const OP: &str = "RecordFacade::journal_entries";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        if checked.schema.kind() != FieldKind::Journal {
            return Err(RecordError::schema(
                OP,
                format!("\"{}\" does not represent a journal field!", checked.name),
            ));
        }
        Ok(self.handle.journal_entries(checked.name))
    }

    /// Set a field, honouring its type: encrypted fields go through the
    /// display path, journal fields get a new entry, everything else is
    /// assigned directly.
    ///
    /// `Value::Null` is rejected.
    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        const OP: &str = "RecordFacade::set_value";
        self.check_not_deleted(OP)?;

        let value = value.into();
        let checked = self.check_field_value(OP, field, &value)?;
        let text = value_text(&value);

        match checked.schema.kind() {
            FieldKind::Encrypted => self.handle.set_display_value(checked.name, &text),
            FieldKind::Journal => self.handle.append_journal_entry(checked.name, &text),
            FieldKind::Plain | FieldKind::Reference | FieldKind::Other(_) => {
                self.handle.set_value(checked.name, &text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{FieldSchema, SchemaCatalog, TableSchema};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(
            SchemaCatalog::new()
                .with_table(
                    TableSchema::new("sys_user")
                        .with_field(FieldSchema::new("name", "string"))
                        .with_field(FieldSchema::new("password", "password2")),
                )
                .with_table(
                    TableSchema::new("task")
                        .with_field(FieldSchema::new("name", "string"))
                        .with_field(FieldSchema::new("priority", "integer"))
                        .with_field(FieldSchema::new("due", "glide_date"))
                        .with_field(FieldSchema::new("active", "boolean"))
                        .with_field(FieldSchema::new("work_notes", "journal_input"))
                        .with_field(FieldSchema::new("caller", "reference").referencing("sys_user")),
                ),
        )
    }

    #[test]
    fn test_value_is_trimmed() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        assert_eq!(task.value("name").unwrap(), "");
        assert!(!task.has_value("name").unwrap());

        task.set_value("name", "  Acme  ").unwrap();
        assert_eq!(task.value("name").unwrap(), "Acme");
        assert!(task.has_value("name").unwrap());
    }

    #[test]
    fn test_non_string_values() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        task.set_value("priority", 2).unwrap();
        task.set_value("active", true).unwrap();

        assert_eq!(task.value("priority").unwrap(), "2");
        assert_eq!(task.rich_value("priority").unwrap(), Some(RichValue::Integer(2)));
        assert_eq!(task.rich_value("active").unwrap(), Some(RichValue::Boolean(true)));
    }

    #[test]
    fn test_null_value_rejected() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        let err = task.set_value("name", Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_unknown_field_names_field_and_table() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        let err = task.set_value("missingField", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        let message = err.to_string();
        assert!(message.contains("missingField"));
        assert!(message.contains("task"));
    }

    #[test]
    fn test_rich_value_date_and_none() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        assert_eq!(task.rich_value("due").unwrap(), None);

        task.set_value("due", "2025-03-01").unwrap();
        task.set_value("name", "Acme").unwrap();
        assert_eq!(
            task.rich_value("due").unwrap(),
            Some(RichValue::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()))
        );
        assert_eq!(task.rich_value("name").unwrap(), None);
    }

    #[test]
    fn test_journal_field_appends() {
        let store = store();
        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        task.set_value("work_notes", "Called the customer").unwrap();
        task.set_value("work_notes", "Replaced toner").unwrap();

        let entries = task.journal_entries("work_notes").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, "Replaced toner");
        assert_eq!(entries[1].value, "Called the customer");
        assert_eq!(
            task.journal_entries("name").unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn test_encrypted_field() {
        let store = store();
        let mut user = RecordFacade::new_for_table(&store, "sys_user", false).unwrap();
        user.set_value("password", "hunter2").unwrap();

        assert_ne!(user.value("password").unwrap(), "hunter2");
        assert_eq!(user.decrypted_value("password").unwrap(), "hunter2");
        assert_eq!(
            user.decrypted_value("name").unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn test_reference_record() {
        let store = store();
        let mut user = RecordFacade::new_for_table(&store, "sys_user", false).unwrap();
        user.set_value("name", "Ada").unwrap();
        let user_id = user.insert().unwrap().unwrap();

        let mut task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        let unset = task.reference_record("caller").unwrap();
        assert!(!unset.is_valid_record());

        task.set_value("caller", user_id.as_str()).unwrap();
        let caller = task.reference_record("caller").unwrap();
        assert!(caller.is_valid_record());
        assert_eq!(caller.value("name").as_deref(), Some("Ada"));

        assert_eq!(
            task.reference_record("name").unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn test_label_rejects_number_from_json() {
        let store = store();
        let task = RecordFacade::new_for_table(&store, "task", false).unwrap();
        let err = crate::types::LabelQuery::try_from(&json!(42))
            .and_then(|query| task.label(query))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
