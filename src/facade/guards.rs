//! Preconditions shared by the facade's operations.

use super::RecordFacade;
use crate::error::{RecordError, Result};
use crate::lifecycle::{IllegalTransition, Transition};
use crate::schema::FieldSchema;
use crate::store::{RecordHandle, RecordStore};
use serde_json::Value;

/// A field name that passed validation, with its schema entry.
pub(super) struct CheckedField<'a> {
    pub name: &'a str,
    pub schema: FieldSchema,
}

impl<'s, S: RecordStore> RecordFacade<'s, S> {
    /// The field name must be non-empty after trimming and a column of the
    /// bound table.
    pub(super) fn check_field_name<'a>(
        &self,
        operation: &'static str,
        field: &'a str,
    ) -> Result<CheckedField<'a>> {
        let name = field.trim();
        if name.is_empty() {
            return Err(RecordError::validation(
                operation,
                "No field name for validation passed!",
            ));
        }

        match self.handle.field_schema(name) {
            Some(schema) => Ok(CheckedField {
                name,
                schema: schema.clone(),
            }),
            None => Err(RecordError::schema(
                operation,
                format!(
                    "\"{}\" is not a valid field name for table \"{}\"!",
                    name,
                    self.handle.table_name()
                ),
            )),
        }
    }

    /// Field-name check plus rejection of null values.
    pub(super) fn check_field_value<'a>(
        &self,
        operation: &'static str,
        field: &'a str,
        value: &Value,
    ) -> Result<CheckedField<'a>> {
        let checked = self.check_field_name(operation, field)?;
        if value.is_null() {
            return Err(RecordError::validation(
                operation,
                format!("No value for the field {} was passed!", checked.name),
            ));
        }
        Ok(checked)
    }

    pub(super) fn check_not_deleted(&self, operation: &'static str) -> Result<()> {
        if self.deleted {
            return Err(self.transition_error(operation, IllegalTransition::AlreadyDeleted));
        }
        Ok(())
    }

    /// Guards `insert` against a second insert.
    pub(super) fn check_not_committed(&self, operation: &'static str) -> Result<()> {
        self.state()
            .check(Transition::Insert)
            .map_err(|e| self.transition_error(operation, e))
    }

    /// Guards `update` and `delete_record` against rows never inserted.
    pub(super) fn check_committed(
        &self,
        operation: &'static str,
        transition: Transition,
    ) -> Result<()> {
        self.state()
            .check(transition)
            .map_err(|e| self.transition_error(operation, e))
    }

    pub(super) fn transition_error(
        &self,
        operation: &'static str,
        illegal: IllegalTransition,
    ) -> RecordError {
        let message = match illegal {
            IllegalTransition::AlreadyCommitted => format!(
                "Record with identifier \"{}\" already exists in the store!",
                self.handle.identifier()
            ),
            IllegalTransition::NotCommitted => "The record was not inserted yet!".to_string(),
            IllegalTransition::AlreadyDeleted => format!(
                "The record with identifier \"{}\" was already deleted from table \"{}\"!",
                self.handle.identifier(),
                self.handle.table_name()
            ),
        };
        RecordError::state(operation, message)
    }
}
