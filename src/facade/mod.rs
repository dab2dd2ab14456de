//! The record facade.
//!
//! A [`RecordFacade`] wraps one [`RecordHandle`] and makes single-record
//! access self-validating: every field accessor checks the field against the
//! table's schema, type-specific accessors check the field type, and the
//! persistence operations follow the [`LifecycleState`] machine.
//!
//! ```ignore
//! let mut task = RecordFacade::new_for_table(&store, "task", false)?;
//! task.set_value("short_description", "Replace printer toner")?;
//! let id = task.insert()?;
//! ```

mod construct;
mod guards;
mod values;

pub use construct::is_valid_handle;

use crate::access::Operation;
use crate::error::{RecordError, Result};
use crate::lifecycle::{LifecycleState, Transition};
use crate::schema::FieldKind;
use crate::store::{RecordHandle, RecordStore};
use crate::types::LabelQuery;
use std::fmt;
use tracing::{debug, error, warn};

/// Validating wrapper around a single row of a [`RecordStore`].
pub struct RecordFacade<'s, S: RecordStore> {
    /// Store the handle came from; used to re-acquire rows.
    store: &'s S,

    handle: S::Handle,

    /// Whether this facade allocated the handle as a new row.
    constructed_as_new: bool,

    /// Set once a delete through this facade succeeded. Whether the row is
    /// committed is always read from the handle.
    deleted: bool,
}

impl<'s, S: RecordStore> RecordFacade<'s, S> {
    /// The wrapped handle.
    pub fn handle(&self) -> &S::Handle {
        &self.handle
    }

    /// Mutable access to the wrapped handle. Changes made here bypass the
    /// facade's field validation.
    pub fn handle_mut(&mut self) -> &mut S::Handle {
        &mut self.handle
    }

    /// Give up the facade and return the wrapped handle.
    pub fn into_handle(self) -> S::Handle {
        self.handle
    }

    pub fn state(&self) -> LifecycleState {
        if self.deleted {
            LifecycleState::Deleted
        } else {
            LifecycleState::initial(self.handle.is_new_record())
        }
    }

    /// Whether the facade allocated its handle through
    /// [`RecordFacade::new_for_table`].
    pub fn was_constructed_as_new(&self) -> bool {
        self.constructed_as_new
    }

    // --- Metadata ---

    /// Not deleted, and the handle represents a well-formed row.
    pub fn is_valid_record(&self) -> bool {
        !self.deleted && self.handle.is_valid_record()
    }

    /// Whether `field` is a column of the bound table. Never fails.
    pub fn is_valid_field(&self, field: &str) -> bool {
        self.check_field_name("RecordFacade::is_valid_field", field)
            .is_ok()
    }

    /// Whether the row has not been inserted yet.
    pub fn is_new_record(&self) -> bool {
        self.state() == LifecycleState::Uncommitted
    }

    pub fn is_deleted_record(&self) -> bool {
        self.deleted
    }

    pub fn table_name(&self) -> Result<&str> {
        self.check_not_deleted("RecordFacade::table_name")?;
        Ok(self.handle.table_name())
    }

    /// Row identifier (the `sys_id` column); empty before the first insert.
    /// Not subject to field read policies.
    pub fn identifier(&self) -> Result<String> {
        self.check_not_deleted("RecordFacade::identifier")?;
        Ok(self.handle.identifier())
    }

    /// Primary key of the row as reported by the store.
    pub fn unique_value(&self) -> Result<String> {
        self.check_not_deleted("RecordFacade::unique_value")?;
        Ok(self.handle.identifier())
    }

    /// URL of the row. `no_stack` suppresses the navigation stack parameter.
    pub fn link(&self, no_stack: bool) -> Result<String> {
        self.check_not_deleted("RecordFacade::link")?;
        Ok(self.handle.link(no_stack))
    }

    /// Display value of the whole row.
    pub fn display_value(&self) -> Result<String> {
        self.check_not_deleted("RecordFacade::display_value")?;
        Ok(self.handle.display_value())
    }

    pub fn field_display_value(&self, field: &str) -> Result<String> {
        const OP: &str = "RecordFacade::field_display_value";
        self.check_not_deleted(OP)?;
        let checked = self.check_field_name(OP, field)?;
        self.handle.field_display_value(checked.name)
    }

    /// Internal type tag of a field, e.g. `"reference"` or `"password2"`.
    pub fn field_type(&self, field: &str) -> Result<String> {
        const OP: &str = "RecordFacade::field_type";
        self.check_not_deleted(OP)?;
        Ok(self.check_field_name(OP, field)?.schema.internal_type)
    }

    pub fn field_kind(&self, field: &str) -> Result<FieldKind> {
        const OP: &str = "RecordFacade::field_kind";
        self.check_not_deleted(OP)?;
        Ok(self.check_field_name(OP, field)?.schema.kind())
    }

    /// Label of the table (singular or plural) or of one field.
    ///
    /// Accepts `bool` for the table label (`true` for plural) and `&str` or
    /// `String` for a field label. Dynamic input goes through
    /// `LabelQuery::try_from(&serde_json::Value)`.
    pub fn label(&self, query: impl Into<LabelQuery>) -> Result<String> {
        const OP: &str = "RecordFacade::label";
        self.check_not_deleted(OP)?;
        match query.into() {
            LabelQuery::Table => Ok(self.handle.table_label(false)),
            LabelQuery::TablePlural => Ok(self.handle.table_label(true)),
            LabelQuery::Field(field) => {
                let checked = self.check_field_name(OP, &field)?;
                Ok(checked.schema.label().to_string())
            }
        }
    }

    // --- Capabilities ---

    pub fn can_read(&self) -> Result<bool> {
        self.capability("RecordFacade::can_read", Operation::Read, None)
    }

    pub fn can_write(&self) -> Result<bool> {
        self.capability("RecordFacade::can_write", Operation::Write, None)
    }

    pub fn can_create(&self) -> Result<bool> {
        self.capability("RecordFacade::can_create", Operation::Create, None)
    }

    pub fn can_delete(&self) -> Result<bool> {
        self.capability("RecordFacade::can_delete", Operation::Delete, None)
    }

    pub fn can_read_field(&self, field: &str) -> Result<bool> {
        self.capability("RecordFacade::can_read_field", Operation::Read, Some(field))
    }

    pub fn can_write_field(&self, field: &str) -> Result<bool> {
        self.capability("RecordFacade::can_write_field", Operation::Write, Some(field))
    }

    pub fn can_create_field(&self, field: &str) -> Result<bool> {
        self.capability("RecordFacade::can_create_field", Operation::Create, Some(field))
    }

    pub fn can_delete_field(&self, field: &str) -> Result<bool> {
        self.capability("RecordFacade::can_delete_field", Operation::Delete, Some(field))
    }

    fn capability(
        &self,
        op_name: &'static str,
        operation: Operation,
        field: Option<&str>,
    ) -> Result<bool> {
        self.check_not_deleted(op_name)?;
        match field {
            Some(field) => {
                let checked = self.check_field_name(op_name, field)?;
                Ok(self.handle.can(operation, Some(checked.name)))
            }
            None => Ok(self.handle.can(operation, None)),
        }
    }

    // --- Lifecycle ---

    /// Insert the row. Returns the new identifier, or `None` if the store
    /// declined.
    pub fn insert(&mut self) -> Result<Option<String>> {
        const OP: &str = "RecordFacade::insert";
        self.check_not_committed(OP)?;
        self.check_not_deleted(OP)?;

        let inserted = self.handle.insert()?;
        match &inserted {
            Some(id) => {
                debug!(table = self.handle.table_name(), identifier = %id, "Record inserted");
            }
            None => {
                warn!(table = self.handle.table_name(), "Store did not insert the record");
            }
        }
        Ok(inserted)
    }

    /// Persist field changes. Returns the identifier, or `None` if the store
    /// declined.
    pub fn update(&mut self) -> Result<Option<String>> {
        const OP: &str = "RecordFacade::update";
        self.check_committed(OP, Transition::Update)?;
        self.check_not_deleted(OP)?;

        let updated = self.handle.update()?;
        if updated.is_none() {
            warn!(
                table = self.handle.table_name(),
                identifier = %self.handle.identifier(),
                "Store did not update the record"
            );
        }
        Ok(updated)
    }

    /// Delete the row. Returns whether the store deleted it; `true` makes
    /// the facade permanently deleted.
    ///
    /// A facade that created its own handle deletes through a handle freshly
    /// fetched by table and identifier rather than through the handle used
    /// for the insert. The fresh handle is secure if the original one is.
    pub fn delete_record(&mut self) -> Result<bool> {
        const OP: &str = "RecordFacade::delete_record";
        self.check_committed(OP, Transition::Delete)?;
        self.check_not_deleted(OP)?;

        let deleted = if self.constructed_as_new {
            let table = self.handle.table_name().to_string();
            let id = self.handle.identifier();
            let secure = self.handle.is_secure();
            let mut fresh = self.store.fetch_by_identifier(&table, &id, secure)?;
            if !fresh.is_valid_record() || fresh.is_new_record() {
                error!(table = %table, identifier = %id, "Row to delete is missing from the store");
                return Err(RecordError::consistency(
                    OP,
                    format!("No record exists for identifier \"{id}\" at table \"{table}\"!"),
                ));
            }
            fresh.delete()?
        } else {
            self.handle.delete()?
        };

        if deleted {
            self.deleted = self
                .state()
                .apply(Transition::Delete)
                .map_err(|e| self.transition_error(OP, e))?
                .is_deleted();
            debug!(
                table = self.handle.table_name(),
                identifier = %self.handle.identifier(),
                "Record deleted"
            );
        } else {
            warn!(
                table = self.handle.table_name(),
                identifier = %self.handle.identifier(),
                "Store did not delete the record"
            );
        }
        Ok(deleted)
    }
}

impl<'s, S: RecordStore> fmt::Display for RecordFacade<'s, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Facade for a record handle:")?;
        writeln!(
            f,
            "Record table: {} ({})",
            self.handle.table_name(),
            self.handle.table_label(false)
        )?;
        writeln!(f, "Record identifier: {}", self.handle.identifier())?;
        writeln!(f, "Record is new: {}", self.is_new_record())?;
        writeln!(f, "Record is deleted: {}", self.is_deleted_record())
    }
}

impl<'s, S: RecordStore> fmt::Debug for RecordFacade<'s, S>
where
    S::Handle: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFacade")
            .field("handle", &self.handle)
            .field("constructed_as_new", &self.constructed_as_new)
            .field("state", &self.state())
            .finish()
    }
}
