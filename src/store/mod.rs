//! The store boundary the facade is built on.
//!
//! A [`RecordStore`] hands out [`RecordHandle`]s, each bound to one row of
//! one table. Handles buffer field changes in memory until `insert` or
//! `update` persists them.

mod crypto;
mod memory;

pub use crypto::FieldCipher;
pub use memory::{MemoryRecord, MemoryStore, StoreStats};

use crate::access::Operation;
use crate::error::Result;
use crate::schema::FieldSchema;
use crate::types::JournalEntry;

/// Store-side view of a single row.
pub trait RecordHandle {
    /// Table this handle is bound to.
    fn table_name(&self) -> &str;

    /// Row key, or an empty string before the first insert.
    fn identifier(&self) -> String;

    /// Whether the handle represents a well-formed row: either freshly
    /// initialized in memory or fetched and found.
    fn is_valid_record(&self) -> bool;

    /// Whether the row has not been inserted yet.
    fn is_new_record(&self) -> bool;

    /// Whether the handle enforces the access policy on data access.
    fn is_secure(&self) -> bool;

    /// Schema entry for a column of the bound table.
    fn field_schema(&self, field: &str) -> Option<&FieldSchema>;

    /// Table label, singular or plural.
    fn table_label(&self, plural: bool) -> String;

    /// Display value of the row as a whole.
    fn display_value(&self) -> String;

    /// Display value of one field.
    fn field_display_value(&self, field: &str) -> Result<String>;

    /// Capability check for the row or one field.
    fn can(&self, operation: Operation, field: Option<&str>) -> bool;

    /// Raw stored value, `None` when unset.
    fn value(&self, field: &str) -> Option<String>;

    /// Plaintext of a two-way encrypted field.
    fn decrypted_value(&self, field: &str) -> Result<String>;

    fn set_value(&mut self, field: &str, value: &str) -> Result<()>;

    /// Set a value through the display path; encrypted fields are encrypted
    /// by the store.
    fn set_display_value(&mut self, field: &str, value: &str) -> Result<()>;

    fn append_journal_entry(&mut self, field: &str, value: &str) -> Result<()>;

    /// Entries of a journal field, newest first.
    fn journal_entries(&self, field: &str) -> Vec<JournalEntry>;

    /// Handle for the row a reference field points at. An unset reference
    /// yields a handle that is not a valid record.
    fn reference_record(&self, field: &str) -> Result<Self>
    where
        Self: Sized;

    /// URL of the row.
    fn link(&self, no_stack: bool) -> String;

    /// Persist a new row. `Ok(None)` when the store declined.
    fn insert(&mut self) -> Result<Option<String>>;

    /// Persist changes to an existing row. `Ok(None)` when the store declined.
    fn update(&mut self) -> Result<Option<String>>;

    /// Delete the row. `Ok(false)` when nothing was deleted.
    fn delete(&mut self) -> Result<bool>;
}

/// Store collaborator: table catalog plus handle allocation.
pub trait RecordStore {
    type Handle: RecordHandle;

    fn table_exists(&self, table: &str) -> bool;

    /// Allocate a new, uncommitted handle. `secure` selects a handle that
    /// enforces the access policy on data access.
    fn create_new(&self, table: &str, secure: bool) -> Result<Self::Handle>;

    /// Fetch a row. A missing row yields a handle that is not a valid record.
    fn fetch_by_identifier(&self, table: &str, id: &str, secure: bool) -> Result<Self::Handle>;

    /// Whether `id` has the surface syntax of a row key.
    fn is_eligible_identifier(&self, id: &str) -> bool;
}
