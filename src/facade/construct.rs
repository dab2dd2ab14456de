//! Construction of facades.
//!
//! Each way of obtaining a facade has its own constructor. All of them
//! validate their input before touching the store and either return a fully
//! bound facade or an error.

use super::RecordFacade;
use crate::error::{RecordError, Result};
use crate::store::{RecordHandle, RecordStore};
use tracing::debug;

/// Whether `handle` represents a well-formed row (fetched and found, or
/// freshly created in memory) and, if `table` is given, is bound to it.
pub fn is_valid_handle<H: RecordHandle>(handle: &H, table: Option<&str>) -> bool {
    let valid = handle.is_valid_record() || handle.is_new_record();
    match table {
        Some(table) => valid && handle.table_name() == table.trim(),
        None => valid,
    }
}

impl<'s, S: RecordStore> RecordFacade<'s, S> {
    /// Wrap an existing handle.
    ///
    /// The handle must represent a well-formed row. Whether it was created
    /// as new is the caller's knowledge, so the facade treats it as not
    /// constructed by itself.
    pub fn from_handle(store: &'s S, handle: S::Handle) -> Result<Self> {
        if !is_valid_handle(&handle, None) {
            return Err(RecordError::construction(
                "Passed handle does not represent a valid record!",
            ));
        }
        Ok(Self::bind(store, handle, false))
    }

    /// Wrap an existing handle that must be bound to `table`.
    pub fn from_handle_for_table(store: &'s S, handle: S::Handle, table: &str) -> Result<Self> {
        if handle.table_name() != table.trim() {
            return Err(RecordError::construction(format!(
                "Passed handle is bound to table \"{}\", not \"{}\"!",
                handle.table_name(),
                table.trim()
            )));
        }
        Self::from_handle(store, handle)
    }

    /// Create a new, uncommitted record for `table`.
    pub fn new_for_table(store: &'s S, table: &str, secure: bool) -> Result<Self> {
        Self::check_table(store, table)?;
        let handle = store.create_new(table, secure)?;
        Ok(Self::bind(store, handle, true))
    }

    /// Fetch an existing record by table and identifier.
    ///
    /// Both inputs are validated before the fetch. A row that does not
    /// exist is not an error here; the facade then reports
    /// `is_valid_record() == false`.
    pub fn fetch_for_table(store: &'s S, table: &str, id: &str, secure: bool) -> Result<Self> {
        Self::check_table(store, table)?;
        if !store.is_eligible_identifier(id) {
            return Err(RecordError::construction(format!(
                "\"{id}\" does not represent a valid identifier!"
            )));
        }
        let handle = store.fetch_by_identifier(table, id, secure)?;
        Ok(Self::bind(store, handle, false))
    }

    fn check_table(store: &S, table: &str) -> Result<()> {
        if !store.table_exists(table) {
            return Err(RecordError::construction(format!(
                "\"{table}\" does not represent a valid table name!"
            )));
        }
        Ok(())
    }

    fn bind(store: &'s S, handle: S::Handle, constructed_as_new: bool) -> Self {
        debug!(
            table = handle.table_name(),
            identifier = %handle.identifier(),
            constructed_as_new,
            "Facade bound to handle"
        );
        Self {
            store,
            handle,
            constructed_as_new,
            deleted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{FieldSchema, SchemaCatalog, TableSchema};
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::new(
            SchemaCatalog::new()
                .with_table(TableSchema::new("task").with_field(FieldSchema::new("name", "string")))
                .with_table(TableSchema::new("incident")),
        )
    }

    #[test]
    fn test_new_for_table() {
        let store = store();
        let facade = RecordFacade::new_for_table(&store, "task", false).unwrap();
        assert!(facade.is_new_record());
        assert!(facade.is_valid_record());
        assert!(facade.was_constructed_as_new());
    }

    #[test]
    fn test_new_for_unknown_table() {
        let store = store();
        let err = RecordFacade::new_for_table(&store, "nope", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_fetch_rejects_bad_identifier_before_fetch() {
        let store = store();
        let err = RecordFacade::fetch_for_table(&store, "task", "not-an-id", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(store.stats().fetches, 0);
    }

    #[test]
    fn test_fetch_rejects_unknown_table_first() {
        let store = store();
        let err = RecordFacade::fetch_for_table(&store, "nope", "also bad", false).unwrap_err();
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn test_fetch_missing_row_is_not_fatal() {
        let store = store();
        let facade =
            RecordFacade::fetch_for_table(&store, "task", "0123456789abcdef0123456789abcdef", false)
                .unwrap();
        assert!(!facade.is_valid_record());
        assert!(!facade.is_new_record());
        assert!(!facade.was_constructed_as_new());
    }

    #[test]
    fn test_from_handle_rejects_empty_handle() {
        let store = store();
        let handle = store
            .fetch_by_identifier("task", "0123456789abcdef0123456789abcdef", false)
            .unwrap();
        let err = RecordFacade::from_handle(&store, handle).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_from_handle_keeps_new_state() {
        let store = store();
        let handle = store.create_new("task", false).unwrap();
        let facade = RecordFacade::from_handle(&store, handle).unwrap();
        assert!(facade.is_new_record());
        assert!(!facade.was_constructed_as_new());
    }

    #[test]
    fn test_from_handle_table_mismatch() {
        let store = store();
        let handle = store.create_new("task", false).unwrap();
        let err = RecordFacade::from_handle_for_table(&store, handle, "incident").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);

        let handle = store.create_new("task", false).unwrap();
        assert!(RecordFacade::from_handle_for_table(&store, handle, " task ").is_ok());
    }

    #[test]
    fn test_is_valid_handle() {
        let store = store();
        let handle = store.create_new("task", false).unwrap();
        assert!(is_valid_handle(&handle, None));
        assert!(is_valid_handle(&handle, Some("task")));
        assert!(!is_valid_handle(&handle, Some("incident")));

        let missing = store
            .fetch_by_identifier("task", "0123456789abcdef0123456789abcdef", false)
            .unwrap();
        assert!(!is_valid_handle(&missing, None));
    }
}
