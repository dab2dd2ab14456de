//! # Record Facade
//!
//! A validating facade for single-record access to a schema-driven table
//! store.
//!
//! ## Core Concepts
//!
//! - **Store**: the [`RecordStore`] collaborator that allocates and fetches
//!   row handles; [`MemoryStore`] is an in-process implementation
//! - **Handle**: a [`RecordHandle`] bound to one row, buffering changes
//! - **Facade**: a [`RecordFacade`] wrapping one handle, validating every
//!   field access against the schema and every persistence call against the
//!   row's [`LifecycleState`]
//! - **Schema**: tables and typed fields in a [`SchemaCatalog`]
//!
//! ## Example
//!
//! ```ignore
//! use record_facade::{FieldSchema, MemoryStore, RecordFacade, SchemaCatalog, TableSchema};
//!
//! let store = MemoryStore::new(SchemaCatalog::new().with_table(
//!     TableSchema::new("task").with_field(FieldSchema::new("name", "string")),
//! ));
//!
//! let mut task = RecordFacade::new_for_table(&store, "task", false)?;
//! task.set_value("name", "Acme")?;
//! let id = task.insert()?;
//!
//! // Later, possibly elsewhere
//! let mut task = RecordFacade::fetch_for_table(&store, "task", &id.unwrap(), false)?;
//! task.delete_record()?;
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod facade;
pub mod lifecycle;
pub mod schema;
pub mod store;
pub mod types;

// Re-exports
pub use access::{AccessPolicy, AccessRules, AllowAll, Operation};
pub use config::StoreConfig;
pub use error::{ErrorKind, RecordError, Result};
pub use facade::{is_valid_handle, RecordFacade};
pub use lifecycle::{IllegalTransition, LifecycleState, Transition};
pub use schema::{FieldKind, FieldSchema, SchemaCatalog, TableSchema, IDENTIFIER_FIELD};
pub use store::{FieldCipher, MemoryRecord, MemoryStore, RecordHandle, RecordStore, StoreStats};
pub use types::*;
