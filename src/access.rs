//! Capability evaluation.
//!
//! The store asks an [`AccessPolicy`] whether an operation is permitted on a
//! table or on one of its fields. Secure handles enforce the answer on data
//! access; every handle reports it through the `can_*` queries.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Operation a capability check is asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Read,
    Write,
    Create,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Create => "create",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Boolean-returning authorization service.
pub trait AccessPolicy: Send + Sync {
    /// Whether `operation` is permitted on `table`, or on one of its fields.
    fn permits(&self, table: &str, field: Option<&str>, operation: Operation) -> bool;
}

impl<F> AccessPolicy for F
where
    F: Fn(&str, Option<&str>, Operation) -> bool + Send + Sync,
{
    fn permits(&self, table: &str, field: Option<&str>, operation: Operation) -> bool {
        self(table, field, operation)
    }
}

/// Policy that permits everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn permits(&self, _table: &str, _field: Option<&str>, _operation: Operation) -> bool {
        true
    }
}

/// Deny-list policy. Anything not denied is permitted.
///
/// A table-level denial also denies the operation on every field of the
/// table.
#[derive(Clone, Debug, Default)]
pub struct AccessRules {
    denied: HashSet<(String, Option<String>, Operation)>,
}

impl AccessRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny `operation` on the whole table.
    pub fn deny(mut self, table: impl Into<String>, operation: Operation) -> Self {
        self.denied.insert((table.into(), None, operation));
        self
    }

    /// Deny `operation` on one field.
    pub fn deny_field(
        mut self,
        table: impl Into<String>,
        field: impl Into<String>,
        operation: Operation,
    ) -> Self {
        self.denied
            .insert((table.into(), Some(field.into()), operation));
        self
    }

    fn is_denied(&self, table: &str, field: Option<&str>, operation: Operation) -> bool {
        self.denied
            .contains(&(table.to_string(), field.map(str::to_string), operation))
    }
}

impl AccessPolicy for AccessRules {
    fn permits(&self, table: &str, field: Option<&str>, operation: Operation) -> bool {
        if self.is_denied(table, None, operation) {
            return false;
        }
        match field {
            Some(field) => !self.is_denied(table, Some(field), operation),
            None => true,
        }
    }
}
