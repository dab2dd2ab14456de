//! In-process implementation of the store boundary.
//!
//! Rows live in per-table maps behind a lock; handles carry a private copy
//! of the row's values that is written back on `insert`/`update`.

use super::crypto::FieldCipher;
use super::{RecordHandle, RecordStore};
use crate::access::{AccessPolicy, AllowAll, Operation};
use crate::config::StoreConfig;
use crate::error::{RecordError, Result};
use crate::schema::{FieldKind, FieldSchema, SchemaCatalog, TableSchema, IDENTIFIER_FIELD};
use crate::types::{Identifier, JournalEntry, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Display value of a set encrypted field.
const MASKED_VALUE: &str = "********";

/// Fields tried, in order, when a table names no display field.
const DISPLAY_FALLBACKS: [&str; 3] = ["name", "number", "short_description"];

#[derive(Clone, Debug, PartialEq, Eq)]
enum FieldData {
    Text(String),
    /// Oldest entry first.
    Journal(Vec<JournalEntry>),
}

type Row = HashMap<String, FieldData>;

/// Operation counters for a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub fetches: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub row_count: u64,
}

#[derive(Default)]
struct Counters {
    fetches: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    sequence: AtomicU64,
}

struct StoreInner {
    config: StoreConfig,
    catalog: SchemaCatalog,
    cipher: FieldCipher,
    policy: RwLock<Arc<dyn AccessPolicy>>,
    tables: RwLock<HashMap<String, HashMap<Identifier, Row>>>,
    counters: Counters,
}

impl StoreInner {
    fn permits(&self, table: &str, field: Option<&str>, operation: Operation) -> bool {
        self.policy.read().permits(table, field, operation)
    }

    fn next_identifier(&self, table: &str) -> Identifier {
        let seq = self.counters.sequence.fetch_add(1, Ordering::Relaxed);
        let seed = format!("{}:{}:{}", table, seq, Timestamp::now().0);
        Identifier::from_seed(seed.as_bytes())
    }

    fn load(&self, table: &str, id: &Identifier) -> Option<Row> {
        self.tables
            .read()
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned()
    }
}

/// Row display value: the display field, then the usual name-like fields,
/// then the identifier.
fn row_display(schema: &TableSchema, values: &Row, id: Option<Identifier>) -> String {
    let candidates = schema
        .display_field
        .as_deref()
        .into_iter()
        .chain(DISPLAY_FALLBACKS);

    for name in candidates {
        if let Some(FieldData::Text(text)) = values.get(name) {
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
    }

    id.map(|id| id.to_hex()).unwrap_or_default()
}

fn fetch(store: &Arc<StoreInner>, table: &str, id: &str, secure: bool) -> Result<MemoryRecord> {
    if !store.catalog.contains(table) {
        return Err(RecordError::Store(format!("Unknown table: {table}")));
    }

    store.counters.fetches.fetch_add(1, Ordering::Relaxed);

    let Some(id) = Identifier::from_hex(id) else {
        return Ok(MemoryRecord::empty(store, table, secure));
    };

    if secure && !store.permits(table, None, Operation::Read) {
        debug!(table, identifier = %id, "Read denied, returning empty handle");
        return Ok(MemoryRecord::empty(store, table, secure));
    }

    match store.load(table, &id) {
        Some(values) => Ok(MemoryRecord {
            store: Arc::clone(store),
            table: table.to_string(),
            secure,
            identifier: Some(id),
            values,
            is_new: false,
            exists: true,
        }),
        None => Ok(MemoryRecord::empty(store, table, secure)),
    }
}

/// Thread-safe in-memory table store.
///
/// Cloning is cheap and yields another view of the same rows.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Store with default configuration, a random encryption key, and a
    /// policy that permits everything.
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self::from_parts(catalog, StoreConfig::default(), FieldCipher::random())
    }

    /// Store with explicit configuration.
    pub fn with_config(catalog: SchemaCatalog, config: StoreConfig) -> Result<Self> {
        let cipher = match &config.encryption_key {
            Some(key) => FieldCipher::from_hex_key(key)?,
            None => FieldCipher::random(),
        };
        Ok(Self::from_parts(catalog, config, cipher))
    }

    fn from_parts(catalog: SchemaCatalog, config: StoreConfig, cipher: FieldCipher) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                catalog,
                cipher,
                policy: RwLock::new(Arc::new(AllowAll) as Arc<dyn AccessPolicy>),
                tables: RwLock::new(HashMap::new()),
                counters: Counters::default(),
            }),
        }
    }

    /// Replace the access policy.
    pub fn set_policy(&self, policy: impl AccessPolicy + 'static) {
        *self.inner.policy.write() = Arc::new(policy);
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.inner.catalog
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Number of persisted rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.inner.tables.read().get(table).map_or(0, HashMap::len)
    }

    /// Whether a persisted row exists.
    pub fn contains(&self, table: &str, id: &str) -> bool {
        Identifier::from_hex(id)
            .map(|id| self.inner.load(table, &id).is_some())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> StoreStats {
        let counters = &self.inner.counters;
        StoreStats {
            fetches: counters.fetches.load(Ordering::Relaxed),
            inserts: counters.inserts.load(Ordering::Relaxed),
            updates: counters.updates.load(Ordering::Relaxed),
            deletes: counters.deletes.load(Ordering::Relaxed),
            row_count: self.inner.tables.read().values().map(|r| r.len() as u64).sum(),
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("instance_url", &self.inner.config.instance_url)
            .field("tables", &self.inner.catalog.len())
            .finish()
    }
}

impl RecordStore for MemoryStore {
    type Handle = MemoryRecord;

    fn table_exists(&self, table: &str) -> bool {
        self.inner.catalog.contains(table)
    }

    fn create_new(&self, table: &str, secure: bool) -> Result<MemoryRecord> {
        if !self.inner.catalog.contains(table) {
            return Err(RecordError::Store(format!("Unknown table: {table}")));
        }
        Ok(MemoryRecord {
            store: Arc::clone(&self.inner),
            table: table.to_string(),
            secure,
            identifier: None,
            values: Row::new(),
            is_new: true,
            exists: false,
        })
    }

    fn fetch_by_identifier(&self, table: &str, id: &str, secure: bool) -> Result<MemoryRecord> {
        fetch(&self.inner, table, id, secure)
    }

    fn is_eligible_identifier(&self, id: &str) -> bool {
        Identifier::is_eligible(id)
    }
}

/// Handle to one row of a [`MemoryStore`].
pub struct MemoryRecord {
    store: Arc<StoreInner>,
    table: String,
    secure: bool,
    identifier: Option<Identifier>,
    values: Row,
    is_new: bool,
    exists: bool,
}

impl MemoryRecord {
    fn empty(store: &Arc<StoreInner>, table: &str, secure: bool) -> Self {
        Self {
            store: Arc::clone(store),
            table: table.to_string(),
            secure,
            identifier: None,
            values: Row::new(),
            is_new: false,
            exists: false,
        }
    }

    fn schema(&self) -> Option<&TableSchema> {
        self.store.catalog.table(&self.table)
    }

    fn require_field(&self, field: &str) -> Result<&FieldSchema> {
        self.field_schema(field).ok_or_else(|| {
            RecordError::Store(format!("Unknown field {} on table {}", field, self.table))
        })
    }

    fn enforces(&self, operation: Operation, field: Option<&str>) -> bool {
        self.secure && !self.store.permits(&self.table, field, operation)
    }

    fn push_journal(&mut self, field: &str, value: &str) {
        let entry = JournalEntry {
            value: value.to_string(),
            created: Timestamp::now(),
        };
        match self.values.get_mut(field) {
            Some(FieldData::Journal(entries)) => entries.push(entry),
            _ => {
                self.values
                    .insert(field.to_string(), FieldData::Journal(vec![entry]));
            }
        }
    }
}

impl fmt::Debug for MemoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecord")
            .field("table", &self.table)
            .field("identifier", &self.identifier)
            .field("is_new", &self.is_new)
            .field("exists", &self.exists)
            .field("secure", &self.secure)
            .finish()
    }
}

impl RecordHandle for MemoryRecord {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn identifier(&self) -> String {
        self.identifier.map(|id| id.to_hex()).unwrap_or_default()
    }

    fn is_valid_record(&self) -> bool {
        self.is_new || self.exists
    }

    fn is_new_record(&self) -> bool {
        self.is_new
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn field_schema(&self, field: &str) -> Option<&FieldSchema> {
        self.schema()?.field(field)
    }

    fn table_label(&self, plural: bool) -> String {
        match self.schema() {
            Some(schema) if plural => schema.plural_label(),
            Some(schema) => schema.label().to_string(),
            None => self.table.clone(),
        }
    }

    fn display_value(&self) -> String {
        match self.schema() {
            Some(schema) => row_display(schema, &self.values, self.identifier),
            None => self.identifier(),
        }
    }

    fn field_display_value(&self, field: &str) -> Result<String> {
        let schema = self.require_field(field)?;
        let kind = schema.kind();
        let target = schema.reference.clone();

        let Some(raw) = self.value(field) else {
            return Ok(String::new());
        };

        match kind {
            FieldKind::Encrypted => Ok(MASKED_VALUE.to_string()),
            FieldKind::Journal => Ok(self
                .journal_entries(field)
                .into_iter()
                .map(|entry| entry.value)
                .collect::<Vec<_>>()
                .join("\n")),
            FieldKind::Reference => {
                let (Some(target), Some(id)) = (target, Identifier::from_hex(&raw)) else {
                    return Ok(raw);
                };
                let display = self
                    .store
                    .catalog
                    .table(&target)
                    .zip(self.store.load(&target, &id))
                    .map(|(schema, row)| row_display(schema, &row, Some(id)));
                Ok(display.unwrap_or_default())
            }
            _ => Ok(raw),
        }
    }

    fn can(&self, operation: Operation, field: Option<&str>) -> bool {
        self.store.permits(&self.table, field, operation)
    }

    fn value(&self, field: &str) -> Option<String> {
        if self.enforces(Operation::Read, Some(field)) {
            return None;
        }
        if field == IDENTIFIER_FIELD {
            if let Some(id) = self.identifier {
                return Some(id.to_hex());
            }
        }
        match self.values.get(field)? {
            FieldData::Text(text) if !text.is_empty() => Some(text.clone()),
            FieldData::Text(_) => None,
            FieldData::Journal(entries) => entries.last().map(|entry| entry.value.clone()),
        }
    }

    fn decrypted_value(&self, field: &str) -> Result<String> {
        if self.require_field(field)?.kind() != FieldKind::Encrypted {
            return Err(RecordError::Store(format!(
                "Field {} on table {} is not encrypted",
                field, self.table
            )));
        }
        match self.value(field) {
            Some(stored) => self.store.cipher.decrypt(&stored),
            None => Ok(String::new()),
        }
    }

    fn set_value(&mut self, field: &str, value: &str) -> Result<()> {
        let kind = self.require_field(field)?.kind();

        if field == IDENTIFIER_FIELD {
            if !self.is_new {
                return Err(RecordError::Store(format!(
                    "Identifier of a persisted row in {} cannot change",
                    self.table
                )));
            }
            let requested = value.trim();
            if !requested.is_empty() && !Identifier::is_eligible(requested) {
                warn!(table = %self.table, requested, "Rejected malformed identifier");
                return Err(RecordError::Store(format!(
                    "\"{}\" is not a valid identifier for table {}",
                    requested, self.table
                )));
            }
        }
        if self.enforces(Operation::Write, Some(field)) {
            debug!(table = %self.table, field, "Write denied, value ignored");
            return Ok(());
        }

        match kind {
            FieldKind::Journal => self.push_journal(field, value),
            _ => {
                self.values
                    .insert(field.to_string(), FieldData::Text(value.to_string()));
            }
        }
        Ok(())
    }

    fn set_display_value(&mut self, field: &str, value: &str) -> Result<()> {
        if self.require_field(field)?.kind() != FieldKind::Encrypted {
            return self.set_value(field, value);
        }
        if self.enforces(Operation::Write, Some(field)) {
            debug!(table = %self.table, field, "Write denied, value ignored");
            return Ok(());
        }

        let stored = if value.is_empty() {
            String::new()
        } else {
            self.store.cipher.encrypt(value)?
        };
        self.values.insert(field.to_string(), FieldData::Text(stored));
        Ok(())
    }

    fn append_journal_entry(&mut self, field: &str, value: &str) -> Result<()> {
        if self.require_field(field)?.kind() != FieldKind::Journal {
            return Err(RecordError::Store(format!(
                "Field {} on table {} is not a journal field",
                field, self.table
            )));
        }
        if self.enforces(Operation::Write, Some(field)) {
            debug!(table = %self.table, field, "Write denied, entry ignored");
            return Ok(());
        }
        if !value.trim().is_empty() {
            self.push_journal(field, value);
        }
        Ok(())
    }

    fn journal_entries(&self, field: &str) -> Vec<JournalEntry> {
        if self.enforces(Operation::Read, Some(field)) {
            return Vec::new();
        }
        match self.values.get(field) {
            Some(FieldData::Journal(entries)) => entries.iter().rev().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn reference_record(&self, field: &str) -> Result<MemoryRecord> {
        let schema = self.require_field(field)?;
        if schema.kind() != FieldKind::Reference {
            return Err(RecordError::Store(format!(
                "Field {} on table {} is not a reference",
                field, self.table
            )));
        }
        let target = schema.reference.clone().ok_or_else(|| {
            RecordError::Store(format!(
                "Reference field {} on table {} names no target table",
                field, self.table
            ))
        })?;

        match self.value(field) {
            Some(id) => fetch(&self.store, &target, &id, self.secure),
            None => {
                if !self.store.catalog.contains(&target) {
                    return Err(RecordError::Store(format!("Unknown table: {target}")));
                }
                Ok(MemoryRecord::empty(&self.store, &target, self.secure))
            }
        }
    }

    fn link(&self, no_stack: bool) -> String {
        let id = self
            .identifier
            .map(|id| id.to_hex())
            .unwrap_or_else(|| "-1".to_string());
        let base = self.store.config.instance_url.trim_end_matches('/');
        let mut link = format!("{}/{}.do?sys_id={}", base, self.table, id);
        if !no_stack {
            link.push_str(&format!("&sysparm_stack={}_list.do", self.table));
        }
        link
    }

    fn insert(&mut self) -> Result<Option<String>> {
        if !self.is_new {
            warn!(table = %self.table, "Insert on a row that is not new");
            return Ok(None);
        }
        if self.enforces(Operation::Create, None) {
            warn!(table = %self.table, "Create denied by access policy");
            return Ok(None);
        }

        let requested = match self.values.get(IDENTIFIER_FIELD) {
            Some(FieldData::Text(text)) => Identifier::from_hex(text.trim()),
            _ => None,
        };
        let id = requested.unwrap_or_else(|| self.store.next_identifier(&self.table));

        {
            let mut tables = self.store.tables.write();
            let rows = tables.entry(self.table.clone()).or_default();
            if rows.contains_key(&id) {
                warn!(table = %self.table, identifier = %id, "Insert rejected, identifier taken");
                return Ok(None);
            }
            self.values
                .insert(IDENTIFIER_FIELD.to_string(), FieldData::Text(id.to_hex()));
            rows.insert(id, self.values.clone());
        }

        self.store.counters.inserts.fetch_add(1, Ordering::Relaxed);
        self.identifier = Some(id);
        self.is_new = false;
        self.exists = true;

        debug!(table = %self.table, identifier = %id, "Row inserted");
        Ok(Some(id.to_hex()))
    }

    fn update(&mut self) -> Result<Option<String>> {
        let Some(id) = self.identifier.filter(|_| !self.is_new) else {
            warn!(table = %self.table, "Update on a row that was never inserted");
            return Ok(None);
        };
        if self.enforces(Operation::Write, None) {
            warn!(table = %self.table, identifier = %id, "Write denied by access policy");
            return Ok(None);
        }

        {
            let mut tables = self.store.tables.write();
            match tables.get_mut(&self.table).and_then(|rows| rows.get_mut(&id)) {
                Some(row) => *row = self.values.clone(),
                None => {
                    warn!(table = %self.table, identifier = %id, "Update target no longer exists");
                    return Ok(None);
                }
            }
        }

        self.store.counters.updates.fetch_add(1, Ordering::Relaxed);
        debug!(table = %self.table, identifier = %id, "Row updated");
        Ok(Some(id.to_hex()))
    }

    fn delete(&mut self) -> Result<bool> {
        let Some(id) = self.identifier else {
            return Ok(false);
        };
        if self.enforces(Operation::Delete, None) {
            warn!(table = %self.table, identifier = %id, "Delete denied by access policy");
            return Ok(false);
        }

        let removed = self
            .store
            .tables
            .write()
            .get_mut(&self.table)
            .and_then(|rows| rows.remove(&id))
            .is_some();

        if removed {
            self.exists = false;
            self.store.counters.deletes.fetch_add(1, Ordering::Relaxed);
            debug!(table = %self.table, identifier = %id, "Row deleted");
        }
        Ok(removed)
    }
}
