//! Schema catalog: tables, their fields and the field type tags.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Name of the primary key column every table carries.
pub const IDENTIFIER_FIELD: &str = "sys_id";

/// Type tag for two-way encrypted text.
pub const TYPE_ENCRYPTED: &str = "password2";

/// Type tag for reference fields.
pub const TYPE_REFERENCE: &str = "reference";

/// How values of a field are read and written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Text-like values stored as given.
    Plain,
    /// Two-way encrypted text; written through the display path.
    Encrypted,
    /// Append-only journal; writes add an entry.
    Journal,
    /// Key into another table.
    Reference,
    /// Any other type tag (numbers, dates, choices, ...).
    Other(String),
}

impl FieldKind {
    /// Resolve the kind for a schema type tag.
    pub fn from_internal_type(internal_type: &str) -> Self {
        match internal_type {
            TYPE_ENCRYPTED => FieldKind::Encrypted,
            "journal" | "journal_input" | "journal_list" => FieldKind::Journal,
            TYPE_REFERENCE => FieldKind::Reference,
            "string" | "GUID" | "html" | "url" | "email" | "translated_text" => FieldKind::Plain,
            other => FieldKind::Other(other.to_string()),
        }
    }
}

/// Definition of a single column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,

    /// Human-readable label; defaults to the name.
    #[serde(default)]
    pub label: Option<String>,

    /// Internal type tag, e.g. "string", "reference", "glide_date_time".
    #[serde(rename = "type")]
    pub internal_type: String,

    /// Target table for reference fields.
    #[serde(default)]
    pub reference: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, internal_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            internal_type: internal_type.into(),
            reference: None,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Make this a reference field pointing at `table`.
    pub fn referencing(mut self, table: impl Into<String>) -> Self {
        self.internal_type = TYPE_REFERENCE.to_string();
        self.reference = Some(table.into());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> FieldKind {
        FieldKind::from_internal_type(&self.internal_type)
    }
}

/// Definition of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    /// Plural label; defaults to the label with an "s" appended.
    #[serde(default)]
    pub plural: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldSchema>,

    /// Field used as the row's display value.
    #[serde(default)]
    pub display_field: Option<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            plural: None,
            fields: Vec::new(),
            display_field: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn plural_label(&self) -> String {
        match &self.plural {
            Some(plural) => plural.clone(),
            None => format!("{}s", self.label()),
        }
    }

    /// Look up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Add the identifier column if the definition omitted it.
    fn ensure_identifier_field(&mut self) {
        if self.field(IDENTIFIER_FIELD).is_none() {
            self.fields
                .insert(0, FieldSchema::new(IDENTIFIER_FIELD, "GUID").with_label("Sys ID"));
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    tables: Vec<TableSchema>,
}

/// All tables known to a store.
#[derive(Clone, Debug, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any previous definition with the same name.
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, mut table: TableSchema) {
        table.ensure_identifier_field();
        self.tables.insert(table.name.clone(), table);
    }

    /// Parse a catalog from its JSON form: `{"tables": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for table in file.tables {
            catalog.insert(table);
        }
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
