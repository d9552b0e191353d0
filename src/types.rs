//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Column holding the monetary amount compared between the two ledgers
pub const TAXABLE_VALUE_COLUMN: &str = "Taxable Value";

/// Column holding the counterparty email address on Payments-side rows
pub const EMAIL_COLUMN: &str = "email";

/// Column holding the counterparty display name on Payments-side rows
pub const TRADE_NAME_COLUMN: &str = "Trade/Legal name";

/// A single cell value in a table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FieldValue {
    /// Free-form text (names, addresses, references)
    Text(String),
    /// Exact decimal quantity (monetary values)
    Number(BigDecimal),
    /// Cell present in the row but carrying no value
    Empty,
}

impl FieldValue {
    /// Get the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the decimal content, if this is a numeric value
    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            FieldValue::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the cell carries no usable value
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<BigDecimal> for FieldValue {
    fn from(value: BigDecimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(BigDecimal::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(BigDecimal::from(value))
    }
}

/// One table row, keyed by GSTIN and carrying named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Tax-identifier key aligning this row across datasets
    pub gstin: String,
    /// Named cell values for this row
    pub fields: HashMap<String, FieldValue>,
}

impl Record {
    /// Create a new record with no fields
    pub fn new(gstin: impl Into<String>) -> Self {
        Self {
            gstin: gstin.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a field, consuming and returning the record for chaining
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field by column name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a field's text content by column name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// Get a field's decimal content by column name
    pub fn decimal(&self, name: &str) -> Option<&BigDecimal> {
        self.field(name).and_then(FieldValue::as_decimal)
    }
}

/// How a table builder treats repeated GSTIN keys within one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Fail the load with [`LoadError::DuplicateKey`]
    #[default]
    Reject,
    /// Collapse duplicates: numeric fields are summed, the first non-empty
    /// text value per column is kept
    SumValues,
}

/// An ordered table of records with unique GSTIN keys and declared columns
///
/// Built through [`SheetTableBuilder`], which enforces key uniqueness (or
/// collapses duplicates per policy) so lookups and set operations on keys
/// are unambiguous. Row order is the source order of the load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetTable {
    columns: Vec<String>,
    rows: Vec<Record>,
    index: HashMap<String, usize>,
}

impl SheetTable {
    /// Start building a table with the given declared columns
    pub fn builder<I, S>(columns: I) -> SheetTableBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SheetTableBuilder::new(columns)
    }

    /// Whether the table declares a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Declared column names, in declaration order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Look up the record for a GSTIN key
    pub fn get(&self, gstin: &str) -> Option<&Record> {
        self.index.get(gstin).map(|&at| &self.rows[at])
    }

    /// Whether a GSTIN key exists in this table
    pub fn contains_key(&self, gstin: &str) -> bool {
        self.index.contains_key(gstin)
    }

    /// GSTIN keys in source-row order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|record| record.gstin.as_str())
    }

    /// All records in source-row order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of records in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no records
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builder for [`SheetTable`]; validation happens at [`build`](Self::build)
#[derive(Debug, Clone)]
pub struct SheetTableBuilder {
    columns: Vec<String>,
    policy: DuplicateKeyPolicy,
    rows: Vec<Record>,
}

impl SheetTableBuilder {
    /// Create a builder declaring the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            policy: DuplicateKeyPolicy::default(),
            rows: Vec::new(),
        }
    }

    /// Set the duplicate-key policy applied at build time
    pub fn duplicate_key_policy(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a row in source order
    pub fn push_row(&mut self, record: Record) {
        self.rows.push(record);
    }

    /// Append a row, consuming and returning the builder for chaining
    pub fn row(mut self, record: Record) -> Self {
        self.push_row(record);
        self
    }

    /// Validate keys and produce the table
    pub fn build(self) -> LoadResult<SheetTable> {
        let mut rows: Vec<Record> = Vec::with_capacity(self.rows.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(self.rows.len());

        for (position, mut record) in self.rows.into_iter().enumerate() {
            let key = record.gstin.trim().to_string();
            if key.is_empty() {
                return Err(LoadError::EmptyKey { row: position });
            }
            record.gstin = key.clone();

            match index.get(&key) {
                None => {
                    index.insert(key, rows.len());
                    rows.push(record);
                }
                Some(&at) => match self.policy {
                    DuplicateKeyPolicy::Reject => {
                        return Err(LoadError::DuplicateKey { gstin: key });
                    }
                    DuplicateKeyPolicy::SumValues => collapse_into(&mut rows[at], record),
                },
            }
        }

        Ok(SheetTable {
            columns: self.columns,
            rows,
            index,
        })
    }
}

/// Merge a duplicate-key record into the row already holding its key.
///
/// Numeric fields accumulate; a text or empty slot is filled by the first
/// non-empty value seen for that column.
fn collapse_into(target: &mut Record, incoming: Record) {
    for (name, value) in incoming.fields {
        match target.fields.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => {
                let replace = match (slot.get_mut(), &value) {
                    (FieldValue::Number(total), FieldValue::Number(add)) => {
                        *total += add;
                        false
                    }
                    (FieldValue::Empty, _) => true,
                    (FieldValue::Text(current), _) => current.trim().is_empty(),
                    _ => false,
                };
                if replace {
                    slot.insert(value);
                }
            }
        }
    }
}

/// A multi-sheet dataset: sheet name to table, in deterministic name order
///
/// One dataset per side (Company, Payments) per reconciliation request;
/// immutable for the duration of the pass and dropped with the request.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    sheets: BTreeMap<String, SheetTable>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named sheet, replacing any previous table under that name
    pub fn insert_sheet(&mut self, name: impl Into<String>, table: SheetTable) {
        self.sheets.insert(name.into(), table);
    }

    /// Insert a sheet, consuming and returning the dataset for chaining
    pub fn with_sheet(mut self, name: impl Into<String>, table: SheetTable) -> Self {
        self.insert_sheet(name, table);
        self
    }

    /// Look up a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.get(name)
    }

    /// Sheet names in lexicographic order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Sheet names present in both datasets, in lexicographic order
    pub fn common_sheets(&self, other: &Dataset) -> Vec<String> {
        self.sheets
            .keys()
            .filter(|name| other.sheets.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Number of sheets
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Whether the dataset has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Errors raised while building tables from collaborator-supplied rows
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("row {row}: GSTIN key is empty")]
    EmptyKey { row: usize },
    #[error("duplicate GSTIN key '{gstin}' in sheet built with DuplicateKeyPolicy::Reject")]
    DuplicateKey { gstin: String },
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;
