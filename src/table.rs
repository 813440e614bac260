//! Column-oriented tables of decoded messages.
//!
//! FIT declares field layouts at runtime, per local message type, and may
//! change them mid-document. Tables therefore grow their schema as messages
//! arrive: a field first seen in the tenth message of a kind gets a column
//! backfilled with nine nulls. Rows keep document order, and columns keep the
//! order fields were first seen.

use alloc::{collections::BTreeMap, format, string::String, vec, vec::Vec};

use crate::{
    avec::{self, DecodeOptions, Decoded, Error, MessageSink, Warning},
    profile::{FieldNames, message_name},
    sans::{
        data::{BaseType, DecodedMessage, FieldKey, Value},
        developer::DeveloperFieldDescription,
        header::FileHeader,
    },
};

/// The type of values in a column, taken from field definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Only undescribed developer fields have been seen.
    Unknown,
    Base(BaseType),
    /// Redefinitions declared the field with differing base types.
    Mixed,
}

/// A column of values for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    key: FieldKey,
    name: String,
    value_type: ColumnType,
    values: Vec<Option<Value>>,
    developer: Option<DeveloperFieldDescription>,
}

impl Column {
    fn new(key: FieldKey, rows: usize) -> Self {
        Self {
            key,
            name: format!("{key}"),
            value_type: ColumnType::Unknown,
            values: vec![None; rows],
            developer: None,
        }
    }

    fn observe_type(&mut self, base_type: Option<BaseType>) {
        self.value_type = match (self.value_type, base_type) {
            (t, None) => t,
            (ColumnType::Unknown, Some(b)) => ColumnType::Base(b),
            (ColumnType::Base(a), Some(b)) if a != b => ColumnType::Mixed,
            (t, Some(_)) => t,
        };
    }

    /// The column name: `field_<n>`, `dev_<i>_<n>`, or a resolved name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field this column holds.
    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// The declared type of the column's values.
    pub fn value_type(&self) -> ColumnType {
        self.value_type
    }

    /// The description of a developer field column, if one was seen.
    pub fn developer(&self) -> Option<&DeveloperFieldDescription> {
        self.developer.as_ref()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value in a row, `None` if absent or out of range.
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)?.as_ref()
    }

    /// All values, `None` where absent.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Iterate over the values in row order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(Option::as_ref)
    }

    /// Number of absent values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// All messages of one global message number, as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTable {
    global_message: u16,
    rows: usize,
    columns: Vec<Column>,
    index: BTreeMap<FieldKey, usize>,
}

impl MessageTable {
    /// An empty table.
    pub fn new(global_message: u16) -> Self {
        Self {
            global_message,
            rows: 0,
            columns: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// The global message number of every row.
    pub fn global_message_number(&self) -> u16 {
        self.global_message
    }

    /// The profile name of the message kind, if known.
    pub fn name(&self) -> Option<&'static str> {
        message_name(self.global_message)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Columns in order of first appearance.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in column order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// The column with a name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The column holding a field, whatever its name.
    pub fn column_by_key(&self, key: FieldKey) -> Option<&Column> {
        self.columns.get(*self.index.get(&key)?)
    }

    /// The values of a row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<Option<&Value>>> {
        (row < self.rows).then(|| self.columns.iter().map(|c| c.get(row)).collect())
    }

    /// Append a message as a row.
    ///
    /// Fields not seen before get a new column, null for all earlier rows.
    /// Columns the message lacks get a null. A field repeated within one
    /// message keeps its last value.
    pub fn push(&mut self, message: DecodedMessage) {
        let row = self.rows;

        for field in message.fields {
            let i = *self.index.entry(field.key).or_insert_with(|| {
                self.columns.push(Column::new(field.key, row));
                self.columns.len() - 1
            });

            let column = &mut self.columns[i];
            column.observe_type(field.base_type);

            if column.values.len() > row {
                column.values[row] = field.value;
            } else {
                column.values.push(field.value);
            }
        }

        self.rows += 1;

        for column in &mut self.columns {
            if column.values.len() < self.rows {
                column.values.push(None);
            }
        }
    }

    /// A copy of the table with columns renamed by [`MessageTable::rename`].
    pub fn renamed(&self, names: &(impl FieldNames + ?Sized)) -> MessageTable {
        let mut table = self.clone();
        table.rename(names);
        table
    }

    /// Rename columns with resolved field names.
    ///
    /// Native fields take names from `names`. Developer fields take the
    /// names from their field descriptions.
    pub fn rename(&mut self, names: &(impl FieldNames + ?Sized)) {
        for column in &mut self.columns {
            let name = match column.key {
                FieldKey::Native(number) => names.name_for(self.global_message, number),
                FieldKey::Developer { .. } => {
                    column.developer.as_ref().and_then(|d| d.name.as_deref())
                }
            };

            if let Some(name) = name {
                column.name = String::from(name);
            }
        }
    }

    /// Rename columns by current name. Names not present are ignored.
    pub fn rename_columns(&mut self, mapping: &BTreeMap<String, String>) {
        for column in &mut self.columns {
            if let Some(name) = mapping.get(column.name.as_str()) {
                column.name.clone_from(name);
            }
        }
    }

    /// A table of the named columns, in the order given. Names not present
    /// are skipped.
    pub fn select(&self, names: &[&str]) -> MessageTable {
        let mut table = MessageTable::new(self.global_message);
        table.rows = self.rows;

        for column in names.iter().filter_map(|n| self.column(n)) {
            if !table.index.contains_key(&column.key) {
                table.index.insert(column.key, table.columns.len());
                table.columns.push(column.clone());
            }
        }

        table
    }

    /// A table of at most the first `n` rows.
    pub fn head(&self, n: usize) -> MessageTable {
        let mut table = self.clone();
        table.truncate(n);
        table
    }

    /// Keep at most the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows = self.rows.min(n);
        for column in &mut self.columns {
            column.values.truncate(n);
        }
    }

    fn attach_developer_fields(&mut self, fields: &BTreeMap<(u8, u8), DeveloperFieldDescription>) {
        for column in &mut self.columns {
            if let FieldKey::Developer {
                developer_index,
                number,
            } = column.key
            {
                column.developer = fields.get(&(developer_index, number)).cloned();
            }
        }
    }
}

/// Tables for each global message number, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    tables: Vec<MessageTable>,
    index: BTreeMap<u16, usize>,
}

impl Tables {
    /// The table of a global message number.
    pub fn get(&self, global_message: u16) -> Option<&MessageTable> {
        self.tables.get(*self.index.get(&global_message)?)
    }

    /// The table of a global message number, mutably.
    pub fn get_mut(&mut self, global_message: u16) -> Option<&mut MessageTable> {
        self.tables.get_mut(*self.index.get(&global_message)?)
    }

    /// Remove and return a table.
    pub fn take(&mut self, global_message: u16) -> Option<MessageTable> {
        let i = self.index.remove(&global_message)?;
        let table = self.tables.remove(i);

        for j in self.index.values_mut() {
            if *j > i {
                *j -= 1;
            }
        }

        Some(table)
    }

    fn entry(&mut self, global_message: u16) -> &mut MessageTable {
        let i = *self.index.entry(global_message).or_insert_with(|| {
            self.tables.push(MessageTable::new(global_message));
            self.tables.len() - 1
        });
        &mut self.tables[i]
    }

    /// Global message numbers present, in order of first appearance.
    pub fn message_numbers(&self) -> impl Iterator<Item = u16> {
        self.tables.iter().map(MessageTable::global_message_number)
    }

    /// Profile names of the message kinds present, or `mesg_<n>` for
    /// unknown ones.
    pub fn message_names(&self) -> Vec<String> {
        self.message_numbers()
            .map(|n| match message_name(n) {
                Some(name) => String::from(name),
                None => format!("mesg_{n}"),
            })
            .collect()
    }

    /// Iterate over tables in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = &MessageTable> {
        self.tables.iter()
    }

    /// Number of message kinds present.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no messages were decoded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl IntoIterator for Tables {
    type Item = MessageTable;
    type IntoIter = vec::IntoIter<MessageTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

/// A [`MessageSink`] grouping messages into [`Tables`].
#[derive(Debug, Default)]
pub struct Aggregator {
    only: Option<u16>,
    tables: Tables,
    developer_fields: BTreeMap<(u8, u8), DeveloperFieldDescription>,
}

impl Aggregator {
    /// An aggregator keeping every message kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// An aggregator keeping a single message kind.
    pub fn only(global_message: u16) -> Self {
        Self {
            only: Some(global_message),
            ..Self::default()
        }
    }

    /// Complete the tables, attaching developer field descriptions to their
    /// columns.
    pub fn finish(mut self) -> Tables {
        for table in &mut self.tables.tables {
            table.attach_developer_fields(&self.developer_fields);
        }
        self.tables
    }
}

impl MessageSink for Aggregator {
    fn accepts(&self, global_message: u16) -> bool {
        self.only.is_none_or(|only| only == global_message)
    }

    fn add_message(&mut self, message: DecodedMessage) {
        self.tables.entry(message.global_message).push(message);
    }

    fn add_developer_field(&mut self, description: &DeveloperFieldDescription) {
        let key = (description.developer_index, description.number);
        self.developer_fields.insert(key, description.clone());
    }
}

/// Tables decoded from a document, with any warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitData {
    pub tables: Tables,
    pub headers: Vec<FileHeader>,
    pub warnings: Vec<Warning>,
}

impl FitData {
    /// The table of a global message number.
    pub fn table(&self, global_message: u16) -> Option<&MessageTable> {
        self.tables.get(global_message)
    }
}

/// Decode a slice of a document into tables.
pub fn read_slice(r: &[u8], options: DecodeOptions) -> Result<FitData, Error> {
    read_with(r, Aggregator::new(), options)
}

fn read_with(
    r: &[u8],
    mut aggregator: Aggregator,
    options: DecodeOptions,
) -> Result<FitData, Error> {
    let Decoded { headers, warnings } = avec::decode_slice(r, &mut aggregator, options)?;

    Ok(FitData {
        tables: aggregator.finish(),
        headers,
        warnings,
    })
}

/// Decode a single message kind from a slice of a document.
///
/// Returns an empty table if the document holds no such messages.
pub fn read_message(
    r: &[u8],
    global_message: u16,
    options: DecodeOptions,
) -> Result<(MessageTable, Vec<Warning>), Error> {
    let mut data = read_with(r, Aggregator::only(global_message), options)?;
    let table = data
        .tables
        .take(global_message)
        .unwrap_or_else(|| MessageTable::new(global_message));

    Ok((table, data.warnings))
}

/// Decode a file into tables.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
pub fn read_path(
    path: impl AsRef<std::path::Path>,
    options: DecodeOptions,
) -> Result<FitData, Error> {
    let r = std::fs::read(path)?;
    read_slice(&r, options)
}
