//! Deferred decoding.
//!
//! [`scan_path`] and [`scan_bytes`] only record where a document is.
//! Operations on a [`LazyTable`] are recorded too, and applied when the table
//! is collected. Nothing is read or decoded, and no error can surface, until
//! [`LazyTable::collect`], [`LazyTable::head`] or [`LazyFit::collect`].
//!
//! _Requires Cargo feature `std`._

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    string::String,
    sync::Arc,
    vec::Vec,
};

use log::debug;

use crate::{
    avec::{DecodeOptions, Error, Warning},
    profile::{FieldNames, mesg_num},
    table::{FitData, MessageTable, read_message, read_slice},
};

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl Source {
    fn with_bytes<T>(&self, f: impl FnOnce(&[u8]) -> Result<T, Error>) -> Result<T, Error> {
        match self {
            Self::Path(path) => {
                debug!("Reading {}.", path.display());
                f(&std::fs::read(path)?)
            }
            Self::Bytes(r) => f(r),
        }
    }
}

/// A document to be decoded on demand.
#[derive(Debug, Clone)]
pub struct LazyFit {
    source: Source,
    options: DecodeOptions,
}

/// Refer to a document by path, without opening it.
pub fn scan_path(path: impl AsRef<Path>) -> LazyFit {
    LazyFit {
        source: Source::Path(path.as_ref().to_path_buf()),
        options: DecodeOptions::default(),
    }
}

/// Refer to a document in memory, without decoding it.
pub fn scan_bytes(r: impl Into<Arc<[u8]>>) -> LazyFit {
    LazyFit {
        source: Source::Bytes(r.into()),
        options: DecodeOptions::default(),
    }
}

impl LazyFit {
    /// Decode with the given options.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// The options used on collection.
    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// A deferred table of one message kind.
    pub fn message(&self, global_message: u16) -> LazyTable {
        LazyTable {
            source: self.source.clone(),
            options: self.options,
            global_message,
            operations: Vec::new(),
        }
    }

    /// A deferred table of `record` messages.
    pub fn records(&self) -> LazyTable {
        self.message(mesg_num::RECORD)
    }

    /// Decode every message kind.
    pub fn collect(&self) -> Result<FitData, Error> {
        self.source.with_bytes(|r| read_slice(r, self.options))
    }
}

#[derive(Clone)]
enum Operation {
    Select(Vec<String>),
    Limit(usize),
    Rename(BTreeMap<String, String>),
    RenameWith(Arc<dyn FieldNames + Send + Sync>),
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(names) => f.debug_tuple("Select").field(names).finish(),
            Self::Limit(n) => f.debug_tuple("Limit").field(n).finish(),
            Self::Rename(mapping) => f.debug_tuple("Rename").field(mapping).finish(),
            Self::RenameWith(_) => f.debug_tuple("RenameWith").finish_non_exhaustive(),
        }
    }
}

impl Operation {
    fn apply(&self, table: &mut MessageTable) {
        match self {
            Self::Select(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                *table = table.select(&names);
            }
            Self::Limit(n) => table.truncate(*n),
            Self::Rename(mapping) => table.rename_columns(mapping),
            Self::RenameWith(names) => table.rename(names.as_ref()),
        }
    }
}

/// A table of one message kind, with operations applied on collection.
#[derive(Debug, Clone)]
pub struct LazyTable {
    source: Source,
    options: DecodeOptions,
    global_message: u16,
    operations: Vec<Operation>,
}

impl LazyTable {
    /// The global message number this table collects.
    pub fn global_message_number(&self) -> u16 {
        self.global_message
    }

    /// Keep the named columns, in the order given.
    pub fn select<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        self.operations.push(Operation::Select(names));
        self
    }

    /// Keep at most the first `n` rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.operations.push(Operation::Limit(n));
        self
    }

    /// Rename columns by current name.
    pub fn rename<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.operations.push(Operation::Rename(mapping));
        self
    }

    /// Rename columns with resolved field names.
    pub fn rename_with(mut self, names: impl FieldNames + Send + Sync + 'static) -> Self {
        self.operations.push(Operation::RenameWith(Arc::new(names)));
        self
    }

    /// Decode the document and apply the recorded operations, also
    /// returning decoding warnings.
    pub fn collect_with_warnings(&self) -> Result<(MessageTable, Vec<Warning>), Error> {
        debug!(
            "Collecting message {} with {} deferred operations.",
            self.global_message,
            self.operations.len()
        );

        let (mut table, warnings) = self
            .source
            .with_bytes(|r| read_message(r, self.global_message, self.options))?;

        for operation in &self.operations {
            operation.apply(&mut table);
        }

        Ok((table, warnings))
    }

    /// Decode the document and apply the recorded operations.
    ///
    /// A document without this message kind collects to an empty table.
    pub fn collect(&self) -> Result<MessageTable, Error> {
        Ok(self.collect_with_warnings()?.0)
    }

    /// Collect at most the first `n` rows.
    pub fn head(&self, n: usize) -> Result<MessageTable, Error> {
        self.clone().limit(n).collect()
    }
}
