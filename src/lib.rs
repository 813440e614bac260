#![no_std]

//! A decoder for Garmin's Flexible and Interoperable Data Transfer protocol,
//! producing column-oriented tables.
//!
//! FIT documents declare their own layout: definition records describe the
//! fields of the data records that follow, and may be replaced at any point.
//! Fitframe decodes every message into raw typed values, then groups them by
//! global message number into tables whose schema grows as fields appear.
//!
//! Most users should begin with [`read_path`] or [`read_slice`], or with
//! [`scan_path`] to defer decoding until a table is collected. The drivers in
//! the [`avec`] module publish individual messages to a
//! [`MessageSink`](avec::MessageSink), and the finite-state machine beneath
//! them is described in the [`sans`] module.
//!
//! Values are left as stored: scale, offset and units are profile concerns
//! for the caller. Field names can be applied with
//! [`MessageTable::renamed`] and a [`FieldNames`](profile::FieldNames)
//! implementation.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader and path decoding, and the [`lazy`] module
//!   (default).

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod avec;
#[cfg(feature = "std")]
pub mod lazy;
pub mod profile;
pub mod sans;
pub mod table;

pub use avec::{DecodeOptions, Error, Warning};
#[cfg(feature = "std")]
pub use lazy::{LazyFit, LazyTable, scan_bytes, scan_path};
pub use sans::data::{FieldKey, Value};
#[cfg(feature = "std")]
pub use table::read_path;
pub use table::{Column, ColumnType, FitData, MessageTable, Tables, read_slice};
