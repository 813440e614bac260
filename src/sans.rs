//! Internal finite-state machine for implementing decoders.
//!
//! This module is intended for applications that need fine control over
//! decoder internals. See [`crate::avec`] for the drivers used by the table
//! interfaces.
//!
//! # Architecture
//!
//! All states are represented by a non-copy token. Once enough bytes are
//! ready, transition to another state by calling the token's `advance`
//! method. This will return a successor state token, along with any extracted
//! data.
//!
//! Definition records are decoded field by field into a
//! [`definition::MessageDefinition`], which the driver keeps against its local
//! message type. A data record is decoded in one step from the bytes its
//! definition describes, resolving developer fields against a
//! [`developer::DeveloperCatalog`].
//!
//! Only the initial state, re-exported for convenience as [`Decoder`], can be
//! constructed.
//!
//! Some areas of the decoding process are not represented in the finite-state
//! machine and are left to the driver:
//!
//! - Reading bytes from the correct place in the document.
//!
//! - Ending decoding once the specified number of document bytes have been
//! read.
//!
//! - Applying cyclic redundancy checks (see [`check`]), resolving compressed
//! timestamps (see [`time`]) and feeding developer data messages to the
//! catalog.

pub mod bytes;
pub mod check;
pub mod data;
pub mod definition;
pub mod developer;
pub mod header;
pub mod time;

/// Entrypoint to the finite-state machine.
pub type Decoder = header::DocumentHeader;
