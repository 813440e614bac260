//! Drivers for the finite-state machine.
//!
//! The functions in this module decode documents from data slices and
//! readers, publishing each decoded data message to a [`MessageSink`]. The
//! [`crate::table`] module builds its column-oriented tables on top of them.
//!
//! Decoding either completes, returning the document headers and any
//! [`Warning`]s, or fails with a single [`Error`]. Problems confined to a
//! field (an undescribed developer field, a field of impossible size) leave
//! that field absent and are reported as warnings. So is a check value
//! mismatch, unless [`DecodeOptions::with_strict`] is set.

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

use alloc::vec::Vec;

use thiserror::Error;

use crate::sans::{
    bytes::Truncated,
    data::{BaseType, DecodedMessage, FieldError, FieldKey},
    developer::DeveloperFieldDescription,
    header::{FileHeader, HeaderError},
};

#[cfg(feature = "std")]
pub use reader::{decode as decode_reader, decode_path};
pub use slice::decode as decode_slice;

/// Errors aborting the decoding of a document.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    InvalidSignature,
    /// Unknown header length.
    #[error("Unsupported header length ({0}).")]
    UnsupportedHeaderSize(u8),
    /// Unexpectedly reached the end of the input.
    #[error("Unexpectedly reached the end of the input. {0}")]
    TruncatedInput(#[from] Truncated),
    /// A record ran past the end of the record section.
    #[error("Record at offset {offset} runs past the end of the record section ({end}).")]
    MalformedStream { offset: usize, end: usize },
    /// A data record used a local message type with no definition.
    #[error("Found data for undefined local message type {0}.")]
    UndefinedLocalMessageType(u8),
    /// A definition used a base type outside the protocol's closed set.
    #[error("Unsupported base type (0x{0:02X}).")]
    UnsupportedBaseType(u8),
    /// Calculated and found CRC values do not match (strict mode only).
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    ChecksumMismatch { found: u16, calculated: u16 },
    /// Calculated and found header CRC values do not match (strict mode only).
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    HeaderChecksumMismatch { found: u16, calculated: u16 },
}

impl From<HeaderError> for Error {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::InvalidSignature => Self::InvalidSignature,
            HeaderError::UnsupportedHeaderSize(size) => Self::UnsupportedHeaderSize(size),
        }
    }
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::UnsupportedBaseType(kind) => Self::UnsupportedBaseType(kind),
            FieldError::Truncated(err) => Self::TruncatedInput(err),
        }
    }
}

/// Non-fatal problems found while decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    ChecksumMismatch { found: u16, calculated: u16 },
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    HeaderChecksumMismatch { found: u16, calculated: u16 },
    /// A developer field was used before its description.
    #[error(
        "Developer field {developer_index}:{number} in message {global_message} has no description."
    )]
    UnknownDeveloperField {
        global_message: u16,
        developer_index: u8,
        number: u8,
    },
    /// A field size was not a multiple of its base type's width.
    #[error(
        "Field {key} in message {global_message} has {size} bytes, not whole {base_type} elements."
    )]
    FieldSizeMismatch {
        global_message: u16,
        key: FieldKey,
        size: usize,
        base_type: BaseType,
    },
    /// A compressed timestamp header preceded any full timestamp.
    #[error("Compressed timestamp in message {global_message} has no reference timestamp.")]
    MissingTimeReference { global_message: u16 },
    /// Bytes after the last document that do not begin another document.
    #[error("Ignored {count} trailing bytes at offset {offset}.")]
    TrailingBytes { offset: usize, count: usize },
}

/// Options controlling decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail on check value mismatches instead of warning.
    pub strict: bool,
    /// Compare non-zero header check values.
    pub validate_header_crc: bool,
    /// Decode further documents following the first.
    pub chained: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    /// Default options: lenient, checking header CRCs, following chained documents.
    pub const fn new() -> Self {
        Self {
            strict: false,
            validate_header_crc: true,
            chained: true,
        }
    }

    /// Set whether check value mismatches fail decoding.
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether non-zero header check values are compared.
    pub const fn with_header_crc(mut self, validate: bool) -> Self {
        self.validate_header_crc = validate;
        self
    }

    /// Set whether documents following the first are decoded.
    pub const fn with_chained(mut self, chained: bool) -> Self {
        self.chained = chained;
        self
    }
}

/// Outcome of a successful decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Headers of each decoded document, in order.
    pub headers: Vec<FileHeader>,
    pub warnings: Vec<Warning>,
}

/// Receive decoded messages from a document.
///
/// See [`crate::table::Aggregator`] for the implementation building tables.
pub trait MessageSink {
    /// Whether messages with a global message number should be published.
    ///
    /// Messages are decoded regardless, since developer field descriptions
    /// are needed to decode later messages.
    fn accepts(&self, global_message: u16) -> bool {
        let _ = global_message;
        true
    }

    /// Add a decoded data message.
    fn add_message(&mut self, message: DecodedMessage);

    /// Add a developer field description as it is catalogued.
    fn add_developer_field(&mut self, description: &DeveloperFieldDescription) {
        let _ = description;
    }
}

impl MessageSink for Vec<DecodedMessage> {
    fn add_message(&mut self, message: DecodedMessage) {
        self.push(message);
    }
}
