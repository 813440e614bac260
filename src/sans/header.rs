//! States processing document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::{data::Data, definition::Definition};

/// An error advancing over a document header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    InvalidSignature,
    /// Unknown header length.
    #[error("Unsupported header length ({0}).")]
    UnsupportedHeaderSize(u8),
}

/// The document header preceding the record section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Length of the header in bytes, either 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header, excluding the trailing
    /// check value.
    pub data_size: u32,
    /// The `.FIT` marker.
    pub signature: [u8; 4],
    /// Check value over the first 12 bytes, present in 14-byte headers.
    /// Writers may store zero to signal that it was not computed.
    pub crc: Option<u16>,
}

impl FileHeader {
    /// The major protocol version, from the upper nibble.
    pub fn protocol_major(&self) -> u8 {
        self.protocol_version >> 4
    }
}

/// State token to decode a document header.
#[derive(Debug)]
pub struct DocumentHeader;

impl DocumentHeader {
    /// Transition to another state by decoding a document header.
    ///
    /// Returns the header (without its check value, which follows in
    /// extended headers), and a successor state token.
    pub fn advance(
        r: [u8; 12],
    ) -> Result<(FileHeader, Either<ExtendedDocumentHeader, RecordHeader>), HeaderError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct RawHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let RawHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(r);

        if &data_type != b".FIT" {
            Err(HeaderError::InvalidSignature)?;
        }

        let successor = match header_size {
            14 => Left(ExtendedDocumentHeader(())),
            12 => Right(RecordHeader(())),
            _ => Err(HeaderError::UnsupportedHeaderSize(header_size))?,
        };

        let header = FileHeader {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            signature: data_type,
            crc: None,
        };

        Ok((header, successor))
    }
}

/// State token to decode additional bytes of an extended document header.
#[derive(Debug)]
pub struct ExtendedDocumentHeader(pub(super) ());

impl ExtendedDocumentHeader {
    /// Transition to another state by decoding the additional bytes of an
    /// extended document header.
    ///
    /// Returns the header check value, and the successor state token.
    pub fn advance(self, r: [u8; 2]) -> (u16, RecordHeader) {
        (u16::from_le_bytes(r), RecordHeader(()))
    }
}

/// State token to decode a record header.
#[derive(Debug)]
pub struct RecordHeader(pub(super) ());

impl RecordHeader {
    /// Transition to another state by decoding a record header.
    ///
    /// Returns the local message number, and a successor state token. Data
    /// tokens carry the time offset of compressed timestamp headers.
    pub fn advance(self, r: [u8; 1]) -> (u8, Either<Definition, Data>) {
        let r = r[0];

        bitfield! {
            struct RecordHeader(u8) {
                [7] is_compressed,
            }
        }

        let header = RecordHeader(r);

        if header.is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(r);

            let successor = Right(Data {
                time_offset: Some(header.time_offset()),
            });

            (header.local_message(), successor)
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(r);

            let successor = if header.is_definition() {
                Left(Definition {
                    has_developer_fields: header.is_developer(),
                })
            } else {
                Right(Data { time_offset: None })
            };

            (header.local_message(), successor)
        }
    }
}
