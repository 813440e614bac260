//! States processing definition records.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use zerocopy::FromBytes;

use super::{
    bytes::ByteOrder,
    data::{BaseType, FieldError},
    header::RecordHeader,
};

/// Layout of one field in the data records of a local message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field number, as listed in the profile for the global message.
    pub number: u8,
    /// Size in bytes. Multiples of the base type width denote arrays.
    pub size: u8,
    pub base_type: BaseType,
}

/// Layout of one developer field in the data records of a local message
/// type. The base type is only known from a prior field description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_index: u8,
}

/// A definition record, held against its local message type until the same
/// slot is redefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    pub local_message: u8,
    pub global_message: u16,
    pub byte_order: ByteOrder,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl MessageDefinition {
    /// A definition with no fields yet.
    pub fn new(local_message: u8, global_message: u16, byte_order: ByteOrder) -> Self {
        Self {
            local_message,
            global_message,
            byte_order,
            fields: Vec::new(),
            developer_fields: Vec::new(),
        }
    }

    /// Number of bytes in each data record using this definition.
    pub fn data_size(&self) -> usize {
        let native = self.fields.iter().map(|f| f.size as usize);
        let developer = self.developer_fields.iter().map(|f| f.size as usize);
        native.chain(developer).sum()
    }
}

/// Successor after the last native field definition.
pub type FieldsEnd = Either<DeveloperFieldCount, RecordHeader>;

fn fields_end(has_developer_fields: bool) -> FieldsEnd {
    if has_developer_fields {
        Left(DeveloperFieldCount(()))
    } else {
        Right(RecordHeader(()))
    }
}

/// State token to decode the fixed part of a definition message.
#[derive(Debug)]
pub struct Definition {
    pub(crate) has_developer_fields: bool,
}

impl Definition {
    /// Whether the record header flagged trailing developer field
    /// definitions.
    pub fn has_developer_fields(&self) -> bool {
        self.has_developer_fields
    }

    /// Transition to another state by decoding the fixed part of a definition
    /// message.
    ///
    /// Returns the byte order and global message number, and a successor
    /// state token.
    pub fn advance(self, r: [u8; 5]) -> (ByteOrder, u16, Either<DefinitionField, FieldsEnd>) {
        #[repr(C, packed)]
        #[derive(Debug, FromBytes)]
        struct DefinitionMessage {
            _reserved: u8,
            architecture: u8,
            global_message: [u8; 2],
            fields_remaining: u8,
        }

        let DefinitionMessage {
            architecture,
            global_message,
            fields_remaining,
            ..
        } = zerocopy::transmute!(r);

        let byte_order = ByteOrder::from_architecture(architecture);
        let global_message = match byte_order {
            ByteOrder::LittleEndian => u16::from_le_bytes(global_message),
            ByteOrder::BigEndian => u16::from_be_bytes(global_message),
        };

        let successor = if fields_remaining != 0 {
            Left(DefinitionField {
                fields_remaining,
                has_developer_fields: self.has_developer_fields,
            })
        } else {
            Right(fields_end(self.has_developer_fields))
        };

        (byte_order, global_message, successor)
    }
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    kind: u8,
}

/// State token to decode a field definition.
#[derive(Debug)]
pub struct DefinitionField {
    pub(crate) fields_remaining: u8,
    pub(crate) has_developer_fields: bool,
}

impl DefinitionField {
    /// Transition to another state by decoding a field definition.
    ///
    /// Returns the field definition, and a successor state token. Fails on
    /// base types outside the protocol's closed set.
    pub fn advance(
        self,
        r: [u8; 3],
    ) -> Result<(FieldDefinition, Either<DefinitionField, FieldsEnd>), FieldError> {
        let FieldHeader { field, size, kind } = zerocopy::transmute!(r);

        let definition = FieldDefinition {
            number: field,
            size,
            base_type: BaseType::try_from(kind)?,
        };

        let fields_remaining = self.fields_remaining - 1;

        let successor = if fields_remaining != 0 {
            Left(DefinitionField {
                fields_remaining,
                has_developer_fields: self.has_developer_fields,
            })
        } else {
            Right(fields_end(self.has_developer_fields))
        };

        Ok((definition, successor))
    }
}

/// State token to decode the number of developer field definitions.
#[derive(Debug)]
pub struct DeveloperFieldCount(pub(super) ());

impl DeveloperFieldCount {
    /// Transition to another state by decoding the developer field count.
    ///
    /// Returns a successor state token.
    pub fn advance(self, r: [u8; 1]) -> Either<DeveloperField, RecordHeader> {
        match r[0] {
            0 => Right(RecordHeader(())),
            fields_remaining => Left(DeveloperField { fields_remaining }),
        }
    }
}

/// State token to decode a developer field definition.
#[derive(Debug)]
pub struct DeveloperField {
    pub(crate) fields_remaining: u8,
}

impl DeveloperField {
    /// Transition to another state by decoding a developer field definition.
    ///
    /// Returns the developer field definition, and a successor state token.
    pub fn advance(
        self,
        r: [u8; 3],
    ) -> (DeveloperFieldDefinition, Either<DeveloperField, RecordHeader>) {
        let FieldHeader { field, size, kind } = zerocopy::transmute!(r);

        let definition = DeveloperFieldDefinition {
            number: field,
            size,
            developer_index: kind,
        };

        let successor = match self.fields_remaining - 1 {
            0 => Right(RecordHeader(())),
            fields_remaining => Left(DeveloperField { fields_remaining }),
        };

        (definition, successor)
    }
}
