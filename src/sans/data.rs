//! States processing data records, and the base types their fields hold.

use alloc::{string::String, vec::Vec};
use core::fmt;

use thiserror::Error;

use super::{
    bytes::{ByteOrder, ByteReader, Truncated},
    definition::MessageDefinition,
    developer::DeveloperCatalog,
    header::RecordHeader,
};

/// Field number of the `timestamp` field shared by all messages.
pub const TIMESTAMP_FIELD: u8 = 253;

/// An error decoding field definitions or values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// A base type outside the protocol's closed set.
    #[error("Unsupported base type (0x{0:02X}).")]
    UnsupportedBaseType(u8),
    /// A data record ended before its definition did.
    #[error(transparent)]
    Truncated(#[from] Truncated),
}

/// Primitive encodings of field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BaseType {
    Enum = 0x00,
    SInt8 = 0x01,
    UInt8 = 0x02,
    SInt16 = 0x83,
    UInt16 = 0x84,
    SInt32 = 0x85,
    UInt32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    UInt8z = 0x0A,
    UInt16z = 0x8B,
    UInt32z = 0x8C,
    Byte = 0x0D,
    SInt64 = 0x8E,
    UInt64 = 0x8F,
    UInt64z = 0x90,
}

impl TryFrom<u8> for BaseType {
    type Error = FieldError;

    /// Identify a base type by its number. The endian-ability flag in bit 7
    /// is implied by the number, and bits 5 and 6 are reserved.
    fn try_from(r: u8) -> Result<Self, FieldError> {
        Ok(match r & 0x7F {
            0x00 => Self::Enum,
            0x01 => Self::SInt8,
            0x02 => Self::UInt8,
            0x03 => Self::SInt16,
            0x04 => Self::UInt16,
            0x05 => Self::SInt32,
            0x06 => Self::UInt32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::UInt8z,
            0x0B => Self::UInt16z,
            0x0C => Self::UInt32z,
            0x0D => Self::Byte,
            0x0E => Self::SInt64,
            0x0F => Self::UInt64,
            0x10 => Self::UInt64z,
            _ => Err(FieldError::UnsupportedBaseType(r))?,
        })
    }
}

impl BaseType {
    /// Width in bytes of a single element.
    pub fn width(self) -> usize {
        match self {
            Self::Enum | Self::SInt8 | Self::UInt8 | Self::UInt8z => 1,
            Self::String | Self::Byte => 1,
            Self::SInt16 | Self::UInt16 | Self::UInt16z => 2,
            Self::SInt32 | Self::UInt32 | Self::UInt32z | Self::Float32 => 4,
            Self::SInt64 | Self::UInt64 | Self::UInt64z | Self::Float64 => 8,
        }
    }

    /// The name used for this base type in the profile.
    pub fn name(self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::SInt8 => "sint8",
            Self::UInt8 => "uint8",
            Self::SInt16 => "sint16",
            Self::UInt16 => "uint16",
            Self::SInt32 => "sint32",
            Self::UInt32 => "uint32",
            Self::String => "string",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::UInt8z => "uint8z",
            Self::UInt16z => "uint16z",
            Self::UInt32z => "uint32z",
            Self::Byte => "byte",
            Self::SInt64 => "sint64",
            Self::UInt64 => "uint64",
            Self::UInt64z => "uint64z",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded field value.
///
/// Values are raw: profile scale and offset are left to the consumer. The
/// `z` base types share the representation of their plain counterparts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Enum(u8),
    SInt8(i8),
    UInt8(u8),
    SInt16(i16),
    UInt16(u16),
    SInt32(i32),
    UInt32(u32),
    SInt64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    /// An opaque `byte` field.
    Bytes(Vec<u8>),
    /// A fixed-length array, each element absent if it held the invalid
    /// marker.
    Array(Vec<Option<Value>>),
}

impl Value {
    /// The value as an unsigned integer, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Enum(x) | Self::UInt8(x) => Some(x.into()),
            Self::UInt16(x) => Some(x.into()),
            Self::UInt32(x) => Some(x.into()),
            Self::UInt64(x) => Some(x),
            Self::SInt8(x) => u64::try_from(x).ok(),
            Self::SInt16(x) => u64::try_from(x).ok(),
            Self::SInt32(x) => u64::try_from(x).ok(),
            Self::SInt64(x) => u64::try_from(x).ok(),
            _ => None,
        }
    }

    /// The value as a signed integer, if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::SInt8(x) => Some(x.into()),
            Self::SInt16(x) => Some(x.into()),
            Self::SInt32(x) => Some(x.into()),
            Self::SInt64(x) => Some(x),
            _ => self.as_u64().and_then(|x| i64::try_from(x).ok()),
        }
    }

    /// The value as a float, converting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float32(x) => Some(x.into()),
            Self::Float64(x) => Some(x),
            Self::SInt8(_) | Self::SInt16(_) | Self::SInt32(_) | Self::SInt64(_) => {
                self.as_i64().map(|x| x as f64)
            }
            _ => self.as_u64().map(|x| x as f64),
        }
    }

    /// The value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The elements of an array value, if it is one.
    pub fn as_array(&self) -> Option<&[Option<Value>]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(x) | Self::UInt8(x) => write!(f, "{x}"),
            Self::SInt8(x) => write!(f, "{x}"),
            Self::SInt16(x) => write!(f, "{x}"),
            Self::UInt16(x) => write!(f, "{x}"),
            Self::SInt32(x) => write!(f, "{x}"),
            Self::UInt32(x) => write!(f, "{x}"),
            Self::SInt64(x) => write!(f, "{x}"),
            Self::UInt64(x) => write!(f, "{x}"),
            Self::Float32(x) => write!(f, "{x}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => {
                for x in b {
                    write!(f, "{x:02x}")?;
                }
                Ok(())
            }
            Self::Array(a) => {
                f.write_str("[")?;
                for (i, x) in a.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    match x {
                        Some(x) => write!(f, "{x}")?,
                        None => f.write_str("null")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

/// A field size that is not a positive multiple of its base type's width.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Field of {size} bytes does not hold whole {base_type} elements.")]
pub struct SizeMismatch {
    pub size: usize,
    pub base_type: BaseType,
}

/// Decode the raw bytes of one field.
///
/// Returns `None` where the field holds its base type's invalid marker. For
/// arrays, elements are checked individually, and the whole field is absent
/// only if every element is.
pub fn decode_field(
    base_type: BaseType,
    r: &[u8],
    order: ByteOrder,
) -> Result<Option<Value>, SizeMismatch> {
    let width = base_type.width();

    if r.is_empty() || r.len() % width != 0 {
        Err(SizeMismatch {
            size: r.len(),
            base_type,
        })?;
    }

    match base_type {
        BaseType::String => {
            let value = ByteReader::new(r).read_string(r.len()).ok().flatten();
            return Ok(value.map(Value::String));
        }
        BaseType::Byte => {
            let valid = r.iter().any(|b| *b != u8::MAX);
            return Ok(valid.then(|| Value::Bytes(r.to_vec())));
        }
        _ => (),
    }

    let count = r.len() / width;
    let mut reader = ByteReader::new(r);

    if count == 1 {
        return Ok(decode_element(base_type, &mut reader, order));
    }

    let elements: Vec<_> = (0..count)
        .map(|_| decode_element(base_type, &mut reader, order))
        .collect();

    Ok(elements
        .iter()
        .any(Option::is_some)
        .then_some(Value::Array(elements)))
}

/// Decode a single element, comparing against the invalid marker.
fn decode_element(base_type: BaseType, r: &mut ByteReader, order: ByteOrder) -> Option<Value> {
    macro_rules! element {
        ($read:expr, $invalid:expr, $variant:ident) => {{
            let x = $read.ok()?;
            (x != $invalid).then_some(Value::$variant(x))
        }};
    }

    match base_type {
        BaseType::Enum => element!(r.read_u8(), u8::MAX, Enum),
        BaseType::UInt8 => element!(r.read_u8(), u8::MAX, UInt8),
        BaseType::UInt8z => element!(r.read_u8(), u8::MIN, UInt8),
        BaseType::SInt8 => element!(r.read_i8(), i8::MAX, SInt8),
        BaseType::UInt16 => element!(r.read_u16(order), u16::MAX, UInt16),
        BaseType::UInt16z => element!(r.read_u16(order), u16::MIN, UInt16),
        BaseType::SInt16 => element!(r.read_i16(order), i16::MAX, SInt16),
        BaseType::UInt32 => element!(r.read_u32(order), u32::MAX, UInt32),
        BaseType::UInt32z => element!(r.read_u32(order), u32::MIN, UInt32),
        BaseType::SInt32 => element!(r.read_i32(order), i32::MAX, SInt32),
        BaseType::UInt64 => element!(r.read_u64(order), u64::MAX, UInt64),
        BaseType::UInt64z => element!(r.read_u64(order), u64::MIN, UInt64),
        BaseType::SInt64 => element!(r.read_i64(order), i64::MAX, SInt64),
        // Floats have no marker; the all-ones pattern passes through as NaN.
        BaseType::Float32 => r.read_f32(order).ok().map(Value::Float32),
        BaseType::Float64 => r.read_f64(order).ok().map(Value::Float64),
        BaseType::String | BaseType::Byte => r.read_u8().ok().map(Value::UInt8),
    }
}

/// Identifies a column: a native field number, or a developer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Native(u8),
    Developer { developer_index: u8, number: u8 },
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(number) => write!(f, "field_{number}"),
            Self::Developer {
                developer_index,
                number,
            } => write!(f, "dev_{developer_index}_{number}"),
        }
    }
}

/// One field of a decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub key: FieldKey,
    /// The declared base type, unknown for undescribed developer fields.
    pub base_type: Option<BaseType>,
    pub value: Option<Value>,
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub global_message: u16,
    pub local_message: u8,
    /// Time offset of a compressed timestamp header, if one was used.
    pub time_offset: Option<u8>,
    /// Fields in definition order, native fields first.
    pub fields: Vec<DecodedField>,
}

impl DecodedMessage {
    /// Whether this message was introduced by a compressed timestamp header.
    pub fn is_compressed(&self) -> bool {
        self.time_offset.is_some()
    }

    /// The field with a key, if the definition declared it.
    pub fn field(&self, key: FieldKey) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// The value of a native field, if present and valid.
    pub fn value(&self, number: u8) -> Option<&Value> {
        self.field(FieldKey::Native(number))
            .and_then(|f| f.value.as_ref())
    }

    /// Set the `timestamp` field, replacing any declared one.
    pub fn set_timestamp(&mut self, timestamp: Option<u32>) {
        let field = DecodedField {
            key: FieldKey::Native(TIMESTAMP_FIELD),
            base_type: Some(BaseType::UInt32),
            value: timestamp.map(Value::UInt32),
        };

        match self.fields.iter_mut().find(|f| f.key == field.key) {
            Some(f) => *f = field,
            None => self.fields.push(field),
        }
    }
}

/// A problem confined to a single field of a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    /// No field description was seen for a developer field.
    UnknownDeveloperField { developer_index: u8, number: u8 },
    /// The declared size does not fit the base type.
    SizeMismatch { key: FieldKey, mismatch: SizeMismatch },
}

/// State token to decode a data record.
#[derive(Debug)]
pub struct Data {
    pub(crate) time_offset: Option<u8>,
}

impl Data {
    /// Time offset of a compressed timestamp header, if present.
    pub fn time_offset(&self) -> Option<u8> {
        self.time_offset
    }

    /// Transition to another state by decoding a data record.
    ///
    /// Expects the record bytes described by `definition`, and resolves
    /// developer fields against `catalog`. Field-level problems are returned
    /// alongside the message, whose affected fields are absent.
    ///
    /// Returns the message, field issues, and the successor state token.
    pub fn advance(
        self,
        definition: &MessageDefinition,
        catalog: &DeveloperCatalog,
        r: &[u8],
    ) -> Result<(DecodedMessage, Vec<FieldIssue>, RecordHeader), FieldError> {
        let order = definition.byte_order;
        let mut r = ByteReader::new(r);
        let mut issues = Vec::new();
        let mut fields = Vec::with_capacity(definition.fields.len());

        for f in &definition.fields {
            let key = FieldKey::Native(f.number);
            let bytes = r.read_bytes(f.size.into())?;

            let value = decode_field(f.base_type, bytes, order).unwrap_or_else(|mismatch| {
                issues.push(FieldIssue::SizeMismatch { key, mismatch });
                None
            });

            fields.push(DecodedField {
                key,
                base_type: Some(f.base_type),
                value,
            });
        }

        for f in &definition.developer_fields {
            let key = FieldKey::Developer {
                developer_index: f.developer_index,
                number: f.number,
            };
            let bytes = r.read_bytes(f.size.into())?;

            let Some(description) = catalog.field(f.developer_index, f.number) else {
                issues.push(FieldIssue::UnknownDeveloperField {
                    developer_index: f.developer_index,
                    number: f.number,
                });
                fields.push(DecodedField {
                    key,
                    base_type: None,
                    value: None,
                });
                continue;
            };

            let base_type = description.base_type;
            let value = decode_field(base_type, bytes, order).unwrap_or_else(|mismatch| {
                issues.push(FieldIssue::SizeMismatch { key, mismatch });
                None
            });

            fields.push(DecodedField {
                key,
                base_type: Some(base_type),
                value,
            });
        }

        let message = DecodedMessage {
            global_message: definition.global_message,
            local_message: definition.local_message,
            time_offset: self.time_offset,
            fields,
        };

        Ok((message, issues, RecordHeader(())))
    }
}
