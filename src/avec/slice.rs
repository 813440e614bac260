//! Slice-based decoder implementation.

use alloc::{collections::BTreeSet, vec::Vec};

use either::Either::{Left, Right};
use log::{debug, trace, warn};

use crate::sans::{
    Decoder,
    bytes::{ByteOrder, ByteReader, Truncated},
    check::{Crc, compute_crc},
    data::{Data, FieldIssue, TIMESTAMP_FIELD, Value},
    definition::{Definition, MessageDefinition},
    developer::DeveloperCatalog,
    header::{FileHeader, RecordHeader},
    time::TimeReference,
};

use super::{DecodeOptions, Decoded, Error, MessageSink, Warning};

/// Decode messages from a slice of one or more documents, publishing to a
/// receiver.
///
/// This method is also re-exported as `fitframe::avec::decode_slice`.
pub fn decode(
    r: &[u8],
    o: &mut impl MessageSink,
    options: DecodeOptions,
) -> Result<Decoded, Error> {
    let mut r = ByteReader::new(r);
    let mut decoded = Decoded::default();

    loop {
        let session = Session::new(&mut r, &mut *o, options, &mut decoded.warnings);
        decoded.headers.push(session.decode()?);

        if r.is_empty() {
            break;
        }

        let rest = r.rest();
        if !options.chained || !starts_document(rest) {
            let warning = Warning::TrailingBytes {
                offset: r.position(),
                count: rest.len(),
            };
            warn!("{warning}");
            decoded.warnings.push(warning);
            break;
        }

        debug!("Decoding chained document at offset {}.", r.position());
    }

    Ok(decoded)
}

/// Whether bytes look like the start of a document header.
fn starts_document(r: &[u8]) -> bool {
    matches!(r.first().copied(), Some(12 | 14)) && r.get(8..12) == Some(&b".FIT"[..])
}

/// Bytes of the document being decoded, with the running check value.
struct Input<'r, 'a> {
    r: &'r mut ByteReader<'a>,
    crc: Crc,
    /// Offset to the end of the record section.
    end: usize,
}

impl<'a> Input<'_, 'a> {
    /// Take an exact number of bytes, accumulating the check value.
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.take_slice(N)?);
        Ok(buf)
    }

    /// Take a number of bytes, accumulating the check value.
    fn take_slice(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let offset = self.r.position();

        if offset + n > self.end {
            Err(Error::MalformedStream {
                offset,
                end: self.end,
            })?;
        }

        let bytes = self.r.read_bytes(n)?;
        self.crc.update(bytes);

        Ok(bytes)
    }
}

/// State of a single document: definitions, developer catalog and time
/// reference are scoped to it.
struct Session<'r, 'a, O> {
    input: Input<'r, 'a>,
    definitions: [Option<MessageDefinition>; 16],
    catalog: DeveloperCatalog,
    time: TimeReference,
    /// Undescribed developer fields already reported, by global message.
    undescribed: BTreeSet<(u16, u8, u8)>,
    options: DecodeOptions,
    warnings: &'r mut Vec<Warning>,
    o: &'r mut O,
}

impl<'r, 'a, O: MessageSink> Session<'r, 'a, O> {
    fn new(
        r: &'r mut ByteReader<'a>,
        o: &'r mut O,
        options: DecodeOptions,
        warnings: &'r mut Vec<Warning>,
    ) -> Self {
        Self {
            input: Input {
                r,
                crc: Crc::new(),
                end: usize::MAX,
            },
            definitions: Default::default(),
            catalog: DeveloperCatalog::default(),
            time: TimeReference::new(),
            undescribed: BTreeSet::new(),
            options,
            warnings,
            o,
        }
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Report a check value mismatch, failing in strict mode.
    fn mismatch(&mut self, warning: Warning, err: Error) -> Result<(), Error> {
        if self.options.strict {
            Err(err)
        } else {
            self.warn(warning);
            Ok(())
        }
    }

    fn decode(mut self) -> Result<FileHeader, Error> {
        let bytes = self.input.take()?;
        let (mut header, successor) = Decoder::advance(bytes)?;

        let mut record_header = match successor {
            Left(state) => {
                let (found, state) = state.advance(self.input.take()?);
                header.crc = Some(found);

                // Zero marks a header check value that was not computed.
                let calculated = compute_crc(0, &bytes);
                if self.options.validate_header_crc && found != 0 && found != calculated {
                    self.mismatch(
                        Warning::HeaderChecksumMismatch { found, calculated },
                        Error::HeaderChecksumMismatch { found, calculated },
                    )?;
                }

                state
            }
            Right(state) => state,
        };

        // The record section and its trailing check value must be present.
        let start = self.input.r.position();
        let data_size = header.data_size as usize;
        let available = self.input.r.remaining();
        if available < data_size + 2 {
            Err(Truncated {
                offset: start,
                needed: data_size + 2,
                available,
            })?;
        }

        self.input.end = start + data_size;

        debug!(
            "Decoding document with {data_size} record bytes (protocol {}, profile {}).",
            header.protocol_version, header.profile_version
        );

        while self.input.r.position() < self.input.end {
            let (local, successor) = record_header.advance(self.input.take()?);

            record_header = match successor {
                Left(state) => self.decode_definition(local, state)?,
                Right(state) => self.decode_data(local, state)?,
            };
        }

        // The trailing check value is not part of its own computation.
        let calculated = self.input.crc.finalize();
        let found = self.input.r.read_u16(ByteOrder::LittleEndian)?;

        if found != calculated {
            self.mismatch(
                Warning::ChecksumMismatch { found, calculated },
                Error::ChecksumMismatch { found, calculated },
            )?;
        }

        Ok(header)
    }

    fn decode_definition(&mut self, local: u8, state: Definition) -> Result<RecordHeader, Error> {
        let (byte_order, global, successor) = state.advance(self.input.take()?);
        let mut definition = MessageDefinition::new(local, global, byte_order);

        let fields_end = match successor {
            Left(mut state) => loop {
                let (field, successor) = state.advance(self.input.take()?)?;
                definition.fields.push(field);

                state = match successor {
                    Left(state) => state,
                    Right(end) => break end,
                };
            },
            Right(end) => end,
        };

        let record_header = match fields_end {
            Left(state) => match state.advance(self.input.take()?) {
                Left(mut state) => loop {
                    let (field, successor) = state.advance(self.input.take()?);
                    definition.developer_fields.push(field);

                    state = match successor {
                        Left(state) => state,
                        Right(state) => break state,
                    };
                },
                Right(state) => state,
            },
            Right(state) => state,
        };

        let slot = &mut self.definitions[local as usize];
        if let Some(previous) = slot {
            debug!(
                "Redefining local message {local} from global message {} to {global}.",
                previous.global_message
            );
        } else {
            debug!("Defining local message {local} as global message {global}.");
        }
        *slot = Some(definition);

        Ok(record_header)
    }

    fn decode_data(&mut self, local: u8, state: Data) -> Result<RecordHeader, Error> {
        let definition = self.definitions[local as usize]
            .as_ref()
            .ok_or(Error::UndefinedLocalMessageType(local))?;

        let bytes = self.input.take_slice(definition.data_size())?;
        let (mut message, issues, record_header) =
            state.advance(definition, &self.catalog, bytes)?;

        let global_message = message.global_message;

        for issue in issues {
            let warning = match issue {
                FieldIssue::UnknownDeveloperField {
                    developer_index,
                    number,
                } => {
                    if !self.undescribed.insert((global_message, developer_index, number)) {
                        trace!("Undescribed developer field {developer_index}:{number} again.");
                        continue;
                    }

                    Warning::UnknownDeveloperField {
                        global_message,
                        developer_index,
                        number,
                    }
                }
                FieldIssue::SizeMismatch { key, mismatch } => Warning::FieldSizeMismatch {
                    global_message,
                    key,
                    size: mismatch.size,
                    base_type: mismatch.base_type,
                },
            };

            self.warn(warning);
        }

        match message.time_offset {
            Some(offset) => {
                let timestamp = self.time.advance(offset);
                if timestamp.is_none() {
                    self.warn(Warning::MissingTimeReference { global_message });
                }
                message.set_timestamp(timestamp);
            }
            None => {
                // Timestamps too wide for the protocol's 32 bits do not reset
                // the reference.
                let timestamp = message
                    .value(TIMESTAMP_FIELD)
                    .and_then(Value::as_u64)
                    .and_then(|t| u32::try_from(t).ok());
                if let Some(timestamp) = timestamp {
                    self.time.reset(timestamp);
                }
            }
        }

        if let Some(description) = self.catalog.observe(&message) {
            self.o.add_developer_field(description);
        }

        trace!("Decoded local message {local} as global message {global_message}.");

        if self.o.accepts(global_message) {
            self.o.add_message(message);
        }

        Ok(record_header)
    }
}
