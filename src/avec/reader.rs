//! Reader-based decoder implementation.
//!
//! Documents are buffered in full before decoding, since definition records
//! are kept against the bytes that follow them.
//!
//! _Requires Cargo feature `std`._

use std::{fs::File, io::Read, path::Path, vec::Vec};

use log::debug;

use super::{DecodeOptions, Decoded, Error, MessageSink};

/// Decode messages from a reader of one or more documents, publishing to a
/// receiver.
///
/// This method is also re-exported as `fitframe::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(
    r: &mut impl Read,
    o: &mut impl MessageSink,
    options: DecodeOptions,
) -> Result<Decoded, Error> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;

    super::slice::decode(&buf, o, options)
}

/// Decode messages from a file, publishing to a receiver.
///
/// _Requires Cargo feature `std`._
pub fn decode_path(
    path: impl AsRef<Path>,
    o: &mut impl MessageSink,
    options: DecodeOptions,
) -> Result<Decoded, Error> {
    let path = path.as_ref();
    debug!("Reading {}.", path.display());

    let mut file = File::open(path)?;
    decode(&mut file, o, options)
}
