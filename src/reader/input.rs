//! Byte input decoding.
//!
//! Documents read from an `std::io::Read` may come in any common Unicode
//! encoding. `encoding_rs_io` sniffs the BOM and transcodes to UTF-8 before
//! the text reaches the XML parser.

use std::io::{BufReader, Read};

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::error::Error;

/// Read the whole input, decoding it to UTF-8.
pub(crate) fn decode_to_string<R: Read>(reader: R) -> Result<String, Error> {
    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(None) // None = sniff BOM, default to UTF-8
        .build(reader);
    let mut text = String::new();
    BufReader::new(decoder).read_to_string(&mut text)?;
    // The decoder passes a UTF-8 BOM through as U+FEFF.
    if let Some(stripped) = text.strip_prefix('\u{FEFF}') {
        text = stripped.to_owned();
    }
    Ok(text)
}
