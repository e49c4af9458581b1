//! Reading captured or live bus bytes.
//!
//! Raw input is passed through in read-sized chunks. Hex input is text, one
//! or more byte groups per line:
//!
//! ```text
//! # light, room 5
//! AA 55 00 10 00 01 00 0E 05 01 FF 00 00 00 00 00 00 00 24 0D 0D
//! 0xAA,0x55,0x00,0x10   # commas and 0x prefixes are fine
//! AA5500100001000E0501  # so are runs of digits
//! ```

use std::io::{BufRead, ErrorKind};

use crate::config::InputFormat;
use crate::error::RunnerError;

/// Read size for raw input.
pub const RAW_CHUNK_SIZE: usize = 4096;

/// Decode one line of a hex capture. `line` is 1-based, for error messages.
pub fn parse_hex_line(line: usize, text: &str) -> Result<Vec<u8>, RunnerError> {
    let content = match text.find('#') {
        Some(idx) => &text[..idx],
        None => text,
    };

    let mut bytes = Vec::new();
    for token in content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let decoded = hex::decode(digits).map_err(|e| RunnerError::HexCapture {
            line,
            message: format!("{:?}: {}", token, e),
        })?;
        bytes.extend_from_slice(&decoded);
    }
    Ok(bytes)
}

/// Feed every chunk of `reader` to `f`, decoding hex text first if needed.
///
/// Stops at end of input or at the first error from the reader or from `f`.
/// A read that fails with [`ErrorKind::TimedOut`] is not an error: `f` gets an
/// empty chunk and reading resumes, so an idle live source still gives the
/// caller a chance to run periodic work.
pub fn for_each_chunk<R, F>(mut reader: R, format: InputFormat, mut f: F) -> Result<(), RunnerError>
where
    R: BufRead,
    F: FnMut(&[u8]) -> Result<(), RunnerError>,
{
    match format {
        InputFormat::Raw => {
            let mut buf = vec![0u8; RAW_CHUNK_SIZE];
            loop {
                let n = match reader.read(&mut buf) {
                    Ok(0) => return Ok(()),
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == ErrorKind::TimedOut => 0,
                    Err(e) => return Err(e.into()),
                };
                f(&buf[..n])?;
            }
        }
        InputFormat::Hex => {
            // Holds a partial line across timed-out reads.
            let mut text = String::new();
            let mut line = 0usize;
            loop {
                let at_end = match reader.read_line(&mut text) {
                    Ok(0) => true,
                    Ok(_) => false,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == ErrorKind::TimedOut => {
                        f(&[])?;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                if !text.is_empty() {
                    line += 1;
                    let bytes = parse_hex_line(line, &text)?;
                    text.clear();
                    if !bytes.is_empty() {
                        f(&bytes)?;
                    }
                }
                if at_end {
                    return Ok(());
                }
            }
        }
    }
}
