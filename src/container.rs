//! DCA container format.
//!
//! ```text
//! "DCA1" | i32 LE json length | json metadata | (u16 LE length | opus packet)*
//! ```
//!
//! Raw streams carry only the frame records.

use crate::defaults::MAGIC;
use crate::error::{DcaError, Result};
use crate::metadata::Metadata;
use std::io::{self, Cursor, Read, Write};

/// Largest payload a frame record can describe.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Reads until `buf` is full or the stream ends, returning the bytes read.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes the magic token followed by the length-prefixed JSON metadata.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, metadata: &Metadata) -> Result<()> {
    let json = serde_json::to_vec(metadata)?;
    let len = i32::try_from(json.len())
        .map_err(|_| DcaError::Other(format!("metadata too large: {} bytes", json.len())))?;

    let mut header = Vec::with_capacity(MAGIC.len() + 4 + json.len());
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&len.to_le_bytes());
    header.extend_from_slice(&json);
    writer.write_all(&header)?;
    Ok(())
}

/// Reads and parses a container header.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<Metadata> {
    let mut magic = [0u8; 4];
    if read_full(reader, &mut magic)? != magic.len() || &magic != MAGIC {
        return Err(DcaError::malformed("missing DCA1 magic"));
    }

    let mut len_bytes = [0u8; 4];
    if read_full(reader, &mut len_bytes)? != len_bytes.len() {
        return Err(DcaError::malformed("truncated metadata length"));
    }
    let len = i32::from_le_bytes(len_bytes);
    let len = usize::try_from(len)
        .map_err(|_| DcaError::malformed(format!("negative metadata length {}", len)))?;

    // Bounded by the declared length; a short read means the length is corrupt.
    let mut json = Vec::new();
    Read::take(&mut *reader, len as u64).read_to_end(&mut json)?;
    if json.len() != len {
        return Err(DcaError::malformed(format!(
            "declared metadata length {} exceeds remaining {} bytes",
            len,
            json.len()
        )));
    }

    Ok(serde_json::from_slice(&json)?)
}

/// Writes one frame record with a single `write_all`.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u16::try_from(payload.len()).map_err(|_| DcaError::FrameTooLarge {
        len: payload.len(),
    })?;

    let mut record = Vec::with_capacity(2 + payload.len());
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(payload);
    writer.write_all(&record)?;
    Ok(())
}

/// Reads one frame record. `Ok(None)` is a clean end of stream.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 2];
    match read_full(reader, &mut len_bytes)? {
        0 => return Ok(None),
        2 => {}
        _ => return Err(DcaError::malformed("stream ended inside a frame length")),
    }

    let len = usize::from(u16::from_le_bytes(len_bytes));
    let mut payload = vec![0u8; len];
    let read = read_full(reader, &mut payload)?;
    if read != len {
        return Err(DcaError::malformed(format!(
            "frame declares {} bytes but only {} remain",
            len, read
        )));
    }
    Ok(Some(payload))
}

/// Peeks at the first four bytes of `reader`.
///
/// Returns whether they are the container magic and a reader that still
/// yields every byte, the peeked ones included.
pub fn detect_header<R: Read>(mut reader: R) -> io::Result<(bool, io::Chain<Cursor<Vec<u8>>, R>)> {
    let mut prefix = [0u8; 4];
    let n = read_full(&mut reader, &mut prefix)?;
    let has_magic = n == MAGIC.len() && &prefix == MAGIC;
    Ok((has_magic, Cursor::new(prefix[..n].to_vec()).chain(reader)))
}
