//! WAL block codec
//!
//! Encodes one operation into one fixed-size block and back.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{LodeError, Result};
use crate::types::Operation;

/// Tag opening a put block
pub const PUT_TAG: &[u8; 4] = b"set ";

/// Tag opening a tombstone block
pub const TOMBSTONE_TAG: &[u8; 4] = b"del ";

/// Byte between the key and the value of a put
pub const SEPARATOR: u8 = b' ';

/// Padding between the record and the terminator
pub const FILL_BYTE: u8 = b'#';

/// Last byte of every block
pub const TERMINATOR: u8 = b'\n';

pub const DEFAULT_BLOCK_SIZE: usize = 100;

/// Tag (4) + KeyLen (4) + Separator (1) + ValLen (4) + Terminator (1)
pub const PUT_OVERHEAD: usize = 4 + 4 + 1 + 4 + 1;

/// Tag (4) + KeyLen (4) + Terminator (1)
pub const TOMBSTONE_OVERHEAD: usize = 4 + 4 + 1;

/// Smallest block that can hold a put with a one-byte key and empty value
pub const MIN_BLOCK_SIZE: usize = PUT_OVERHEAD + 1;

/// Bytes an operation needs before padding
pub fn record_size(op: &Operation) -> usize {
    match op {
        Operation::Put { key, value } => PUT_OVERHEAD + key.len() + value.len(),
        Operation::Tombstone { key } => TOMBSTONE_OVERHEAD + key.len(),
    }
}

/// Encode `op` into exactly `block_size` bytes.
///
/// Fails with `RecordTooLarge` when the record does not fit.
pub fn encode_block(op: &Operation, block_size: usize) -> Result<BytesMut> {
    let size = record_size(op);
    if size > block_size {
        return Err(LodeError::RecordTooLarge {
            size,
            limit: block_size,
        });
    }

    let mut buf = BytesMut::with_capacity(block_size);
    match op {
        Operation::Put { key, value } => {
            buf.put_slice(PUT_TAG);
            buf.put_u32(key.len() as u32);
            buf.put_slice(key);
            buf.put_u8(SEPARATOR);
            buf.put_u32(value.len() as u32);
            buf.put_slice(value);
        }
        Operation::Tombstone { key } => {
            buf.put_slice(TOMBSTONE_TAG);
            buf.put_u32(key.len() as u32);
            buf.put_slice(key);
        }
    }
    buf.resize(block_size - 1, FILL_BYTE);
    buf.put_u8(TERMINATOR);

    debug_assert_eq!(buf.len(), block_size);
    Ok(buf)
}

/// Decode one full block.
///
/// Any structural mismatch (terminator, tag, lengths, separator, fill)
/// yields `WalCorruption`.
pub fn decode_block(block: &[u8]) -> Result<Operation> {
    let (&terminator, mut buf) = block
        .split_last()
        .ok_or_else(|| corrupt("empty block"))?;
    if terminator != TERMINATOR {
        return Err(corrupt(format!("bad terminator byte 0x{:02x}", terminator)));
    }

    if buf.remaining() < 8 {
        return Err(corrupt("block too short for tag and key length"));
    }
    let mut tag = [0u8; 4];
    buf.copy_to_slice(&mut tag);

    let key = take_field(&mut buf, "key")?;
    if key.is_empty() {
        return Err(corrupt("empty key"));
    }

    let op = if &tag == PUT_TAG {
        if buf.remaining() < 1 + 4 {
            return Err(corrupt("block too short for value length"));
        }
        let separator = buf.get_u8();
        if separator != SEPARATOR {
            return Err(corrupt(format!("bad separator byte 0x{:02x}", separator)));
        }
        let value = take_field(&mut buf, "value")?;
        Operation::Put { key, value }
    } else if &tag == TOMBSTONE_TAG {
        Operation::Tombstone { key }
    } else {
        return Err(corrupt(format!("unknown tag {:?}", tag)));
    };

    if buf.iter().any(|&b| b != FILL_BYTE) {
        return Err(corrupt("unexpected bytes in padding"));
    }

    Ok(op)
}

/// Read a `u32` length followed by that many bytes
fn take_field(buf: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    if buf.remaining() < 4 {
        return Err(corrupt(format!("block too short for {} length", what)));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(corrupt(format!(
            "{} length {} overruns block ({} bytes left)",
            what,
            len,
            buf.remaining()
        )));
    }
    let field = buf[..len].to_vec();
    buf.advance(len);
    Ok(field)
}

fn corrupt(reason: impl Into<String>) -> LodeError {
    LodeError::WalCorruption(reason.into())
}
