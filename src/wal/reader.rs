//! WAL Reader
//!
//! Reads the WAL block by block, in append order.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{LodeError, Result};
use crate::types::Operation;

use super::decode_block;

/// Outcome of reading one block
#[derive(Debug)]
pub enum BlockRead {
    /// A well-formed record
    Record(Operation),

    /// A full block that failed to decode; the next block is still aligned
    Corrupt { offset: u64, reason: String },

    /// Fewer than `block_size` bytes left at the end of the file
    TornTail { offset: u64, len: usize },
}

/// Reads blocks from a WAL file
pub struct WalReader {
    file: BufReader<File>,
    block_size: usize,
    /// Offset of the next block to read
    position: u64,
    /// Set once EOF or a torn tail has been reached
    done: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path, block_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file: BufReader::new(file),
            block_size,
            position: 0,
            done: false,
        })
    }

    /// Read the next block, or `None` at end of file
    pub fn next_block(&mut self) -> Result<Option<BlockRead>> {
        if self.done {
            return Ok(None);
        }

        let offset = self.position;
        let mut block = vec![0u8; self.block_size];
        let filled = read_full(&mut self.file, &mut block)?;

        if filled == 0 {
            self.done = true;
            return Ok(None);
        }
        if filled < self.block_size {
            self.done = true;
            return Ok(Some(BlockRead::TornTail {
                offset,
                len: filled,
            }));
        }

        self.position += self.block_size as u64;
        match decode_block(&block) {
            Ok(op) => Ok(Some(BlockRead::Record(op))),
            Err(LodeError::WalCorruption(reason)) => Ok(Some(BlockRead::Corrupt { offset, reason })),
            Err(e) => Err(e),
        }
    }

    /// Offset of the next block to read
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for WalReader {
    type Item = Result<BlockRead>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

/// Fill `buf` as far as the file allows, returning the byte count
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
