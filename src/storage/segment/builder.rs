//! Segment Builder
//!
//! Writes a memtable snapshot to a new segment file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{LodeError, Result};
use crate::types::Operation;

use super::{encode_entry, Segment, SegmentHeader, HEADER_SIZE};

/// Builder for creating new segments
///
/// The header is known up front, so the file is produced in one append
/// pass: header, then entries in the order given. Data goes to
/// `<path>.tmp` and is renamed into place only after an fsync, so a crash
/// never leaves a half-written file under a segment name.
pub struct SegmentBuilder {
    /// Segment id, recorded in the returned metadata
    id: u64,
    /// Final file path
    path: PathBuf,
    /// Where data is written until `finish`
    tmp_path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Header written at creation
    header: SegmentHeader,
    /// Entries written so far
    written: u32,
    /// Bytes written so far, header included
    bytes_written: u64,
}

impl SegmentBuilder {
    /// Create the temporary file and write the header
    pub fn new(id: u64, path: &Path, header: SegmentHeader) -> Result<Self> {
        let tmp_path = tmp_path_for(path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(LodeError::durability("segment create"))?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(&header.encode())
            .map_err(LodeError::durability("segment write"))?;

        Ok(Self {
            id,
            path: path.to_path_buf(),
            tmp_path,
            writer,
            header,
            written: 0,
            bytes_written: HEADER_SIZE,
        })
    }

    /// Build a complete segment from `entries` in one call.
    ///
    /// The temporary file is removed if anything fails.
    pub fn write_all(id: u64, path: &Path, entries: &[Operation]) -> Result<Segment> {
        let header = SegmentHeader::from_entries(entries).ok_or_else(|| {
            LodeError::Validation("cannot create a segment with no entries".to_string())
        })?;

        let tmp_path = tmp_path_for(path);
        let result = Self::new(id, path, header).and_then(|mut builder| {
            for op in entries {
                builder.add(op)?;
            }
            builder.finish()
        });

        if result.is_err() && tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                tracing::warn!(path = %tmp_path.display(), error = %e, "failed to remove temp segment");
            }
        }
        result
    }

    /// Append one entry
    pub fn add(&mut self, op: &Operation) -> Result<()> {
        let entry = encode_entry(op);
        self.writer
            .write_all(&entry)
            .map_err(LodeError::durability("segment write"))?;
        self.written += 1;
        self.bytes_written += entry.len() as u64;
        Ok(())
    }

    /// Flush, fsync and move the file to its final name
    pub fn finish(self) -> Result<Segment> {
        if self.written != self.header.entry_count {
            return Err(LodeError::Validation(format!(
                "segment header promises {} entries but {} were written",
                self.header.entry_count, self.written
            )));
        }

        let file = self
            .writer
            .into_inner()
            .map_err(|e| LodeError::Durability {
                context: "segment flush",
                source: e.into_error(),
            })?;
        file.sync_all()
            .map_err(LodeError::durability("segment sync"))?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path).map_err(LodeError::durability("segment rename"))?;
        sync_parent_dir(&self.path);

        Ok(Segment {
            id: self.id,
            path: self.path,
            header: self.header,
            file_size: self.bytes_written,
        })
    }
}

/// Temporary path used while a segment is being written
pub(crate) fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension("sst.tmp")
}

/// Persist the rename; not every platform can fsync a directory
fn sync_parent_dir(path: &Path) {
    let Some(dir) = path.parent() else { return };
    match File::open(dir).and_then(|d| d.sync_all()) {
        Ok(()) => {}
        Err(e) => tracing::trace!(dir = %dir.display(), error = %e, "directory sync skipped"),
    }
}
