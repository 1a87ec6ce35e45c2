//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{QueueError, Result};

use super::entry::MAX_ENTRY_SIZE;
use super::{WalEntry, HEADER_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last entry read successfully
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// torn or damaged frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(QueueError::WalCorruption(format!(
                "torn header at offset {} ({} of {} bytes)",
                self.position, got, HEADER_SIZE
            )));
        }

        let lsn = u64::from_le_bytes([
            header[0], header[1], header[2], header[3],
            header[4], header[5], header[6], header[7],
        ]);
        let crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        let len = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        if len > MAX_ENTRY_SIZE {
            return Err(QueueError::WalCorruption(format!(
                "entry length {} at offset {} exceeds limit",
                len, self.position
            )));
        }

        let mut body = vec![0u8; len as usize];
        let got = read_full(&mut self.reader, &mut body)?;
        if got < body.len() {
            return Err(QueueError::WalCorruption(format!(
                "torn entry at offset {} ({} of {} bytes)",
                self.position, got, len
            )));
        }

        let entry = WalEntry::decode(lsn, crc, &body)?;
        self.position += (HEADER_SIZE + body.len()) as u64;
        Ok(Some(entry))
    }

    /// Offset just past the last valid entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over entries; stops after the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read
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
