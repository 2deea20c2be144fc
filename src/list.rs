//! Reading and writing on-disk polycube lists.
//!
//! A list file is a 12-byte header followed by fixed-size records:
//!
//! ```text
//! offset 0  : 8 bytes ASCII magic "PLYCUBE1"
//! offset 8  : 4 bytes little-endian i32, the cube count N
//! offset 12 : records, each N coordinates of 3 signed bytes (x, y, z)
//! ```
//!
//! A finished file is sorted ascending by canonical coordinate tuple.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::polycube::PolyCube;
use crate::{Error, Result};

pub const MAGIC: [u8; 8] = *b"PLYCUBE1";

const HEADER_LEN: u64 = 12;

/// A polycube list file opened for reading.
pub struct ListReader {
    input: BufReader<File>,
    cube_count: usize,
    record_count: u64,
}

impl ListReader {
    /// Open a list file and validate its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        let mut input = BufReader::new(file);

        let mut magic = [0u8; 8];
        input.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::BadMagic);
        }

        let mut count = [0u8; 4];
        input.read_exact(&mut count)?;
        let cube_count = i32::from_le_bytes(count);

        // A non-positive cube count leaves the record length undefined.
        if cube_count < 1 {
            return Err(Error::Truncated);
        }
        let cube_count = cube_count as usize;

        let record_len = 3 * cube_count as u64;
        let body = len - HEADER_LEN;
        if body % record_len != 0 {
            return Err(Error::Truncated);
        }

        Ok(Self {
            input,
            cube_count,
            record_count: body / record_len,
        })
    }

    /// The cube count `N` of every record, from the header.
    pub fn cube_count(&self) -> usize {
        self.cube_count
    }

    /// The number of records, from the file length.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// A cursor over the records, positioned at the first one.
    ///
    /// Fails with [`Error::BadSize`] unless `N` matches the header. The
    /// exclusive borrow keeps a cursor on a single thread; workers that
    /// need a seed range get it copied into an owned buffer instead.
    pub fn cubes<const N: usize>(&mut self) -> Result<Cursor<'_, N>> {
        if N != self.cube_count {
            return Err(Error::BadSize {
                expected: N,
                found: self.cube_count,
            });
        }

        self.input.seek(SeekFrom::Start(HEADER_LEN))?;

        Ok(Cursor {
            reader: self,
            index: 0,
        })
    }

    /// Read the whole list into memory.
    pub fn slurp<const N: usize>(&mut self) -> Result<Vec<PolyCube<N>>> {
        self.cubes::<N>()?.collect()
    }
}

/// A forward cursor over the records of a [`ListReader`].
///
/// Yields records by value with a bounded working set; [`Cursor::seek`]
/// gives random access.
pub struct Cursor<'a, const N: usize> {
    reader: &'a mut ListReader,
    index: u64,
}

impl<const N: usize> Cursor<'_, N> {
    pub fn len(&self) -> u64 {
        self.reader.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reposition the cursor so the next record yielded is `index`.
    pub fn seek(&mut self, index: u64) -> Result<()> {
        let pos = HEADER_LEN + index * 3 * N as u64;
        self.reader.input.seek(SeekFrom::Start(pos))?;
        self.index = index;
        Ok(())
    }
}

impl<const N: usize> Iterator for Cursor<'_, N> {
    type Item = Result<PolyCube<N>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.reader.record_count {
            return None;
        }

        self.index += 1;

        Some(PolyCube::unpack(&mut self.reader.input).map_err(Error::from))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.reader.record_count - self.index) as usize;
        (left, Some(left))
    }
}

impl<const N: usize> ExactSizeIterator for Cursor<'_, N> {}

/// A polycube list file being written.
///
/// The header goes out on creation; records are buffered and flushed when
/// the writer is dropped. [`ListWriter::finish`] surfaces the final flush
/// error instead of swallowing it. The writer owns the path for its
/// lifetime.
pub struct ListWriter<const N: usize> {
    output: BufWriter<File>,
}

impl<const N: usize> ListWriter<N> {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut output = BufWriter::new(File::create(path.as_ref())?);

        output.write_all(&MAGIC)?;
        output.write_all(&(N as i32).to_le_bytes())?;

        Ok(Self { output })
    }

    pub fn write(&mut self, pc: &PolyCube<N>) -> Result<()> {
        pc.pack(&mut self.output)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}
