// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The seam traits that keep the file writer/reader generic over "a thing
//! you can read a range out of" and "a thing you can clone a handle to"
//! without committing to `std::fs::File` (spec.md §5, §9: byte-level I/O is
//! an external collaborator).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use bytes::Bytes;

use crate::errors::Result;

/// Anything with a known byte length.
pub trait Length {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can hand out an independent handle to the same underlying
/// data, so a row-group writer and the column chunks within it can each
/// hold their own cursor.
pub trait TryClone: Sized {
    fn try_clone(&self) -> io::Result<Self>;
}

/// A source a `Read` can be obtained from for an arbitrary byte range,
/// without assuming exclusive access to the whole file.
pub trait ChunkReader: Length + Send + Sync {
    type T: Read;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T>;

    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let mut buffer = vec![0u8; length];
        let mut reader = self.get_read(start, length)?;
        reader.read_exact(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl TryClone for File {
    fn try_clone(&self) -> io::Result<Self> {
        File::try_clone(self)
    }
}

/// Reads a bounded window of a file handle without disturbing the caller's
/// own cursor, by cloning the handle and seeking the clone.
pub struct FileSource<R: Read + Seek> {
    reader: R,
    start: u64,
    end: u64,
}

impl<R: Read + Seek> FileSource<R> {
    pub fn new(reader: R, start: u64, length: usize) -> Self {
        FileSource {
            reader,
            start,
            end: start + length as u64,
        }
    }
}

impl<R: Read + Seek> Read for FileSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.seek(SeekFrom::Start(self.start))?;
        let remaining = (self.end - self.start) as usize;
        let want = buf.len().min(remaining);
        let read = self.reader.read(&mut buf[..want])?;
        self.start += read as u64;
        Ok(read)
    }
}

impl ChunkReader for File {
    type T = FileSource<File>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        Ok(FileSource::new(self.try_clone()?, start, length))
    }
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }
}

impl ChunkReader for Bytes {
    type T = io::Cursor<Bytes>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        let end = (start as usize + length).min(self.len() as usize);
        Ok(io::Cursor::new(self.slice(start as usize..end)))
    }
}

impl<C: ChunkReader> ChunkReader for Arc<C> {
    type T = C::T;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        self.as_ref().get_read(start, length)
    }
}

impl<C: ChunkReader> Length for Arc<C> {
    fn len(&self) -> u64 {
        self.as_ref().len()
    }
}

/// Tracks how many bytes have been written through it, so a file writer can
/// compute absolute page offsets as it streams pages out sequentially
/// (spec.md §4.6: "the writer seeks only forward").
pub struct TrackedWrite<W> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> TrackedWrite<W> {
    pub fn new(inner: W) -> Self {
        TrackedWrite {
            inner,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_write_counts_bytes() {
        let mut tw = TrackedWrite::new(Vec::new());
        tw.write_all(b"hello").unwrap();
        tw.write_all(b" world").unwrap();
        assert_eq!(tw.bytes_written(), 11);
        assert_eq!(tw.into_inner(), b"hello world");
    }

    #[test]
    fn bytes_chunk_reader_returns_requested_slice() {
        let data = Bytes::from_static(b"0123456789");
        let mut reader = data.get_read(3, 4).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"3456");
    }
}
