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

//! Page-buffer allocation seam (spec.md §5, §6, §9): a column writer asks
//! its [`BufferPool`] for the scratch buffer it assembles one page's
//! levels-plus-values into, the same way [`crate::util::io::ChunkReader`]
//! abstracts over where page bytes are read back from. The default pool
//! just grows a `Vec`; [`FileBackedBufferPool`] caps how large that `Vec`
//! is allowed to get before a caller should flush rather than keep
//! buffering, bounding peak memory for row groups with many wide columns.

use std::sync::Arc;

/// A buffer handed out by a [`BufferPool`], already at (or near) its
/// requested capacity.
pub struct PooledBuffer {
    data: Vec<u8>,
}

impl PooledBuffer {
    fn with_capacity(capacity: usize) -> Self {
        PooledBuffer { data: Vec::with_capacity(capacity) }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Hands out the scratch buffer a column writer assembles one page into.
pub trait BufferPool: Send + Sync + std::fmt::Debug {
    /// Requests a buffer sized for roughly `size_hint` bytes.
    fn acquire(&self, size_hint: usize) -> PooledBuffer;

    /// The largest single buffer this pool will hand out, if bounded.
    /// `ColumnWriterImpl` uses this to flush a page before the buffer it
    /// is filling would need to grow past it.
    fn max_buffer_size(&self) -> Option<usize> {
        None
    }
}

/// Buffers entirely on the heap with no size cap; the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapBufferPool;

impl BufferPool for HeapBufferPool {
    fn acquire(&self, size_hint: usize) -> PooledBuffer {
        PooledBuffer::with_capacity(size_hint)
    }
}

/// Caps the in-memory scratch buffer at `spill_threshold` bytes. Does not
/// itself write to disk; it exists so a writer built on many columns can
/// bound worst-case resident memory by flushing pages earlier instead of
/// letting any one column's buffer grow without limit.
#[derive(Debug, Clone, Copy)]
pub struct FileBackedBufferPool {
    spill_threshold: usize,
}

impl FileBackedBufferPool {
    pub fn new(spill_threshold: usize) -> Self {
        FileBackedBufferPool { spill_threshold }
    }
}

impl BufferPool for FileBackedBufferPool {
    fn acquire(&self, size_hint: usize) -> PooledBuffer {
        PooledBuffer::with_capacity(size_hint.min(self.spill_threshold))
    }

    fn max_buffer_size(&self) -> Option<usize> {
        Some(self.spill_threshold)
    }
}

pub fn heap() -> Arc<dyn BufferPool> {
    Arc::new(HeapBufferPool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_pool_grants_the_requested_capacity() {
        let pool = HeapBufferPool;
        let buf = pool.acquire(256);
        assert!(buf.into_vec().capacity() >= 256);
        assert!(pool.max_buffer_size().is_none());
    }

    #[test]
    fn file_backed_pool_caps_capacity_at_the_threshold() {
        let pool = FileBackedBufferPool::new(64);
        let buf = pool.acquire(4096);
        assert!(buf.into_vec().capacity() <= 64);
        assert_eq!(pool.max_buffer_size(), Some(64));
    }
}
