//! Encode Buffer Pool
//!
//! Bounded pool of reusable serialization buffers, owned by the store
//! instance rather than shared process-wide. Purely a performance
//! optimization for write-heavy callers; correctness never depends on
//! it.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Capacity above which a returned buffer is dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Bounded pool of reusable byte buffers.
///
/// Buffers are cleared on acquire and again on release, so no token
/// data survives between uses.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_pooled: usize,
}

impl BufferPool {
    /// Default number of buffers a pool retains.
    pub const DEFAULT_POOLED: usize = 16;

    /// Create a pool retaining at most `max_pooled` buffers.
    pub fn new(max_pooled: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            max_pooled,
        }
    }

    /// Borrow a buffer. The guard returns it to the pool when dropped,
    /// on every exit path.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self.buffers.lock().unwrap().pop().unwrap_or_default();
        buf.clear();
        PooledBuffer {
            pool: self,
            buf: Some(buf),
        }
    }

    /// Number of currently pooled buffers.
    pub fn pooled(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut buffers = self.buffers.lock().unwrap();
        if buffers.len() < self.max_pooled {
            buffers.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POOLED)
    }
}

/// Scoped borrow of a pool buffer.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Vec<u8>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        self.buf.as_ref().expect("buffer taken before drop")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buf.as_mut().expect("buffer taken before drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}
