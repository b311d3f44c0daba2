//! Single-slot blob storage backing `/write` and `/read`.
//!
//! There is one slot per server, not per connection. The last successful
//! save wins; a failed save leaves the previous contents in place.

use bytes::Bytes;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("payload of {len} bytes exceeds storage capacity of {capacity} bytes")]
    TooLarge { len: usize, capacity: usize },
}

#[derive(Debug)]
pub struct StorageSlot {
    data: Bytes,
    capacity: usize,
}

impl StorageSlot {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Bytes::new(),
            capacity,
        }
    }

    /// Replaces the stored blob with a copy of `data`.
    pub fn save(&mut self, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > self.capacity {
            debug!(len = data.len(), capacity = self.capacity, "storage save rejected");
            return Err(StorageError::TooLarge {
                len: data.len(),
                capacity: self.capacity,
            });
        }

        self.data = Bytes::copy_from_slice(data);
        Ok(())
    }

    /// Current blob, or `None` when nothing (or an empty payload) is stored.
    pub fn read(&self) -> Option<Bytes> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data.clone())
        }
    }

    pub fn clear(&mut self) {
        self.data = Bytes::new();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
