//! Byte-array value store with per-key exclusive latches.
//!
//! Every value is a plain binary string. A command acquires the latch for
//! each key it touches and holds it until the command finishes; the latch map
//! itself is locked only long enough to look up or create a slot, never
//! across a latch acquisition. Multi-key commands acquire latches in
//! byte-lexicographic key order (duplicates once) so two commands can never
//! deadlock on each other.

use crate::error::{BitisError, BitisResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Maximum value size: 512 MB.
pub const MAX_VALUE_BYTES: usize = 512 * 1024 * 1024;

/// One keyed value. `None` means the key does not exist; readers treat an
/// absent value as an empty byte string.
#[derive(Debug, Default)]
pub struct Slot {
    data: Option<Vec<u8>>,
}

/// The shared keyspace.
#[derive(Debug, Default)]
pub struct Keyspace {
    slots: Mutex<HashMap<Vec<u8>, Arc<Mutex<Slot>>>>,
}

impl Keyspace {
    pub fn new() -> Self {
        Keyspace::default()
    }

    /// Acquire the exclusive latch for one key.
    pub async fn acquire(&self, key: &[u8]) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(key.to_vec()).or_default().clone()
        };
        KeyGuard {
            guard: slot.lock_owned().await,
        }
    }

    /// Acquire latches for several keys at once. Keys are deduplicated and
    /// locked in byte-lexicographic order.
    pub async fn acquire_many(&self, keys: &[&[u8]]) -> MultiGuard {
        let mut ordered: Vec<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
        ordered.sort();
        ordered.dedup();

        let mut entries = Vec::with_capacity(ordered.len());
        for key in ordered {
            let guard = self.acquire(&key).await;
            entries.push((key, guard));
        }
        MultiGuard { entries }
    }

    /// Number of live keys. Slots whose latch is currently held are counted
    /// as live; their holder may be writing them.
    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter(|slot| match slot.try_lock() {
                Ok(s) => s.data.is_some(),
                Err(_) => true,
            })
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Delete every value.
    pub async fn flush_all(&self) {
        let slots: Vec<Arc<Mutex<Slot>>> = {
            let slots = self.slots.lock().await;
            slots.values().cloned().collect()
        };
        for slot in slots {
            slot.lock().await.data = None;
        }
    }

    /// Drop slots that are unlocked, unreferenced, and hold no value.
    /// Returns the number of slots removed.
    pub async fn sweep_empty(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(s) => s.data.is_some(),
                Err(_) => true,
            }
        });
        before - slots.len()
    }
}

/// Exclusive access to one key's value for the duration of a command.
#[derive(Debug)]
pub struct KeyGuard {
    guard: OwnedMutexGuard<Slot>,
}

impl KeyGuard {
    /// The value's bytes; an absent key reads as empty.
    pub fn bytes(&self) -> &[u8] {
        self.guard.data.as_deref().unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.guard.data.is_some()
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole value, creating the key if absent.
    pub fn replace(&mut self, bytes: Vec<u8>) {
        self.guard.data = Some(bytes);
    }

    /// Delete the key. Returns whether it existed.
    pub fn remove(&mut self) -> bool {
        self.guard.data.take().is_some()
    }
}

/// Latches for a deduplicated, lexicographically ordered key set.
#[derive(Debug)]
pub struct MultiGuard {
    entries: Vec<(Vec<u8>, KeyGuard)>,
}

impl MultiGuard {
    pub fn get(&self, key: &[u8]) -> Option<&KeyGuard> {
        self.entries
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut KeyGuard> {
        self.entries
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            .ok()
            .map(|idx| &mut self.entries[idx].1)
    }
}

/// Zero-extend `value` to `len` bytes, reporting allocation failure instead
/// of aborting. Values are capped at [`MAX_VALUE_BYTES`].
pub fn grow_to(value: &mut Vec<u8>, len: usize) -> BitisResult<()> {
    if len > MAX_VALUE_BYTES {
        return Err(BitisError::BitOffset);
    }
    if len > value.len() {
        value
            .try_reserve(len - value.len())
            .map_err(|_| BitisError::OutOfMemory)?;
        value.resize(len, 0);
    }
    Ok(())
}

pub type SharedKeyspace = Arc<Keyspace>;
