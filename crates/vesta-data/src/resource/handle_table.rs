// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generation-checked slot storage for one resource type.

use vesta_core::resource::{Handle, ResourceMetadata};

/// The outcome of [`HandleTable::release`].
#[derive(Debug)]
pub enum Release<T> {
    /// The handle was stale or out of range. Nothing happened.
    Stale,
    /// The reference count was decremented and is still positive.
    Retained(u32),
    /// The last reference was dropped. The slot's generation has moved on and
    /// the payload is handed back for destruction. The payload is `None` if it
    /// was checked out with [`HandleTable::take_payload`] at the time.
    Freed(Option<T>, ResourceMetadata),
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    ref_count: u32,
    live: bool,
    payload: Option<T>,
    metadata: ResourceMetadata,
}

/// A slot allocator handing out [`Handle`]s for values of type `T`.
///
/// Freed indices are reused with the next generation, so a handle captured
/// before a slot was freed never resolves to whatever lives there later.
/// A slot whose generation would wrap around is retired instead of reused.
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty table with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Stores `payload` in a free slot (growing the table if needed) and
    /// returns its handle. The reference count starts at one.
    pub fn allocate(&mut self, payload: T, metadata: ResourceMetadata) -> Handle<T> {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.live, "free list holds a live slot");
            slot.live = true;
            slot.ref_count = 1;
            slot.payload = Some(payload);
            slot.metadata = metadata;
            return Handle::from_raw_parts(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            ref_count: 1,
            live: true,
            payload: Some(payload),
            metadata,
        });
        Handle::from_raw_parts(index, 1)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation())
    }

    fn slot_mut(&mut self, handle: Handle<T>) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation())
    }

    /// Returns `true` if `handle` was the last occupant of a slot that is
    /// still free. Releasing such a handle again is a double release.
    pub fn just_freed(&self, handle: Handle<T>) -> bool {
        self.slots.get(handle.index() as usize).is_some_and(|slot| {
            !slot.live && slot.generation == handle.generation().wrapping_add(1)
        })
    }

    /// Returns `true` if `handle` refers to a live slot.
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    /// The payload behind `handle`, or `None` if the handle is stale, out of
    /// range, or the payload is currently checked out.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|slot| slot.payload.as_ref())
    }

    /// Mutable access to the payload behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slot_mut(handle).and_then(|slot| slot.payload.as_mut())
    }

    /// The bookkeeping of a live slot.
    pub fn metadata(&self, handle: Handle<T>) -> Option<&ResourceMetadata> {
        self.slot(handle).map(|slot| &slot.metadata)
    }

    /// Mutable bookkeeping of a live slot.
    pub fn metadata_mut(&mut self, handle: Handle<T>) -> Option<&mut ResourceMetadata> {
        self.slot_mut(handle).map(|slot| &mut slot.metadata)
    }

    /// The reference count of a live slot.
    pub fn ref_count(&self, handle: Handle<T>) -> Option<u32> {
        self.slot(handle).map(|slot| slot.ref_count)
    }

    /// Adds a reference to a live slot and returns the new count.
    pub fn retain(&mut self, handle: Handle<T>) -> Option<u32> {
        self.slot_mut(handle).map(|slot| {
            slot.ref_count = slot.ref_count.saturating_add(1);
            slot.ref_count
        })
    }

    /// Drops a reference. At zero the slot is freed and its generation moves on.
    pub fn release(&mut self, handle: Handle<T>) -> Release<T> {
        let Some(slot) = self.slot_mut(handle) else {
            return Release::Stale;
        };

        debug_assert!(slot.ref_count > 0, "live slot with a zero reference count");
        slot.ref_count = slot.ref_count.saturating_sub(1);
        if slot.ref_count > 0 {
            return Release::Retained(slot.ref_count);
        }

        let (payload, metadata) = Self::free_slot(slot);
        let retired = slot.generation == 0;
        self.live -= 1;
        if !retired {
            self.free_list.push(handle.index());
        }
        Release::Freed(payload, metadata)
    }

    // Marks a slot free and advances its generation. A generation of 0 marks
    // a retired slot that never re-enters the free list.
    fn free_slot(slot: &mut Slot<T>) -> (Option<T>, ResourceMetadata) {
        slot.live = false;
        slot.ref_count = 0;
        slot.generation = slot.generation.checked_add(1).unwrap_or(0);
        (slot.payload.take(), std::mem::take(&mut slot.metadata))
    }

    /// Checks the payload out of a live slot, leaving the slot live but empty.
    ///
    /// Used when the payload needs mutable access to its owner while it is
    /// being worked on. Put it back with [`HandleTable::restore_payload`].
    pub fn take_payload(&mut self, handle: Handle<T>) -> Option<T> {
        self.slot_mut(handle).and_then(|slot| slot.payload.take())
    }

    /// Returns a checked-out payload to its slot.
    ///
    /// If the slot was freed in the meantime the payload is handed back as
    /// `Err` so the caller can destroy it.
    pub fn restore_payload(&mut self, handle: Handle<T>, payload: T) -> Result<(), T> {
        match self.slot_mut(handle) {
            Some(slot) if slot.payload.is_none() => {
                slot.payload = Some(payload);
                Ok(())
            }
            _ => Err(payload),
        }
    }

    /// Frees every live slot regardless of its reference count.
    pub fn drain(&mut self) -> Vec<(Handle<T>, Option<T>, ResourceMetadata)> {
        let mut drained = Vec::with_capacity(self.live);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.live {
                continue;
            }
            let handle = Handle::from_raw_parts(index as u32, slot.generation);
            let (payload, metadata) = Self::free_slot(slot);
            if slot.generation != 0 {
                self.free_list.push(index as u32);
            }
            drained.push((handle, payload, metadata));
        }
        self.live = 0;
        drained
    }

    /// Iterates over live slots whose payload is present.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let payload = slot.payload.as_ref().filter(|_| slot.live)?;
            Some((Handle::from_raw_parts(index as u32, slot.generation), payload))
        })
    }

    /// Handles of every live slot.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.live)
            .map(|(index, slot)| Handle::from_raw_parts(index as u32, slot.generation))
            .collect()
    }

    /// The number of live slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no slot is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The number of slots ever allocated, live or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
