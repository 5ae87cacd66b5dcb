use crate::core::BodyHandle;
use crate::error::PhysicsError;
use crate::Result;

/// One arena slot: the live item (if any) and the generation it was stored under
#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

/// Generation-checked arena for the bodies of one world.
///
/// Freed slots are reused with a bumped generation, so a handle to a
/// destroyed body never reaches the body that later takes its slot. Handles
/// also carry the owning world's id and are rejected by any other world.
#[derive(Debug)]
pub struct BodyStorage<T> {
    world_id: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    /// Live handles in insertion order
    order: Vec<BodyHandle>,
}

impl<T> BodyStorage<T> {
    pub fn new(world_id: u32) -> Self {
        Self {
            world_id,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Stores an item and returns its handle
    pub fn add(&mut self, item: T) -> BodyHandle {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.item = Some(item);
                index
            }
            None => {
                self.slots.push(Slot { generation: 0, item: Some(item) });
                (self.slots.len() - 1) as u32
            }
        };

        let handle = BodyHandle {
            world_id: self.world_id,
            index,
            generation: self.slots[index as usize].generation,
        };
        self.order.push(handle);
        handle
    }

    fn slot_index(&self, handle: BodyHandle) -> Option<usize> {
        if handle.world_id != self.world_id {
            return None;
        }
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation && slot.item.is_some()).then_some(handle.index as usize)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.slot_index(handle).is_some()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&T> {
        let index = self.slot_index(handle)?;
        self.slots[index].item.as_ref()
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        let index = self.slot_index(handle)?;
        self.slots[index].item.as_mut()
    }

    /// Removes an item, freeing its slot for reuse
    pub fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        let index = self.slot_index(handle)?;
        let item = self.slots[index].item.take();
        self.free.push(index as u32);
        self.order.retain(|h| *h != handle);
        item
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        for handle in std::mem::take(&mut self.order) {
            let index = handle.index as usize;
            self.slots[index].item = None;
            self.free.push(handle.index);
        }
    }

    /// Live handles in insertion order
    pub fn handles(&self) -> &[BodyHandle] {
        &self.order
    }

    /// Iterates live items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |h| self.slots[h.index as usize].item.as_ref().map(|item| (*h, item)))
    }

    /// Iterates live items mutably, in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut T)> + '_ {
        let world_id = self.world_id;
        self.slots.iter_mut().enumerate().filter_map(move |(index, slot)| {
            let generation = slot.generation;
            slot.item.as_mut().map(|item| {
                let handle = BodyHandle { world_id, index: index as u32, generation };
                (handle, item)
            })
        })
    }

    /// Borrows two distinct items mutably at once
    pub fn get_pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut T, &mut T)> {
        let ia = self.slot_index(a)?;
        let ib = self.slot_index(b)?;
        if ia == ib {
            return None;
        }

        let (low, high) = (ia.min(ib), ia.max(ib));
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].item.as_mut()?;
        let second = tail[0].item.as_mut()?;
        if ia < ib {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }

    /// Gets an item by its handle, returning an error if the handle is stale or foreign
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get(handle).ok_or_else(|| self.invalid(handle))
    }

    /// Mutable variant of [`Self::get_body`]
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        let error = self.invalid(handle);
        self.get_mut(handle).ok_or(error)
    }

    fn invalid(&self, handle: BodyHandle) -> PhysicsError {
        if handle.world_id != self.world_id {
            PhysicsError::InvalidHandle(format!(
                "{:?} belongs to world {}, not world {}",
                handle, handle.world_id, self.world_id
            ))
        } else {
            PhysicsError::InvalidHandle(format!("{:?} refers to a destroyed body", handle))
        }
    }
}
