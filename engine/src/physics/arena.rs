//! Body storage addressed by generational handles
//!
//! The scene owns every body through a [`BodySet`]. Force registrations and
//! contacts refer to bodies by [`BodyHandle`], never by reference, so a body
//! can be removed without leaving dangling pointers behind: the slot's
//! generation is bumped and every outstanding handle to it goes stale.
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{BodySet, Particle, Vec3};
//!
//! let mut bodies = BodySet::new();
//! let a = bodies.insert(Particle::new(1.0, Vec3::ZERO)?);
//! bodies.remove(a);
//! assert!(bodies.get(a).is_none());
//! ```

use serde::{Deserialize, Serialize};

/// Stable reference to a body stored in a [`BodySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Slot index inside the owning set.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot at the time the handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<B> {
    generation: u32,
    body: Option<B>,
}

/// Generational arena of bodies.
///
/// Freed slots are recycled; their generation is incremented on removal so
/// handles issued before the removal no longer resolve.
#[derive(Debug, Clone)]
pub struct BodySet<B> {
    slots: Vec<Slot<B>>,
    free: Vec<u32>,
    len: usize,
}

impl<B> Default for BodySet<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> BodySet<B> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores a body and returns its handle.
    pub fn insert(&mut self, body: B) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    /// Removes a body, invalidating every handle to it.
    ///
    /// # Returns
    ///
    /// The removed body, or `None` if the handle was already stale
    pub fn remove(&mut self, handle: BodyHandle) -> Option<B> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(body)
    }

    /// Returns true if the handle still refers to a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&B> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut B> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Borrows two distinct bodies mutably at the same time.
    ///
    /// Returns `None` if either handle is stale or both name the same slot.
    pub fn get_pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut B, &mut B)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (low, high, swapped) = if a.index < b.index {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].body.as_mut()?;
        let second = tail[0].body.as_mut()?;

        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    /// Number of live bodies.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every body. All outstanding handles go stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    /// Iterates live bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &B)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut B)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.body.as_mut().map(|body| {
                (
                    BodyHandle {
                        index: index as u32,
                        generation,
                    },
                    body,
                )
            })
        })
    }

    /// Handles of every live body, in slot order.
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut set = BodySet::new();
        let a = set.insert(1);
        let b = set.insert(2);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(a), Some(&1));
        assert_eq!(set.get(b), Some(&2));
    }

    #[test]
    fn test_removed_handle_goes_stale() {
        let mut set = BodySet::new();
        let a = set.insert("a");
        assert_eq!(set.remove(a), Some("a"));
        assert!(set.get(a).is_none());
        assert!(set.remove(a).is_none());
        assert!(set.is_empty());

        // Slot is recycled under a new generation
        let b = set.insert("b");
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(set.get(a).is_none());
        assert_eq!(set.get(b), Some(&"b"));
    }

    #[test]
    fn test_get_pair_mut_order() {
        let mut set = BodySet::new();
        let a = set.insert(10);
        let b = set.insert(20);

        let (x, y) = set.get_pair_mut(b, a).unwrap();
        assert_eq!((*x, *y), (20, 10));
        *x += 1;
        *y += 1;
        assert_eq!(set.get(a), Some(&11));
        assert_eq!(set.get(b), Some(&21));
    }

    #[test]
    fn test_get_pair_mut_rejects_same_or_stale() {
        let mut set = BodySet::new();
        let a = set.insert(1);
        let b = set.insert(2);
        assert!(set.get_pair_mut(a, a).is_none());

        set.remove(b);
        assert!(set.get_pair_mut(a, b).is_none());
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut set = BodySet::new();
        let handles: Vec<_> = (0..4).map(|i| set.insert(i)).collect();
        set.clear();
        assert!(set.is_empty());
        assert!(handles.iter().all(|h| !set.contains(*h)));
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn test_iter_skips_holes() {
        let mut set = BodySet::new();
        let a = set.insert(1);
        let b = set.insert(2);
        let c = set.insert(3);
        set.remove(b);

        assert_eq!(set.handles(), vec![a, c]);
        for (_, value) in set.iter_mut() {
            *value *= 10;
        }
        let values: Vec<_> = set.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 30]);
    }
}
