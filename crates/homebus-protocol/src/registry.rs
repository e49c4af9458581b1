//! Discovery registry for binary-state devices.
//!
//! The bus never states how many lights or outlets a room has. A slot is
//! considered to exist once it has been seen on (`0xFF`) in a frame where not
//! every slot reads on. Entries only grow; nothing is ever forgotten.

use std::collections::BTreeMap;

use serde::ser::{Serialize, Serializer};

use crate::constants::BINARY_SLOT_COUNT;
use crate::types::{BinaryCategory, SlotSet};

/// Per-category mapping from room id to the slots confirmed present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryRegistry {
    rooms: BTreeMap<(BinaryCategory, u8), SlotSet>,
}

/// One room's entry, as yielded by [`DiscoveryRegistry::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RegistryEntry {
    /// Light or outlet.
    pub category: BinaryCategory,
    /// Room id.
    pub room: u8,
    /// Slots discovered in the room.
    pub slots: SlotSet,
}

impl DiscoveryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a slot as present. Returns `true` if it was newly discovered.
    pub fn insert(&mut self, category: BinaryCategory, room: u8, slot: u8) -> bool {
        if usize::from(slot) >= BINARY_SLOT_COUNT {
            return false;
        }
        self.rooms.entry((category, room)).or_default().insert(slot)
    }

    /// Slots discovered for a room (empty if the room is unknown).
    pub fn slots(&self, category: BinaryCategory, room: u8) -> SlotSet {
        self.rooms
            .get(&(category, room))
            .copied()
            .unwrap_or_default()
    }

    /// Whether a slot has been discovered.
    pub fn contains(&self, category: BinaryCategory, room: u8, slot: u8) -> bool {
        self.slots(category, room).contains(slot)
    }

    /// Rooms with at least one discovered slot in a category, ascending.
    pub fn rooms(&self, category: BinaryCategory) -> impl Iterator<Item = (u8, SlotSet)> + '_ {
        self.rooms
            .iter()
            .filter(move |((c, _), _)| *c == category)
            .map(|(&(_, room), &slots)| (room, slots))
    }

    /// Total discovered slots in a category.
    pub fn slot_count(&self, category: BinaryCategory) -> usize {
        self.rooms(category).map(|(_, slots)| slots.len()).sum()
    }

    /// All entries, ordered by category then room.
    pub fn iter(&self) -> impl Iterator<Item = RegistryEntry> + '_ {
        self.rooms
            .iter()
            .map(|(&(category, room), &slots)| RegistryEntry {
                category,
                room,
                slots,
            })
    }

    /// Number of (category, room) entries.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether nothing has been discovered yet.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Serialize for DiscoveryRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
