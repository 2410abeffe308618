//! Generation-checked arena for aura instances.
//!
//! Auras are referenced from several units at once (holder, every target,
//! caster-side single-target links). Storing them in one arena and handing
//! out `(index, generation)` handles means a handle to a released aura
//! simply fails to resolve instead of aliasing a newer one.

use super::Aura;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraHandle {
    index: u32,
    generation: u32,
}

impl AuraHandle {
    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    aura: Option<Aura>,
}

#[derive(Clone, Debug, Default)]
pub struct AuraArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl AuraArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, aura: Aura) -> AuraHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.aura = Some(aura);
            return AuraHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            aura: Some(aura),
        });
        AuraHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: AuraHandle) -> Option<&Aura> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.aura.as_ref())
    }

    pub fn get_mut(&mut self, handle: AuraHandle) -> Option<&mut Aura> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.aura.as_mut())
    }

    pub fn contains(&self, handle: AuraHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Releases the aura; the slot's generation is bumped so stale handles miss.
    pub fn remove(&mut self, handle: AuraHandle) -> Option<Aura> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let aura = slot.aura.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(aura)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live handles in slot order.
    pub fn handles(&self) -> impl Iterator<Item = AuraHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.aura.as_ref().map(|_| AuraHandle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (AuraHandle, &Aura)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.aura.as_ref().map(|aura| {
                (
                    AuraHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    aura,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Millis, SpellId, UnitId};

    fn aura(spell: u32) -> Aura {
        Aura::new(SpellId(spell), UnitId(1), UnitId(2), None, Some(Millis(1000)))
    }

    #[test]
    fn stale_handles_do_not_resolve_after_reuse() {
        let mut arena = AuraArena::new();
        let first = arena.insert(aura(1));
        assert!(arena.remove(first).is_some());

        let second = arena.insert(aura(2));
        assert_eq!(first.index(), second.index());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).map(|a| a.spell()), Some(SpellId(2)));
        assert!(arena.remove(first).is_none());
        assert_eq!(arena.len(), 1);
    }
}
