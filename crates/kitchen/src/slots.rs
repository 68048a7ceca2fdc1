use uuid::Uuid;

/// Fixed arena of worker slots, one per unit of the worker gate.
///
/// A slot is picked at grant time as the lowest index nobody occupies, so
/// indices are reused as orders finish.
#[derive(Clone, Debug)]
pub struct SlotAllocator {
    slots: Vec<Option<Uuid>>,
}

impl SlotAllocator {
    pub fn new(size: usize) -> Self {
        Self { slots: vec![None; size] }
    }

    /// Place `order` in the lowest free slot.
    pub fn assign(&mut self, order: Uuid) -> Option<usize> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(order);
        Some(index)
    }

    /// Free `index` if `order` occupies it.
    pub fn release(&mut self, index: usize, order: Uuid) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if *slot == Some(order) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn as_slice(&self) -> &[Option<Uuid>] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_lowest_free_index_and_reuses_it() {
        let mut slots = SlotAllocator::new(3);
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(slots.assign(a), Some(0));
        assert_eq!(slots.assign(b), Some(1));
        assert_eq!(slots.assign(c), Some(2));
        assert_eq!(slots.assign(d), None);

        assert!(slots.release(1, b));
        assert_eq!(slots.assign(d), Some(1));
        assert_eq!(slots.occupied(), 3);
    }

    #[test]
    fn release_checks_the_occupant() {
        let mut slots = SlotAllocator::new(2);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        slots.assign(a);

        assert!(!slots.release(0, b));
        assert!(!slots.release(5, a));
        assert!(slots.release(0, a));
        assert!(!slots.release(0, a));
        assert_eq!(slots.as_slice(), &[None, None]);
    }
}
