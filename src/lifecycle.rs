/// Ownership state of a resource the coordinator releases exactly once.
#[derive(Debug)]
pub enum Slot<T> {
    /// Never acquired.
    Vacant,
    Active(T),
    Released,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Vacant
    }
}

impl<T> Slot<T> {
    pub fn is_released(self: &Self) -> bool {
        matches!(self, Slot::Released)
    }

    pub fn get(self: &Self) -> Option<&T> {
        match self {
            Slot::Active(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(self: &mut Self) -> Option<&mut T> {
        match self {
            Slot::Active(value) => Some(value),
            _ => None,
        }
    }

    /// Hands out the resource for release. Only the first call on an active
    /// slot yields it; every later call, and any call on a vacant slot,
    /// returns `None`.
    pub fn release(self: &mut Self) -> Option<T> {
        match std::mem::replace(self, Slot::Released) {
            Slot::Active(value) => Some(value),
            Slot::Vacant => {
                *self = Slot::Vacant;
                None
            }
            Slot::Released => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Slot;

    #[test]
    fn releases_once() {
        let mut slot = Slot::Active(7);
        assert_eq!(slot.release(), Some(7));
        assert!(slot.is_released());
        assert_eq!(slot.release(), None);
    }

    #[test]
    fn vacant_slot_stays_vacant() {
        let mut slot: Slot<u8> = Slot::default();
        assert_eq!(slot.release(), None);
        assert!(!slot.is_released());
        assert!(slot.get().is_none());
    }
}
