// Evsync State - Valuator Masks
// Sparse logical-valuator values with a per-index set bit

use crate::input::MAX_VALUATORS;

/// Sparse map from logical valuator index to value.
///
/// Storage is fixed-size; indices at or beyond [`MAX_VALUATORS`] are ignored.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ValuatorMask {
    set: u64,
    values: [i32; MAX_VALUATORS],
}

impl ValuatorMask {
    pub const fn new() -> Self {
        Self {
            set: 0,
            values: [0; MAX_VALUATORS],
        }
    }

    /// Build a mask from `(index, value)` pairs
    pub fn from_pairs(pairs: &[(usize, i32)]) -> Self {
        let mut mask = Self::new();
        for (index, value) in pairs {
            mask.set(*index, *value);
        }
        mask
    }

    pub fn set(&mut self, index: usize, value: i32) {
        if index < MAX_VALUATORS {
            self.set |= 1u64 << index;
            self.values[index] = value;
        }
    }

    pub fn unset(&mut self, index: usize) {
        if index < MAX_VALUATORS {
            self.set &= !(1u64 << index);
            self.values[index] = 0;
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        index < MAX_VALUATORS && self.set & (1u64 << index) != 0
    }

    /// Value at `index`, if set
    pub fn get(&self, index: usize) -> Option<i32> {
        if self.is_set(index) {
            Some(self.values[index])
        } else {
            None
        }
    }

    /// Clear every entry
    pub fn zero(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.set == 0
    }

    /// Number of set entries
    pub fn count(&self) -> usize {
        self.set.count_ones() as usize
    }

    /// One past the highest set index, 0 when empty
    pub fn size(&self) -> usize {
        (64 - self.set.leading_zeros()) as usize
    }

    /// Set entries in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        (0..MAX_VALUATORS).filter_map(move |index| self.get(index).map(|value| (index, value)))
    }

    /// Copy every entry of `other` that is not set here
    pub fn fill_missing_from(&mut self, other: &ValuatorMask) {
        for (index, value) in other.iter() {
            if !self.is_set(index) {
                self.set(index, value);
            }
        }
    }

    /// Copy every entry of `other`, overwriting existing values
    pub fn merge_from(&mut self, other: &ValuatorMask) {
        for (index, value) in other.iter() {
            self.set(index, value);
        }
    }
}

impl Default for ValuatorMask {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValuatorMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_unset() {
        let mut mask = ValuatorMask::new();
        assert!(mask.is_empty());

        mask.set(3, -12);
        assert_eq!(mask.get(3), Some(-12));
        assert_eq!(mask.get(2), None);
        assert_eq!(mask.size(), 4);
        assert_eq!(mask.count(), 1);

        mask.unset(3);
        assert!(mask.is_empty());
        assert_eq!(mask.size(), 0);
    }

    #[test]
    fn test_set_zero_value_is_still_set() {
        let mut mask = ValuatorMask::new();
        mask.set(0, 0);
        assert!(mask.is_set(0));
        assert_eq!(mask.get(0), Some(0));
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let mut mask = ValuatorMask::new();
        mask.set(MAX_VALUATORS, 5);
        assert!(mask.is_empty());
        assert!(!mask.is_set(MAX_VALUATORS));
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut mask = ValuatorMask::from_pairs(&[(0, 10)]);
        let other = ValuatorMask::from_pairs(&[(0, 99), (1, 20)]);
        mask.fill_missing_from(&other);
        assert_eq!(mask.get(0), Some(10));
        assert_eq!(mask.get(1), Some(20));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut mask = ValuatorMask::from_pairs(&[(0, 10)]);
        mask.merge_from(&ValuatorMask::from_pairs(&[(0, 99)]));
        assert_eq!(mask.get(0), Some(99));
    }

    #[test]
    fn test_iter_in_index_order() {
        let mask = ValuatorMask::from_pairs(&[(5, 1), (1, 2)]);
        let entries: Vec<_> = mask.iter().collect();
        assert_eq!(entries, vec![(1, 2), (5, 1)]);
    }
}
