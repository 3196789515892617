//! Sparse vector storage
//!
//! [`CompressedVector`] keeps sorted `(index, value)` pairs and treats every
//! unlisted position as the zero element. It is only ever read by the
//! assignment engine, never written through a view.

use crate::alias::Footprint;
use crate::element::Element;
use crate::error::{Result, ViewError};
use crate::operand::{Capabilities, Operand};
use crate::restricted::{subvector_of, SparseSubvector};

/// Compressed (sorted index/value) sparse vector
///
/// # Examples
///
/// ```
/// use subvec::{CompressedVector, DynamicVector};
///
/// let sparse = CompressedVector::from_pairs(4, &[(1, 5)]).unwrap();
/// let dense = DynamicVector::from_slice(&[1, 2, 3, 4]);
/// dense.mul_assign(&sparse).unwrap();
///
/// assert_eq!(dense.to_vec(), vec![0, 10, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedVector<T: Element> {
    len: usize,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T: Element> CompressedVector<T> {
    /// Empty (all-zero) vector of `len` elements
    pub fn new(len: usize) -> Self {
        Self {
            len,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order
    ///
    /// Later duplicates win and default values are not stored.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidRange`] for an index `>= len`.
    pub fn from_pairs(len: usize, pairs: &[(usize, T)]) -> Result<Self> {
        let mut sorted = pairs.to_vec();
        if let Some(&(index, _)) = sorted.iter().find(|(index, _)| *index >= len) {
            return Err(ViewError::InvalidRange {
                offset: index,
                length: 1,
                size: len,
            });
        }

        // Stable sort keeps duplicate indices in input order; keep the last of each run
        sorted.sort_by_key(|&(index, _)| index);
        let mut vector = Self::new(len);
        for (pos, &(index, value)) in sorted.iter().enumerate() {
            let superseded = sorted
                .get(pos + 1)
                .is_some_and(|&(next, _)| next == index);
            if !superseded && !value.is_default() {
                vector.indices.push(index);
                vector.values.push(value);
            }
        }
        Ok(vector)
    }

    /// Evaluate an operand, keeping only its non-zero elements
    pub fn from_operand<S: Operand<Elem = T>>(src: S) -> Self {
        Self::from_operand_ref(&src)
    }

    pub(crate) fn from_operand_ref<S: Operand<Elem = T>>(src: &S) -> Self {
        let mut vector = Self::new(src.size());
        src.for_each_nonzero(&mut |index, value| {
            vector.indices.push(index);
            vector.values.push(value);
        });
        vector
    }

    /// Set the element at `index`; a default value removes the entry
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidRange`] if `index >= self.len()`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index >= self.len {
            return Err(ViewError::InvalidRange {
                offset: index,
                length: 1,
                size: self.len,
            });
        }

        match (self.indices.binary_search(&index), value.is_default()) {
            (Ok(pos), false) => self.values[pos] = value,
            (Ok(pos), true) => {
                self.indices.remove(pos);
                self.values.remove(pos);
            }
            (Err(pos), false) => {
                self.indices.insert(pos, index);
                self.values.insert(pos, value);
            }
            (Err(_), true) => {}
        }
        Ok(())
    }

    /// Element at `index` (zero when unlisted), or `None` past the end
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        Some(self.lookup(index))
    }

    fn lookup(&self, index: usize) -> T {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => T::default(),
        }
    }

    /// Logical length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored (non-zero) elements
    pub fn non_zeros(&self) -> usize {
        self.indices.len()
    }

    /// Stored `(index, value)` pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dense copy of all elements
    pub fn to_dense(&self) -> Vec<T> {
        let mut dense = vec![T::default(); self.len];
        for (index, value) in self.iter() {
            dense[index] = value;
        }
        dense
    }

    /// Read-only view of `[offset, offset + length)`
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::{CompressedVector, Operand};
    ///
    /// let sparse = CompressedVector::from_pairs(10, &[(2, 1.0), (6, 2.0), (8, 3.0)]).unwrap();
    /// let window = sparse.sparse_subvector(5, 4).unwrap();
    ///
    /// let mut seen = Vec::new();
    /// window.for_each_nonzero(&mut |i, v| seen.push((i, v)));
    /// assert_eq!(seen, vec![(1, 2.0), (3, 3.0)]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidRange`] if the range exceeds the vector.
    pub fn sparse_subvector(&self, offset: usize, length: usize) -> Result<SparseSubvector<'_, T>> {
        subvector_of(self, offset, length)
    }
}

impl<T: Element> Operand for &CompressedVector<T> {
    type Elem = T;

    fn size(&self) -> usize {
        self.len
    }

    fn at(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        self.lookup(index)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::sparse()
    }

    // Never a write target, so nothing can overlap it
    fn can_alias(&self, _target: &Footprint) -> bool {
        false
    }

    fn is_aliased(&self, _target: &Footprint) -> bool {
        false
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, T)) {
        for (index, value) in self.iter() {
            f(index, value);
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the dense copy agrees with point lookups
        #[test]
        fn test_to_dense_matches_get(
            pairs in prop::collection::vec((0usize..64, -100i32..100), 0..32)
        ) {
            let v = CompressedVector::from_pairs(64, &pairs).unwrap();
            let dense = v.to_dense();
            for (i, &x) in dense.iter().enumerate() {
                prop_assert_eq!(v.get(i), Some(x));
            }
            prop_assert!(v.iter().all(|(_, x)| x != 0));
            prop_assert!(v.indices.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
