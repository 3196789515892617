//! Read-only views over operands without storage
//!
//! A cross product or any other composed expression has no backing memory to
//! point into, so a view of it owns the expression node and re-indexes it.
//! The wrapper never offers write access and always reports itself as
//! non-vectorizable.

use crate::alias::Footprint;
use crate::element::Element;
use crate::error::Result;
use crate::operand::{Capabilities, Operand};
use crate::sparse::CompressedVector;
use crate::view::check_bounds;

/// Read-only window `[offset, offset + length)` into an operand
///
/// # Examples
///
/// ```
/// use subvec::{subvector_of, DynamicVector, OperandExt};
///
/// let a = DynamicVector::from_slice(&[1, 0, 0]);
/// let b = DynamicVector::from_slice(&[0, 1, 0]);
///
/// // z-component of x cross y
/// let z = subvector_of(a.cross(&b).unwrap(), 2, 1).unwrap();
/// assert_eq!(z.to_vec(), vec![1]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RestrictedView<E> {
    expr: E,
    offset: usize,
    length: usize,
}

/// Read-only window into a [`CompressedVector`]
pub type SparseSubvector<'a, T> = RestrictedView<&'a CompressedVector<T>>;

/// Wrap `expr` in a read-only view of `[offset, offset + length)`
///
/// # Errors
///
/// Returns [`ViewError::InvalidRange`] if `offset + length > expr.size()`.
pub fn subvector_of<E: Operand>(expr: E, offset: usize, length: usize) -> Result<RestrictedView<E>> {
    check_bounds(offset, length, expr.size())?;
    Ok(RestrictedView {
        expr,
        offset,
        length,
    })
}

impl<E: Operand> RestrictedView<E> {
    /// First element of the wrapped operand covered by this view
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if view is empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<E::Elem> {
        (index < self.length).then(|| self.expr.at(self.offset + index))
    }

    /// Iterator over element values
    pub fn iter(&self) -> impl Iterator<Item = E::Elem> + '_ {
        (0..self.length).map(move |i| self.expr.at(self.offset + i))
    }

    /// Copy elements out
    pub fn to_vec(&self) -> Vec<E::Elem> {
        self.iter().collect()
    }

    /// Nested read-only view; offsets compose on the wrapped operand
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidRange`] if the range exceeds this view.
    pub fn subvector(&self, offset: usize, length: usize) -> Result<Self>
    where
        E: Clone,
    {
        check_bounds(offset, length, self.length)?;
        Ok(Self {
            expr: self.expr.clone(),
            offset: self.offset + offset,
            length,
        })
    }
}

impl<E: Operand> Operand for RestrictedView<E> {
    type Elem = E::Elem;

    fn size(&self) -> usize {
        self.length
    }

    fn at(&self, index: usize) -> E::Elem {
        debug_assert!(index < self.length);
        self.expr.at(self.offset + index)
    }

    fn capabilities(&self) -> Capabilities {
        let inner = self.expr.capabilities();
        Capabilities {
            density: inner.density,
            ..Capabilities::dense().non_vectorizable()
        }
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.expr.can_alias(target)
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.expr.is_aliased(target)
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, E::Elem)) {
        if self.expr.capabilities().is_sparse() {
            let (start, end) = (self.offset, self.offset + self.length);
            self.expr.for_each_nonzero(&mut |index, value| {
                if (start..end).contains(&index) {
                    f(index - start, value);
                }
            });
        } else {
            for i in 0..self.length {
                let value = self.at(i);
                if !value.is_default() {
                    f(i, value);
                }
            }
        }
    }
}

impl<T: Element> SparseSubvector<'_, T> {
    /// Number of stored elements inside the window
    pub fn non_zeros(&self) -> usize {
        let (start, end) = (self.offset, self.offset + self.length);
        self.expr
            .iter()
            .filter(|(index, _)| (start..end).contains(index))
            .count()
    }
}
