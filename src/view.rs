//! Subvector views
//!
//! A [`Subvector`] is a non-owning handle onto `[offset, offset + length)` of a
//! dense parent. It holds the parent's whole allocation plus the offset
//! ("arena + index"), so a view of a view is just another offset into the
//! same root storage and element access costs the same at any depth.
//!
//! Views are `Copy` and any number of them, overlapping or not, may exist
//! at once. Writes go through `Cell`s, so everything stays on one thread;
//! the parent cannot be resized or dropped while a view borrows it.
//!
//! # Examples
//!
//! ```
//! use subvec::{subvector, DynamicVector};
//!
//! let parent = DynamicVector::from_slice(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
//! let view = subvector(&parent, 3, 4).unwrap();
//! assert_eq!(view.to_vec(), vec![3, 4, 5, 6]);
//!
//! view.add_assign(&DynamicVector::from_slice(&[10; 4])).unwrap();
//! assert_eq!(parent.to_vec(), vec![0, 1, 2, 13, 14, 15, 16, 7, 8, 9]);
//! ```

use std::cell::Cell;
use std::fmt;

use crate::alias::{Footprint, StorageId};
use crate::backends::Kernel;
use crate::config::EngineConfig;
use crate::dense::DenseStorage;
use crate::element::Element;
use crate::engine::{self, AssignOp};
use crate::error::{Result, ViewError};
use crate::expr::OperandExt;
use crate::layout::{compute_alignment, Alignment};
use crate::operand::{Capabilities, Operand};
use crate::simd::SimdCaps;
use crate::Backend;

/// Writable view of a contiguous range of a dense parent
#[derive(Clone, Copy)]
pub struct Subvector<'a, T: Element> {
    root: &'a [Cell<T>],
    parent_size: usize,
    offset: usize,
    length: usize,
    config: EngineConfig,
    simd: SimdCaps,
    alignment: Alignment,
}

/// Create a view of `[offset, offset + length)` of `parent`
///
/// # Errors
///
/// Returns [`ViewError::InvalidRange`] if `offset + length > parent.size()`.
/// The range is never clamped.
pub fn subvector<'a, T, P>(parent: &'a P, offset: usize, length: usize) -> Result<Subvector<'a, T>>
where
    T: Element,
    P: DenseStorage<T> + ?Sized,
{
    check_bounds(offset, length, parent.size())?;
    Ok(Subvector::from_parts(
        parent.cells(),
        parent.size(),
        offset,
        length,
        parent.config(),
    ))
}

/// Overflow-safe `offset + length <= size`
pub(crate) fn check_bounds(offset: usize, length: usize, size: usize) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ViewError::InvalidRange {
            offset,
            length,
            size,
        }),
    }
}

impl<'a, T: Element> Subvector<'a, T> {
    fn from_parts(
        root: &'a [Cell<T>],
        parent_size: usize,
        offset: usize,
        length: usize,
        config: EngineConfig,
    ) -> Self {
        let simd = SimdCaps::of::<T>(config.backend);
        Self {
            root,
            parent_size,
            offset,
            length,
            config,
            simd,
            alignment: compute_alignment(offset, length, parent_size, simd.width),
        }
    }

    /// View of the whole logical range of `parent`
    pub(crate) fn whole<P: DenseStorage<T> + ?Sized>(parent: &'a P) -> Self {
        Self::from_parts(parent.cells(), parent.size(), 0, parent.size(), parent.config())
    }

    /// Nested view of `[offset, offset + length)` relative to this view
    ///
    /// The result points into the same root storage with the offsets added;
    /// it does not reference `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::DynamicVector;
    ///
    /// let parent = DynamicVector::from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
    /// let outer = parent.subvector(2, 5).unwrap();
    /// let inner = outer.subvector(1, 3).unwrap();
    ///
    /// assert_eq!(inner.offset(), 3);
    /// assert_eq!(inner.to_vec(), vec![3, 4, 5]);
    /// assert!(outer.subvector(4, 2).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidRange`] if the range exceeds this view.
    pub fn subvector(&self, offset: usize, length: usize) -> Result<Subvector<'a, T>> {
        check_bounds(offset, length, self.length)?;
        let root_offset = self.offset + offset;
        check_bounds(root_offset, length, self.parent_size)?;
        Ok(Self::from_parts(
            self.root,
            self.parent_size,
            root_offset,
            length,
            self.config,
        ))
    }

    /// First element in the root parent
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

    /// Logical size of the root parent
    pub fn parent_size(&self) -> usize {
        self.parent_size
    }

    /// Parent capacity from this view's offset on, padding included
    pub fn capacity(&self) -> usize {
        self.root.len() - self.offset
    }

    /// Alignment facts cached at construction
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Whether the view starts on a register boundary and spans whole
    /// registers or runs to the parent's end
    pub fn is_aligned(&self) -> bool {
        self.alignment.is_aligned
    }

    /// Vector-width capabilities for this element type and backend
    pub fn simd(&self) -> SimdCaps {
        self.simd
    }

    /// Engine configuration inherited from the parent
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Backend inherited from the parent
    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    /// Identity of the root storage
    pub fn storage_id(&self) -> StorageId {
        StorageId::of(self.root)
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.length).then(|| self.root[self.offset + index].get())
    }

    /// Element at `index`; out-of-range indices are a caller bug
    #[inline]
    pub fn at(&self, index: usize) -> T {
        debug_assert!(index < self.length, "index {index} out of view of length {}", self.length);
        self.root[self.offset + index].get()
    }

    /// Overwrite the element at `index`; out-of-range indices are a caller bug
    #[inline]
    pub fn set(&self, index: usize, value: T) {
        debug_assert!(index < self.length, "index {index} out of view of length {}", self.length);
        self.root[self.offset + index].set(value);
    }

    /// Iterator over element values
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        self.cells().iter().map(Cell::get)
    }

    /// Copy elements out
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Set every element to `value`
    pub fn fill(&self, value: T) {
        for cell in self.cells() {
            cell.set(value);
        }
    }

    /// Set every element to the default (zero) value
    pub fn reset(&self) {
        self.fill(T::default());
    }

    /// Alias of [`Subvector::reset`]
    pub fn clear(&self) {
        self.reset();
    }

    /// Number of non-default elements
    pub fn non_zeros(&self) -> usize {
        self.iter().filter(|value| !value.is_default()).count()
    }

    /// Whether every element is the default value
    pub fn is_default(&self) -> bool {
        self.iter().all(|value| value.is_default())
    }

    /// `self = src`
    ///
    /// Overlapping sources are copied to a temporary first; assigning a view
    /// to itself does nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::DynamicVector;
    ///
    /// let v = DynamicVector::from_slice(&[0, 1, 2, 3, 4, 5, 6]);
    /// let head = v.subvector(0, 5).unwrap();
    /// head.assign(v.subvector(2, 5).unwrap()).unwrap();
    ///
    /// assert_eq!(v.to_vec(), vec![2, 3, 4, 5, 6, 5, 6]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if `src.size() != self.len()`;
    /// nothing is written in that case.
    pub fn assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        engine::execute(self, &src, AssignOp::Assign)
    }

    /// `self += src`
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn add_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        engine::execute(self, &src, AssignOp::Add)
    }

    /// `self -= src`
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn sub_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        engine::execute(self, &src, AssignOp::Sub)
    }

    /// `self *= src` (element-wise)
    ///
    /// With a sparse source every unlisted position becomes zero.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn mul_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        engine::execute(self, &src, AssignOp::Mul)
    }

    /// `self = self * scalar`
    pub fn mul_assign_scalar(&self, scalar: T) {
        // Sizes match by construction; the self-read goes through a temporary
        let result = self.assign(self.mul_scalar(scalar));
        debug_assert!(result.is_ok());
    }

    /// `self = self / scalar`
    ///
    /// Floating-point views multiply by the reciprocal.
    pub fn div_assign_scalar(&self, scalar: T) {
        let result = self.assign(self.div_scalar(scalar));
        debug_assert!(result.is_ok());
    }

    /// In-place scaling, same as [`Subvector::mul_assign_scalar`]
    pub fn scale(&self, scalar: T) {
        self.mul_assign_scalar(scalar);
    }

    /// Cells covered by the view
    pub(crate) fn cells(&self) -> &'a [Cell<T>] {
        &self.root[self.offset..self.offset + self.length]
    }

    /// The root allocation, padding included
    pub(crate) fn root_cells(&self) -> &'a [Cell<T>] {
        self.root
    }

    /// Root-storage range written by assignments to this view
    pub(crate) fn write_footprint(&self) -> Footprint {
        Footprint::new(self.storage_id(), self.offset, self.length)
    }
}

impl<T: Element> Operand for Subvector<'_, T> {
    type Elem = T;

    fn size(&self) -> usize {
        self.length
    }

    #[inline]
    fn at(&self, index: usize) -> T {
        Subvector::at(self, index)
    }

    fn capabilities(&self) -> Capabilities {
        if T::KIND.is_arithmetic() {
            Capabilities::dense()
        } else {
            Capabilities::dense().non_vectorizable()
        }
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.storage_id() == target.storage
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.write_footprint().overlaps(target)
    }

    fn footprint(&self) -> Option<Footprint> {
        Some(self.write_footprint())
    }

    fn load_block(&self, start: usize, out: &mut [T], _kernel: Kernel) {
        let cells = &self.cells()[start..start + out.len()];
        for (slot, cell) in out.iter_mut().zip(cells) {
            *slot = cell.get();
        }
    }
}

impl<T: Element> fmt::Debug for Subvector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subvector")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("data", &self.to_vec())
            .field("aligned", &self.alignment.is_aligned)
            .finish()
    }
}
