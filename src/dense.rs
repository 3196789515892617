//! Dense parent containers
//!
//! [`DynamicVector`] owns a padded allocation; [`CustomVector`] adopts a
//! caller-provided slice without padding. Both store their elements as
//! `Cell<T>`, which is what lets several views of the same parent be written
//! on one thread while the parent is only shared-borrowed.

use std::cell::Cell;
use std::fmt;

use crate::alias::{Footprint, StorageId};
use crate::backends::Kernel;
use crate::config::EngineConfig;
use crate::element::Element;
use crate::error::Result;
use crate::operand::{Capabilities, Operand};
use crate::simd::{padded_len, padding_width, MAX_REGISTER_BYTES};
use crate::view::{subvector, Subvector};
use crate::Backend;

/// Parent container interface consumed by views
pub trait DenseStorage<T: Element> {
    /// Number of logical elements
    fn size(&self) -> usize;

    /// Allocated elements, including padding
    fn capacity(&self) -> usize {
        self.cells().len()
    }

    /// The whole allocation, padding included
    fn cells(&self) -> &[Cell<T>];

    /// Identity of the allocation
    fn storage_id(&self) -> StorageId {
        StorageId::of(self.cells())
    }

    /// Engine configuration inherited by views
    fn config(&self) -> EngineConfig;
}

/// Owning dense vector with capacity padded to whole SIMD registers
///
/// The padding is always zero, which lets an aligned view that runs to the
/// end of the vector finish with one full-register store. Element 0 of an
/// arithmetic vector sits on a [`MAX_REGISTER_BYTES`] boundary, so a view
/// offset that is a multiple of the register width is also a naturally
/// aligned address.
///
/// # Examples
///
/// ```
/// use subvec::DynamicVector;
///
/// let a = DynamicVector::from_slice(&[1.0f32, 2.0, 3.0]);
/// let b = DynamicVector::from_slice(&[4.0f32, 5.0, 6.0]);
/// a.add_assign(&b).unwrap();
///
/// assert_eq!(a.to_vec(), vec![5.0, 7.0, 9.0]);
/// ```
pub struct DynamicVector<T: Element> {
    data: Box<[Cell<T>]>,
    start: usize,
    capacity: usize,
    len: usize,
    config: EngineConfig,
}

impl<T: Element> DynamicVector<T> {
    /// Create vector from slice using auto-selected optimal backend
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::DynamicVector;
    ///
    /// let v = DynamicVector::from_slice(&[1, 2, 3, 4]);
    /// assert_eq!(v.len(), 4);
    /// assert!(v.capacity() >= 4);
    /// ```
    pub fn from_slice(data: &[T]) -> Self {
        Self::from_slice_with_config(data, EngineConfig::default())
    }

    /// Create vector with specific backend (for benchmarking or testing)
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::{Backend, DynamicVector};
    ///
    /// let v = DynamicVector::from_slice_with_backend(&[1.0, 2.0], Backend::Scalar);
    /// assert_eq!(v.backend(), Backend::Scalar);
    /// ```
    pub fn from_slice_with_backend(data: &[T], backend: Backend) -> Self {
        Self::from_slice_with_config(data, EngineConfig::default().with_backend(backend))
    }

    /// Create vector with a full engine configuration
    pub fn from_slice_with_config(data: &[T], config: EngineConfig) -> Self {
        let vector = Self::zeros_with_config(data.len(), config);
        for (cell, &value) in vector.storage().iter().zip(data) {
            cell.set(value);
        }
        vector
    }

    /// Vector of `len` default (zero) elements
    pub fn zeros(len: usize) -> Self {
        Self::zeros_with_config(len, EngineConfig::default())
    }

    /// Vector of `len` default elements with a full engine configuration
    pub fn zeros_with_config(len: usize, config: EngineConfig) -> Self {
        let capacity = padded_len::<T>(len);
        let slack = if capacity > 0 && T::KIND.is_arithmetic() {
            padding_width::<T>()
        } else {
            0
        };
        let data: Box<[Cell<T>]> = (0..capacity + slack)
            .map(|_| Cell::new(T::default()))
            .collect();

        // Skip the leading elements up to the first register boundary
        let start = match data.as_ptr().align_offset(MAX_REGISTER_BYTES) {
            offset if offset <= slack => offset,
            _ => 0,
        };

        Self {
            data,
            start,
            capacity,
            len,
            config,
        }
    }

    /// Evaluate an operand into a new vector
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::{DynamicVector, OperandExt};
    ///
    /// let a = DynamicVector::from_slice(&[1, 2, 3]);
    /// let doubled = DynamicVector::from_operand(a.add(&a).unwrap());
    /// assert_eq!(doubled.to_vec(), vec![2, 4, 6]);
    /// ```
    pub fn from_operand<S: Operand<Elem = T>>(src: S) -> Self {
        Self::from_operand_with_config(&src, EngineConfig::default())
    }

    pub(crate) fn from_operand_with_config<S: Operand<Elem = T>>(
        src: &S,
        config: EngineConfig,
    ) -> Self {
        let vector = Self::zeros_with_config(src.size(), config);
        if src.capabilities().is_sparse() {
            let cells = vector.storage();
            src.for_each_nonzero(&mut |i, value| cells[i].set(value));
        } else {
            let mut values = vec![T::default(); src.size()];
            src.load_block(0, &mut values, Kernel::select::<T>(config.backend));
            for (cell, value) in vector.storage().iter().zip(values) {
                cell.set(value);
            }
        }
        vector
    }

    /// Get vector length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated elements, padding included
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the backend being used
    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    /// Engine configuration
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<T> {
        self.storage()[..self.len].get(index).map(Cell::get)
    }

    /// Overwrite the element at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn set(&self, index: usize, value: T) {
        self.storage()[..self.len][index].set(value);
    }

    /// Iterator over element values
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.storage()[..self.len].iter().map(Cell::get)
    }

    /// Copy elements out
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// View of the whole vector
    pub fn as_view(&self) -> Subvector<'_, T> {
        Subvector::whole(self)
    }

    /// View of `[offset, offset + length)`
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::InvalidRange`] if the range exceeds the vector.
    pub fn subvector(&self, offset: usize, length: usize) -> Result<Subvector<'_, T>> {
        subvector(self, offset, length)
    }

    fn storage(&self) -> &[Cell<T>] {
        &self.data[self.start..self.start + self.capacity]
    }

    /// `self = src`
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        self.as_view().assign(src)
    }

    /// `self += src`
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn add_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        self.as_view().add_assign(src)
    }

    /// `self -= src`
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn sub_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        self.as_view().sub_assign(src)
    }

    /// `self *= src` (element-wise)
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::SizeMismatch`] if `src.size() != self.len()`.
    pub fn mul_assign<S: Operand<Elem = T>>(&self, src: S) -> Result<()> {
        self.as_view().mul_assign(src)
    }
}

impl<T: Element> DenseStorage<T> for DynamicVector<T> {
    fn size(&self) -> usize {
        self.len
    }

    fn cells(&self) -> &[Cell<T>] {
        self.storage()
    }

    fn config(&self) -> EngineConfig {
        self.config
    }
}

impl<T: Element> fmt::Debug for DynamicVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicVector")
            .field("data", &self.to_vec())
            .field("backend", &self.config.backend)
            .finish()
    }
}

impl<T: Element> Clone for DynamicVector<T> {
    fn clone(&self) -> Self {
        // A fresh allocation has its own register boundary
        Self::from_slice_with_config(&self.to_vec(), self.config)
    }
}

impl<T: Element> PartialEq for DynamicVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

/// Dense vector over caller-owned memory
///
/// Capacity equals length: there is no padding, so tails are always written
/// element-wise.
///
/// # Examples
///
/// ```
/// use subvec::CustomVector;
///
/// let mut buffer = [1.0f64, 2.0, 3.0, 4.0];
/// {
///     let custom = CustomVector::new(&mut buffer);
///     let view = custom.subvector(1, 2).unwrap();
///     view.fill(9.0);
/// }
/// assert_eq!(buffer, [1.0, 9.0, 9.0, 4.0]);
/// ```
pub struct CustomVector<'a, T: Element> {
    cells: &'a [Cell<T>],
    config: EngineConfig,
}

impl<'a, T: Element> CustomVector<'a, T> {
    /// Adopt `data` with the default configuration
    pub fn new(data: &'a mut [T]) -> Self {
        Self::with_config(data, EngineConfig::default())
    }

    /// Adopt `data` with a full engine configuration
    pub fn with_config(data: &'a mut [T], config: EngineConfig) -> Self {
        Self {
            cells: Cell::from_mut(data).as_slice_of_cells(),
            config,
        }
    }

    /// Get vector length
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<T> {
        self.cells.get(index).map(Cell::get)
    }

    /// Overwrite the element at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn set(&self, index: usize, value: T) {
        self.cells[index].set(value);
    }

    /// Iterator over element values
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.cells.iter().map(Cell::get)
    }

    /// Copy elements out
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// View of the whole vector
    pub fn as_view(&self) -> Subvector<'_, T> {
        Subvector::whole(self)
    }

    /// View of `[offset, offset + length)`
    ///
    /// # Errors
    ///
    /// Returns [`crate::ViewError::InvalidRange`] if the range exceeds the vector.
    pub fn subvector(&self, offset: usize, length: usize) -> Result<Subvector<'_, T>> {
        subvector(self, offset, length)
    }
}

impl<T: Element> DenseStorage<T> for CustomVector<'_, T> {
    fn size(&self) -> usize {
        self.cells.len()
    }

    fn cells(&self) -> &[Cell<T>] {
        self.cells
    }

    fn config(&self) -> EngineConfig {
        self.config
    }
}

impl<T: Element> fmt::Debug for CustomVector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomVector")
            .field("data", &self.to_vec())
            .field("backend", &self.config.backend)
            .finish()
    }
}

/// Operand implementation shared by the dense containers: the whole
/// logical range of the allocation, read in place
macro_rules! impl_dense_operand {
    ($(<$($lt:lifetime),*> $ty:ty),* $(,)?) => {
        $(
            impl<'r, $($lt,)* T: Element> Operand for &'r $ty {
                type Elem = T;

                fn size(&self) -> usize {
                    DenseStorage::size(*self)
                }

                #[inline]
                fn at(&self, index: usize) -> T {
                    debug_assert!(index < DenseStorage::size(*self));
                    self.cells()[index].get()
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
                    self.footprint().is_some_and(|own| own.overlaps(target))
                }

                fn footprint(&self) -> Option<Footprint> {
                    Some(Footprint::new(self.storage_id(), 0, DenseStorage::size(*self)))
                }

                fn load_block(&self, start: usize, out: &mut [T], _kernel: Kernel) {
                    let cells = &self.cells()[start..start + out.len()];
                    for (slot, cell) in out.iter_mut().zip(cells) {
                        *slot = cell.get();
                    }
                }
            }
        )*
    };
}

impl_dense_operand!(<> DynamicVector<T>, <'a> CustomVector<'a, T>);
