//! Storage identity and write footprints
//!
//! The engine describes the memory an assignment will write as a
//! [`Footprint`]. Operands answer two questions about it:
//!
//! - `can_alias`: could I read this storage at all? (identity only)
//! - `is_aliased`: do I actually read any of the written elements? (identity and range)
//!
//! The cheap check gates the precise one, so non-aliasing assignments never
//! walk an expression tree twice.

use std::cell::Cell;

/// Identity of a container's backing allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(usize);

impl StorageId {
    /// Identity of the allocation behind `cells`
    pub fn of<T>(cells: &[Cell<T>]) -> Self {
        Self(cells.as_ptr() as usize)
    }
}

/// Half-open element range `[start, end)` of one storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    /// Backing storage
    pub storage: StorageId,
    /// First element
    pub start: usize,
    /// One past the last element
    pub end: usize,
}

impl Footprint {
    /// Footprint of `len` elements starting at `start`
    pub fn new(storage: StorageId, start: usize, len: usize) -> Self {
        Self {
            storage,
            start,
            end: start + len,
        }
    }

    /// Number of covered elements
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether no element is covered
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Same backing storage
    pub fn same_storage(&self, other: &Footprint) -> bool {
        self.storage == other.storage
    }

    /// Same storage and at least one shared element
    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.same_storage(other) && self.start < other.end && other.start < self.end
    }
}
