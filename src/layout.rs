//! Alignment and remainder calculation for views

/// Cached alignment facts of a view for one vector width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Offset on a register boundary and the view either ends at the parent's
    /// end or spans whole registers
    pub is_aligned: bool,
    /// Number of leading elements covered by whole registers
    pub vectorized_boundary: usize,
    /// Trailing elements after the last whole register
    pub remainder: usize,
}

/// Compute the alignment of the view `[offset, offset + length)` of a parent
/// with `parent_size` elements
///
/// A `width` of 0 is treated as 1 (scalar).
///
/// # Examples
///
/// ```
/// use subvec::layout::compute_alignment;
///
/// // Flush with the parent's end: the tail may be written as a full register
/// let a = compute_alignment(8, 5, 13, 4);
/// assert!(a.is_aligned);
/// assert_eq!((a.vectorized_boundary, a.remainder), (4, 1));
///
/// // Same tail in the middle of the parent must stay element-wise
/// assert!(!compute_alignment(8, 5, 20, 4).is_aligned);
/// ```
pub fn compute_alignment(offset: usize, length: usize, parent_size: usize, width: usize) -> Alignment {
    let width = width.max(1);
    let remainder = length % width;
    Alignment {
        is_aligned: offset % width == 0
            && (offset.checked_add(length) == Some(parent_size) || remainder == 0),
        vectorized_boundary: length - remainder,
        remainder,
    }
}
