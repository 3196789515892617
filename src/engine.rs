//! Dispatch-selected assignment engine
//!
//! Every write into a view funnels through [`execute`], which runs the same
//! state machine for all four operators:
//!
//! 1. **Size check**: mismatches fail before anything is written.
//! 2. **Alias check**: a plain self-assignment returns immediately; a source
//!    that reads the written range is first evaluated into a temporary.
//! 3. **Path selection**: sparse scatter, scalar loop or vectorized loop.
//! 4. **Execute**: writes go straight into the root storage.
//!
//! # Performance
//!
//! The vectorized loop evaluates the source in stack blocks of four
//! registers and hands each block to a packed kernel. Large aligned plain
//! assignments switch to non-temporal stores so that write-once data does
//! not evict the cache.

use std::cell::Cell;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace};

use crate::backends::{cells_ptr, is_aligned_to, Kernel, PackedOp};
use crate::dense::DynamicVector;
use crate::element::Element;
use crate::error::{Result, ViewError};
use crate::operand::Operand;
use crate::simd::OpSet;
use crate::sparse::CompressedVector;
use crate::view::Subvector;

/// Largest stack block in elements (four 64-byte registers of bytes)
pub(crate) const MAX_BLOCK: usize = 256;

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `target = src`
    Assign,
    /// `target += src`
    Add,
    /// `target -= src`
    Sub,
    /// `target *= src`
    Mul,
}

impl AssignOp {
    /// Packed kernel carrying out the operator
    pub fn packed(self) -> PackedOp {
        match self {
            Self::Assign => PackedOp::Assign,
            Self::Add => PackedOp::Add,
            Self::Sub => PackedOp::Sub,
            Self::Mul => PackedOp::Mul,
        }
    }

    /// Packed arithmetic the operator needs from the backend
    pub fn required(self) -> OpSet {
        match self {
            Self::Assign => OpSet::EMPTY,
            Self::Add => OpSet::ADD,
            Self::Sub => OpSet::SUB,
            Self::Mul => OpSet::MUL,
        }
    }

    #[inline]
    fn apply<T: Element>(self, cell: &Cell<T>, value: T) {
        match self {
            Self::Assign => cell.set(value),
            Self::Add => cell.set(cell.get() + value),
            Self::Sub => cell.set(cell.get() - value),
            Self::Mul => cell.set(cell.get() * value),
        }
    }
}

/// Evaluate `src` into `target` with operator `op`
///
/// # Errors
///
/// Returns [`ViewError::SizeMismatch`] if `src.size() != target.len()`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(target, src), fields(offset = target.offset(), len = target.len()))
)]
pub fn execute<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp) -> Result<()>
where
    T: Element,
    S: Operand<Elem = T>,
{
    if src.size() != target.len() {
        return Err(ViewError::SizeMismatch {
            expected: target.len(),
            actual: src.size(),
        });
    }

    let written = target.write_footprint();
    if op == AssignOp::Assign && src.footprint() == Some(written) {
        #[cfg(feature = "tracing")]
        debug!("self-assignment, nothing to do");
        return Ok(());
    }

    if src.can_alias(&written) && src.is_aliased(&written) {
        #[cfg(feature = "tracing")]
        debug!(sparse = src.capabilities().is_sparse(), "source overlaps target, evaluating into a temporary");

        if src.capabilities().is_sparse() {
            let temporary = CompressedVector::from_operand_ref(src);
            dispatch(target, &&temporary, op);
        } else {
            let temporary = DynamicVector::from_operand_with_config(src, target.config());
            dispatch(target, &&temporary, op);
        }
        return Ok(());
    }

    dispatch(target, src, op);
    Ok(())
}

fn dispatch<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp)
where
    T: Element,
    S: Operand<Elem = T>,
{
    let caps = src.capabilities();
    if caps.is_sparse() {
        #[cfg(feature = "tracing")]
        trace!(path = "sparse", "dispatch");
        assign_sparse(target, src, op);
        return;
    }

    let simd = target.simd();
    let vectorized = simd.is_vectorized()
        && caps.vectorizable
        && simd.supports(caps.requires.union(op.required()));

    if vectorized {
        assign_vectorized(target, src, op, Kernel::select::<T>(target.backend()));
    } else {
        #[cfg(feature = "tracing")]
        trace!(path = "scalar", "dispatch");
        assign_scalar(target, src, op);
    }
}

/// Element-wise loop, unrolled by two
fn assign_scalar<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp)
where
    T: Element,
    S: Operand<Elem = T>,
{
    let cells = target.cells();
    let len = cells.len();
    let mut i = 0;

    while i + 2 <= len {
        op.apply(&cells[i], src.at(i));
        op.apply(&cells[i + 1], src.at(i + 1));
        i += 2;
    }

    if i < len {
        op.apply(&cells[i], src.at(i));
    }
}

/// Whether a vectorized pass of `op` from `src` into `target` uses
/// non-temporal stores
///
/// Requires a plain assignment above the configured threshold, a view that
/// starts on a register boundary and a kernel whose stream alignment that
/// boundary satisfies.
pub(crate) fn streams<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp, kernel: Kernel) -> bool
where
    T: Element,
    S: Operand<Elem = T>,
{
    let config = target.config();
    op == AssignOp::Assign
        && target.simd().stream
        && config.streaming
        && target.is_aligned()
        && target.len() > config.streaming_threshold::<T>()
        && kernel
            .stream_alignment()
            .is_some_and(|bytes| is_aligned_to(cells_ptr(target.cells()), bytes))
        && !src.is_aliased(&target.write_footprint())
}

/// Blocked packed loop: four registers, then single registers, then the tail
fn assign_vectorized<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp, kernel: Kernel)
where
    T: Element,
    S: Operand<Elem = T>,
{
    let width = target.simd().width;
    let align = target.alignment();

    let streaming = streams(target, src, op, kernel);
    let packed = if streaming {
        PackedOp::Stream
    } else {
        op.packed()
    };

    #[cfg(feature = "tracing")]
    trace!(path = "vectorized", width, streaming, aligned = align.is_aligned, "dispatch");

    let block = (width * 4).min(MAX_BLOCK);
    let boundary = align.vectorized_boundary;
    let window = target.cells();
    let mut buf = [T::default(); MAX_BLOCK];
    let mut i = 0;

    while i + block <= boundary {
        src.load_block(i, &mut buf[..block], kernel);
        T::run_packed(kernel, packed, &window[i..i + block], &buf[..block]);
        i += block;
    }

    while i + width <= boundary {
        src.load_block(i, &mut buf[..width], kernel);
        T::run_packed(kernel, packed, &window[i..i + width], &buf[..width]);
        i += width;
    }

    let remainder = align.remainder;
    if remainder > 0 {
        let root = target.root_cells();
        let start = target.offset() + boundary;
        src.load_block(boundary, &mut buf[..remainder], kernel);

        if align.is_aligned && start + width <= root.len() {
            // Lanes past the view land in the zero padding and combine with zeros
            buf[remainder..width].fill(T::default());
            T::run_packed(kernel, packed, &root[start..start + width], &buf[..width]);
        } else {
            T::run_packed(kernel, packed, &window[boundary..], &buf[..remainder]);
        }
    }

    if streaming {
        T::stream_fence(kernel);
    }
}

/// Scatter through the source's non-zero visitor
fn assign_sparse<T, S>(target: &Subvector<'_, T>, src: &S, op: AssignOp)
where
    T: Element,
    S: Operand<Elem = T>,
{
    let cells = target.cells();
    match op {
        AssignOp::Assign => {
            target.reset();
            src.for_each_nonzero(&mut |index, value| cells[index].set(value));
        }
        AssignOp::Add | AssignOp::Sub => {
            src.for_each_nonzero(&mut |index, value| op.apply(&cells[index], value));
        }
        AssignOp::Mul => {
            // Unlisted positions multiply by an implicit zero
            let snapshot = target.to_vec();
            target.reset();
            src.for_each_nonzero(&mut |index, value| cells[index].set(snapshot[index] * value));
        }
    }
}
