//! Packed kernel implementations for different SIMD instruction sets
//!
//! Every kernel applies one [`PackedOp`] lane-wise from a contiguous source
//! block into a contiguous destination run of parent storage. The assignment
//! engine decides *which* lanes are handed to a kernel (full blocks, single
//! registers, or the partial remainder); kernels only care that `dst` and
//! `src` have the same length.
//!
//! # Safety
//!
//! All `unsafe` code is isolated within backend implementations. The public
//! API remains 100% safe.
//!
//! # Backends
//!
//! - `scalar`: Portable baseline implementation (no SIMD), generic over every element
//! - `sse2`: x86_64 baseline SIMD (128-bit), `f32`/`f64`
//! - `avx2`: x86_64 advanced SIMD (256-bit), `f32`/`f64`

use std::cell::Cell;

use crate::element::Element;
use crate::Backend;

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod sse2;

#[cfg(target_arch = "x86_64")]
pub mod avx2;

/// Lane-wise operation carried out by a packed kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedOp {
    /// `dst[i] = src[i]`
    Assign,
    /// `dst[i] = src[i]` with non-temporal stores where the backend has them
    Stream,
    /// `dst[i] = dst[i] + src[i]`
    Add,
    /// `dst[i] = dst[i] - src[i]`
    Sub,
    /// `dst[i] = dst[i] * src[i]`
    Mul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KernelKind {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Sse2,
    #[cfg(target_arch = "x86_64")]
    Avx2,
}

/// Packed kernel family picked once per operation
///
/// A `Kernel` can only be obtained through [`Kernel::select`], which checks
/// CPU support, so holding one is proof that its instructions may run.
///
/// # Examples
///
/// ```
/// use subvec::{Backend, Kernel};
///
/// assert!(Kernel::select::<f32>(Backend::Scalar).is_scalar());
/// assert!(Kernel::select::<i32>(Backend::AVX2).is_scalar());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel(KernelKind);

impl Kernel {
    /// Portable kernel, valid everywhere
    pub const SCALAR: Kernel = Kernel(KernelKind::Scalar);

    /// Best kernel for elements of type `T` on `backend`
    ///
    /// Only floating-point kinds have intrinsic kernels; everything else
    /// gets [`Kernel::SCALAR`] without touching CPU detection.
    pub fn select<T: Element>(backend: Backend) -> Self {
        if !T::KIND.is_float() {
            return Self::SCALAR;
        }

        #[cfg(target_arch = "x86_64")]
        {
            match backend {
                Backend::AVX2 | Backend::AVX512 if is_x86_feature_detected!("avx2") => {
                    return Kernel(KernelKind::Avx2);
                }
                Backend::SSE2 | Backend::AVX | Backend::AVX2 | Backend::AVX512 => {
                    return Kernel(KernelKind::Sse2);
                }
                _ => {}
            }
        }

        let _ = backend;
        Self::SCALAR
    }

    /// Whether this is the portable kernel
    pub fn is_scalar(self) -> bool {
        self.0 == KernelKind::Scalar
    }

    /// Destination alignment in bytes the kernel needs for non-temporal stores
    pub fn stream_alignment(self) -> Option<usize> {
        match self.0 {
            KernelKind::Scalar => None,
            #[cfg(target_arch = "x86_64")]
            KernelKind::Sse2 => Some(16),
            #[cfg(target_arch = "x86_64")]
            KernelKind::Avx2 => Some(32),
        }
    }

    #[cfg_attr(not(target_arch = "x86_64"), allow(dead_code))]
    pub(crate) fn kind(self) -> KernelKind {
        self.0
    }
}

/// Backend trait defining the packed kernels
///
/// All backend implementations must implement this trait to ensure
/// consistent behavior across different SIMD instruction sets.
///
/// # Safety
///
/// Implementations may use unsafe SIMD intrinsics. Callers must ensure:
/// - `dst` and `src` have the same length
/// - The CPU supports the instruction set the backend is compiled for
pub trait PackedBackend<T> {
    /// Copy: dst[i] = src[i]
    ///
    /// # Safety
    ///
    /// - `dst` and `src` must have the same length
    unsafe fn assign(dst: &[Cell<T>], src: &[T]);

    /// Copy with cache-bypassing stores when `dst` is register aligned
    ///
    /// # Safety
    ///
    /// - `dst` and `src` must have the same length
    /// - callers must issue [`crate::Element::stream_fence`] before the data is read again
    unsafe fn stream(dst: &[Cell<T>], src: &[T]);

    /// Element-wise addition: dst[i] += src[i]
    ///
    /// # Safety
    ///
    /// - `dst` and `src` must have the same length
    unsafe fn add(dst: &[Cell<T>], src: &[T]);

    /// Element-wise subtraction: dst[i] -= src[i]
    ///
    /// # Safety
    ///
    /// - `dst` and `src` must have the same length
    unsafe fn sub(dst: &[Cell<T>], src: &[T]);

    /// Element-wise multiplication: dst[i] *= src[i]
    ///
    /// # Safety
    ///
    /// - `dst` and `src` must have the same length
    unsafe fn mul(dst: &[Cell<T>], src: &[T]);

    /// Dispatch `op` to the matching kernel
    ///
    /// # Safety
    ///
    /// Same contract as the individual kernels.
    unsafe fn run(op: PackedOp, dst: &[Cell<T>], src: &[T]) {
        match op {
            PackedOp::Assign => Self::assign(dst, src),
            PackedOp::Stream => Self::stream(dst, src),
            PackedOp::Add => Self::add(dst, src),
            PackedOp::Sub => Self::sub(dst, src),
            PackedOp::Mul => Self::mul(dst, src),
        }
    }
}

/// Raw write pointer into a run of cells
///
/// `Cell<T>` has the same in-memory representation as `T`, and writes through
/// a shared reference to a `Cell` are permitted, so intrinsics may store
/// through this pointer for as long as the slice borrow is alive.
#[inline]
pub(crate) fn cells_ptr<T>(cells: &[Cell<T>]) -> *mut T {
    cells.as_ptr().cast::<T>().cast_mut()
}

/// Whether `ptr` sits on a `bytes` boundary
#[inline]
pub(crate) fn is_aligned_to<T>(ptr: *const T, bytes: usize) -> bool {
    (ptr as usize) % bytes == 0
}
