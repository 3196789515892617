//! Element model: what may be stored in a container and how it vectorizes
//!
//! Every primitive numeric type implements [`Element`] with its own
//! [`ElementKind`]. User types can implement the trait with
//! [`ElementKind::Opaque`]; the engine then keeps them on the scalar path.

use std::cell::Cell;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

use crate::backends::scalar::ScalarBackend;
use crate::backends::{Kernel, PackedBackend, PackedOp};

/// Runtime tag for an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// No native vector form
    Opaque,
}

impl ElementKind {
    /// Size in bytes of one lane, `None` for [`ElementKind::Opaque`]
    pub const fn lane_bytes(self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 => Some(4),
            Self::I64 | Self::U64 | Self::F64 => Some(8),
            Self::Opaque => None,
        }
    }

    /// Floating-point kinds
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Every kind with a SIMD lane representation
    pub const fn is_arithmetic(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// A value that can live in a vector and flow through the assignment engine
///
/// `Default::default()` is the zero element: sparse containers leave it
/// implicit and `reset` writes it.
///
/// # Examples
///
/// ```
/// use subvec::{Element, ElementKind};
///
/// assert_eq!(<f32 as Element>::KIND, ElementKind::F32);
/// assert!(0u8.is_default());
/// assert_eq!(i64::one(), 1);
/// ```
pub trait Element:
    Copy
    + Default
    + PartialEq
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + 'static
{
    /// Lane classification used by the width resolver
    const KIND: ElementKind;

    /// Multiplicative identity
    fn one() -> Self;

    /// Whether this is the zero (default) element
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply `op` lane-wise from `src` into `dst` with `kernel`
    ///
    /// Element types without intrinsic kernels always run the portable one.
    fn run_packed(kernel: Kernel, op: PackedOp, dst: &[Cell<Self>], src: &[Self]) {
        let _ = kernel;
        // SAFETY: the scalar kernels use bounds-checked iteration only
        unsafe { <ScalarBackend as PackedBackend<Self>>::run(op, dst, src) }
    }

    /// Order pending non-temporal stores before later reads
    fn stream_fence(kernel: Kernel) {
        let _ = kernel;
    }
}

macro_rules! impl_integer_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn one() -> Self {
                    1
                }
            }
        )*
    };
}

impl_integer_element!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
);

macro_rules! impl_float_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline]
                fn one() -> Self {
                    1.0
                }

                fn run_packed(kernel: Kernel, op: PackedOp, dst: &[Cell<Self>], src: &[Self]) {
                    #[cfg(target_arch = "x86_64")]
                    {
                        use crate::backends::avx2::Avx2Backend;
                        use crate::backends::sse2::Sse2Backend;
                        use crate::backends::KernelKind;

                        match kernel.kind() {
                            // SAFETY: `Kernel::select` verified AVX2 support
                            KernelKind::Avx2 => {
                                return unsafe { <Avx2Backend as PackedBackend<$ty>>::run(op, dst, src) };
                            }
                            // SAFETY: SSE2 is part of the x86_64 baseline
                            KernelKind::Sse2 => {
                                return unsafe { <Sse2Backend as PackedBackend<$ty>>::run(op, dst, src) };
                            }
                            KernelKind::Scalar => {}
                        }
                    }

                    let _ = kernel;
                    // SAFETY: the scalar kernels use bounds-checked iteration only
                    unsafe { <ScalarBackend as PackedBackend<$ty>>::run(op, dst, src) }
                }

                fn stream_fence(kernel: Kernel) {
                    #[cfg(target_arch = "x86_64")]
                    {
                        if !kernel.is_scalar() {
                            // SAFETY: sfence is part of the x86_64 baseline
                            unsafe { std::arch::x86_64::_mm_sfence() };
                        }
                    }

                    let _ = kernel;
                }
            }
        )*
    };
}

impl_float_element!(f32 => F32, f64 => F64);
