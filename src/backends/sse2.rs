//! SSE2 backend implementation (x86_64 baseline SIMD)
//!
//! This backend uses SSE2 intrinsics for 128-bit SIMD operations.
//! SSE2 is available on all x86_64 CPUs as a baseline requirement.
//!
//! # Performance
//!
//! Expected speedup: 4x for `f32` (4 elements per register) and 2x for `f64`.
//!
//! # Safety
//!
//! All SSE2 intrinsics are marked `unsafe` by Rust. This module carefully isolates
//! all unsafe code and verifies correctness against the scalar backend.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
use std::cell::Cell;

use super::{cells_ptr, is_aligned_to, PackedBackend};

/// Register width in bytes
const REGISTER_BYTES: usize = 16;

/// SSE2 backend (128-bit SIMD for x86_64)
pub struct Sse2Backend;

/// Generates a read-modify-write kernel: load both registers, combine, store back
macro_rules! sse2_binary {
    ($name:ident, $ty:ty, $lanes:expr, $load:ident, $store:ident, $simd:ident, $scalar:tt) => {
        #[target_feature(enable = "sse2")]
        unsafe fn $name(dst: &[Cell<$ty>], src: &[$ty]) {
            debug_assert_eq!(dst.len(), src.len());
            let len = dst.len().min(src.len());
            let d = cells_ptr(dst);
            let s = src.as_ptr();
            let mut i = 0;

            while i + $lanes <= len {
                let vd = $load(d.add(i));
                let vs = $load(s.add(i));
                $store(d.add(i), $simd(vd, vs));
                i += $lanes;
            }

            // Handle remaining elements with scalar code
            for j in i..len {
                dst[j].set(dst[j].get() $scalar src[j]);
            }
        }
    };
}

/// Generates the copy kernels; `stream` only bypasses the cache when `dst` is register aligned
macro_rules! sse2_copy {
    ($ty:ty, $lanes:expr, $load:ident, $store:ident, $stream:ident) => {
        #[target_feature(enable = "sse2")]
        unsafe fn assign(dst: &[Cell<$ty>], src: &[$ty]) {
            debug_assert_eq!(dst.len(), src.len());
            let len = dst.len().min(src.len());
            let d = cells_ptr(dst);
            let s = src.as_ptr();
            let mut i = 0;

            while i + $lanes <= len {
                $store(d.add(i), $load(s.add(i)));
                i += $lanes;
            }

            for j in i..len {
                dst[j].set(src[j]);
            }
        }

        #[target_feature(enable = "sse2")]
        unsafe fn stream(dst: &[Cell<$ty>], src: &[$ty]) {
            debug_assert_eq!(dst.len(), src.len());
            let d = cells_ptr(dst);
            if !is_aligned_to(d, REGISTER_BYTES) {
                return <Self as PackedBackend<$ty>>::assign(dst, src);
            }

            let len = dst.len().min(src.len());
            let s = src.as_ptr();
            let mut i = 0;

            while i + $lanes <= len {
                $stream(d.add(i), $load(s.add(i)));
                i += $lanes;
            }

            for j in i..len {
                dst[j].set(src[j]);
            }
        }
    };
}

impl PackedBackend<f32> for Sse2Backend {
    sse2_copy!(f32, 4, _mm_loadu_ps, _mm_storeu_ps, _mm_stream_ps);
    sse2_binary!(add, f32, 4, _mm_loadu_ps, _mm_storeu_ps, _mm_add_ps, +);
    sse2_binary!(sub, f32, 4, _mm_loadu_ps, _mm_storeu_ps, _mm_sub_ps, -);
    sse2_binary!(mul, f32, 4, _mm_loadu_ps, _mm_storeu_ps, _mm_mul_ps, *);
}

impl PackedBackend<f64> for Sse2Backend {
    sse2_copy!(f64, 2, _mm_loadu_pd, _mm_storeu_pd, _mm_stream_pd);
    sse2_binary!(add, f64, 2, _mm_loadu_pd, _mm_storeu_pd, _mm_add_pd, +);
    sse2_binary!(sub, f64, 2, _mm_loadu_pd, _mm_storeu_pd, _mm_sub_pd, -);
    sse2_binary!(mul, f64, 2, _mm_loadu_pd, _mm_storeu_pd, _mm_mul_pd, *);
}
