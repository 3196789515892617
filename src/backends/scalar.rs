//! Scalar (non-SIMD) backend implementation
//!
//! This is the portable baseline implementation that works on all platforms
//! and every element type. It uses simple loops without any SIMD
//! instructions; for primitive numbers LLVM is usually able to
//! auto-vectorize them, which is what the engine relies on for integer
//! element types on the vectorized path.

use std::cell::Cell;

use super::PackedBackend;
use crate::Element;

/// Scalar backend (portable, no SIMD)
pub struct ScalarBackend;

impl<T: Element> PackedBackend<T> for ScalarBackend {
    // SAFETY: This function is safe because:
    // 1. All slice accesses are bounds-checked by Rust iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match PackedBackend trait interface
    unsafe fn assign(dst: &[Cell<T>], src: &[T]) {
        for (d, &s) in dst.iter().zip(src) {
            d.set(s);
        }
    }

    // SAFETY: Plain stores; there is no portable non-temporal store
    unsafe fn stream(dst: &[Cell<T>], src: &[T]) {
        Self::assign(dst, src);
    }

    // SAFETY: This function is safe because:
    // 1. All slice accesses are bounds-checked by Rust iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match PackedBackend trait interface
    unsafe fn add(dst: &[Cell<T>], src: &[T]) {
        for (d, &s) in dst.iter().zip(src) {
            d.set(d.get() + s);
        }
    }

    // SAFETY: This function is safe because:
    // 1. All slice accesses are bounds-checked by Rust iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match PackedBackend trait interface
    unsafe fn sub(dst: &[Cell<T>], src: &[T]) {
        for (d, &s) in dst.iter().zip(src) {
            d.set(d.get() - s);
        }
    }

    // SAFETY: This function is safe because:
    // 1. All slice accesses are bounds-checked by Rust iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match PackedBackend trait interface
    unsafe fn mul(dst: &[Cell<T>], src: &[T]) {
        for (d, &s) in dst.iter().zip(src) {
            d.set(d.get() * s);
        }
    }
}
