//! Vector-width resolution
//!
//! Maps an `(ElementKind, Backend)` pair to the number of lanes per register
//! and the packed operations that backend natively offers for that lane type.
//! A width of 1 switches every downstream decision to the scalar path.

use crate::element::{Element, ElementKind};
use crate::{select_best_available_backend, Backend};

/// Widest register of any supported backend (AVX-512)
pub const MAX_REGISTER_BYTES: usize = 64;

/// Set of packed arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct OpSet(u8);

impl OpSet {
    /// No operation
    pub const EMPTY: Self = Self(0);
    /// Packed addition
    pub const ADD: Self = Self(1);
    /// Packed subtraction
    pub const SUB: Self = Self(1 << 1);
    /// Packed multiplication
    pub const MUL: Self = Self(1 << 2);

    /// Operations in either set
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every operation in `other` is in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the set is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// What one backend offers for one element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdCaps {
    /// Lanes per register; 1 means no vectorization
    pub width: usize,
    /// Native packed addition
    pub add: bool,
    /// Native packed subtraction
    pub sub: bool,
    /// Native packed multiplication
    pub mul: bool,
    /// Non-temporal (cache-bypassing) stores
    pub stream: bool,
}

impl SimdCaps {
    /// Scalar-only capabilities
    pub const SCALAR: Self = Self {
        width: 1,
        add: false,
        sub: false,
        mul: false,
        stream: false,
    };

    /// Resolve capabilities for an element kind on a backend
    ///
    /// `Backend::Auto` is resolved through runtime CPU detection first.
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::{Backend, ElementKind, SimdCaps};
    ///
    /// let caps = SimdCaps::resolve(ElementKind::F32, Backend::AVX2);
    /// assert_eq!(caps.width, 8);
    /// assert!(caps.mul && caps.stream);
    ///
    /// // No 32-bit integer multiply before SSE4.1
    /// assert!(!SimdCaps::resolve(ElementKind::I32, Backend::SSE2).mul);
    ///
    /// assert_eq!(SimdCaps::resolve(ElementKind::Opaque, Backend::AVX512).width, 1);
    /// ```
    pub fn resolve(kind: ElementKind, backend: Backend) -> Self {
        let backend = match backend {
            Backend::Auto => select_best_available_backend(),
            other => other,
        };

        let Some(lane) = kind.lane_bytes() else {
            return Self::SCALAR;
        };
        let register = register_bytes(kind, backend);
        if register == 0 {
            return Self::SCALAR;
        }

        let mul = match kind {
            ElementKind::F32 | ElementKind::F64 => true,
            ElementKind::I8 | ElementKind::U8 => false,
            ElementKind::I16 | ElementKind::U16 => true,
            ElementKind::I32 | ElementKind::U32 => matches!(
                backend,
                Backend::AVX2 | Backend::AVX512 | Backend::NEON | Backend::WasmSIMD
            ),
            ElementKind::I64 | ElementKind::U64 => {
                matches!(backend, Backend::AVX512 | Backend::WasmSIMD)
            }
            ElementKind::Opaque => false,
        };
        let stream = matches!(
            backend,
            Backend::SSE2 | Backend::AVX | Backend::AVX2 | Backend::AVX512
        );

        Self {
            width: (register / lane).max(1),
            add: true,
            sub: true,
            mul,
            stream,
        }
    }

    /// Capabilities for element type `T`
    pub fn of<T: Element>(backend: Backend) -> Self {
        Self::resolve(T::KIND, backend)
    }

    /// More than one lane per register
    pub const fn is_vectorized(&self) -> bool {
        self.width > 1
    }

    /// Whether every operation in `ops` is natively available
    pub fn supports(&self, ops: OpSet) -> bool {
        (!ops.contains(OpSet::ADD) || self.add)
            && (!ops.contains(OpSet::SUB) || self.sub)
            && (!ops.contains(OpSet::MUL) || self.mul)
    }
}

/// Register size in bytes a backend uses for `kind`; 0 when it has none
///
/// AVX without AVX2 has no 256-bit integer arithmetic, so integers stay on
/// 128-bit registers there.
pub fn register_bytes(kind: ElementKind, backend: Backend) -> usize {
    match backend {
        Backend::Scalar => 0,
        Backend::SSE2 | Backend::NEON | Backend::WasmSIMD => 16,
        Backend::AVX if kind.is_float() => 32,
        Backend::AVX => 16,
        Backend::AVX2 => 32,
        Backend::AVX512 => MAX_REGISTER_BYTES,
        Backend::Auto => register_bytes(kind, select_best_available_backend()),
    }
}

/// Capacity granularity in elements for padded containers
///
/// One widest register, so an aligned tail can always be written as a full
/// register without leaving the allocation.
pub fn padding_width<T: Element>() -> usize {
    if !T::KIND.is_arithmetic() {
        return 1;
    }
    (MAX_REGISTER_BYTES / std::mem::size_of::<T>().max(1)).max(1)
}

/// Smallest padded capacity holding `len` elements
///
/// # Examples
///
/// ```
/// use subvec::simd::padded_len;
///
/// assert_eq!(padded_len::<f32>(10), 16);
/// assert_eq!(padded_len::<f64>(8), 8);
/// assert_eq!(padded_len::<u8>(0), 0);
/// ```
pub fn padded_len<T: Element>(len: usize) -> usize {
    let step = padding_width::<T>();
    len.div_ceil(step) * step
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_backend() -> impl Strategy<Value = Backend> {
        prop_oneof![
            Just(Backend::Scalar),
            Just(Backend::SSE2),
            Just(Backend::AVX),
            Just(Backend::AVX2),
            Just(Backend::AVX512),
            Just(Backend::NEON),
            Just(Backend::WasmSIMD),
        ]
    }

    fn any_kind() -> impl Strategy<Value = ElementKind> {
        prop_oneof![
            Just(ElementKind::I8),
            Just(ElementKind::U8),
            Just(ElementKind::I16),
            Just(ElementKind::U16),
            Just(ElementKind::I32),
            Just(ElementKind::U32),
            Just(ElementKind::I64),
            Just(ElementKind::U64),
            Just(ElementKind::F32),
            Just(ElementKind::F64),
            Just(ElementKind::Opaque),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: a register always holds a whole number of lanes
        #[test]
        fn test_width_fills_register(kind in any_kind(), backend in any_backend()) {
            let caps = SimdCaps::resolve(kind, backend);
            prop_assert!(caps.width >= 1);
            if let Some(lane) = kind.lane_bytes() {
                let register = register_bytes(kind, backend);
                if register > 0 {
                    prop_assert_eq!(caps.width * lane, register);
                }
            }
        }

        /// Property: scalar capabilities never advertise packed operations
        #[test]
        fn test_width_one_supports_nothing(kind in any_kind(), backend in any_backend()) {
            let caps = SimdCaps::resolve(kind, backend);
            if caps.width == 1 {
                prop_assert!(!caps.add && !caps.sub && !caps.mul && !caps.stream);
            }
        }

        /// Property: padded capacity covers the length by less than one step
        #[test]
        fn test_padded_len_bounds(len in 0usize..10_000) {
            let padded = padded_len::<f32>(len);
            prop_assert!(padded >= len);
            prop_assert!(padded - len < padding_width::<f32>());
            prop_assert_eq!(padded % padding_width::<f32>(), 0);
        }
    }
}
