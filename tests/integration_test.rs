//! Integration Test Suite
//!
//! End-to-end behaviour of views and the assignment engine through the
//! public API only.
//!
//! Coverage:
//! - View construction, nesting and range errors
//! - All four assignment operators on every available backend
//! - Vectorizable (`f32`, `f64`, `i32`) and scalar-only (opaque) element types
//! - Overlapping sources against a copy-first reference
//! - Sparse sources, sparse views and restricted views over cross products

use std::ops::{Add, Div, Mul, Sub};

use proptest::prelude::*;
use subvec::simd::MAX_REGISTER_BYTES;
use subvec::{
    subvector, subvector_of, Backend, CompressedVector, DenseStorage, DynamicVector, Element,
    ElementKind, EngineConfig, OperandExt, ViewError,
};

// ============================================================================
// PROPERTY TEST CONFIGURATION
// ============================================================================

const PROPTEST_CASES: u32 = 50;

fn backends() -> Vec<Backend> {
    let mut list = vec![Backend::Scalar, Backend::Auto];
    #[cfg(target_arch = "x86_64")]
    {
        list.push(Backend::SSE2);
        if is_x86_feature_detected!("avx2") {
            list.push(Backend::AVX2);
        }
    }
    list
}

/// Element type with no vector form: forces every scalar path
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Money(i64);

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Mul for Money {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Money(self.0 * rhs.0)
    }
}

impl Div for Money {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Money(self.0 / rhs.0)
    }
}

impl Element for Money {
    const KIND: ElementKind = ElementKind::Opaque;

    fn one() -> Self {
        Money(1)
    }
}

// ============================================================================
// CONCRETE SCENARIOS
// ============================================================================

#[test]
fn integration_end_to_end_add_assign() {
    let parent = DynamicVector::from_slice(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let view = subvector(&parent, 3, 4).unwrap();
    assert_eq!(view.len(), 4);
    assert_eq!(view.to_vec(), vec![3, 4, 5, 6]);

    view.add_assign(&DynamicVector::from_slice(&[10, 10, 10, 10]))
        .unwrap();
    assert_eq!(parent.to_vec(), vec![0, 1, 2, 13, 14, 15, 16, 7, 8, 9]);
}

#[test]
fn integration_sparse_mul_assign_zeroes_unlisted() {
    let parent = DynamicVector::from_slice(&[9, 1, 2, 3, 4, 9]);
    let view = subvector(&parent, 1, 4).unwrap();
    let sparse = CompressedVector::from_pairs(4, &[(1, 5)]).unwrap();

    view.mul_assign(&sparse).unwrap();
    assert_eq!(view.to_vec(), vec![0, 10, 0, 0]);
    assert_eq!(parent.to_vec(), vec![9, 0, 10, 0, 0, 9]);
}

#[test]
fn integration_range_errors() {
    let parent = DynamicVector::from_slice(&[0.0f64; 10]);
    assert_eq!(
        subvector(&parent, 7, 4).unwrap_err(),
        ViewError::InvalidRange {
            offset: 7,
            length: 4,
            size: 10
        }
    );
    assert!(parent.subvector(0, 10).is_ok());
}

#[test]
fn integration_size_mismatch_leaves_target_untouched() {
    let parent = DynamicVector::from_slice(&[1.0f32; 6]);
    let view = parent.subvector(1, 3).unwrap();
    let err = view
        .sub_assign(&DynamicVector::from_slice(&[1.0f32; 4]))
        .unwrap_err();
    assert_eq!(
        err,
        ViewError::SizeMismatch {
            expected: 3,
            actual: 4
        }
    );
    assert_eq!(parent.to_vec(), vec![1.0; 6]);
}

#[test]
fn integration_opaque_elements_roundtrip() {
    let parent = DynamicVector::from_slice(&[Money(1), Money(2), Money(3), Money(4)]);
    assert_eq!(parent.capacity(), 4);

    let view = parent.subvector(1, 3).unwrap();
    assert_eq!(view.simd().width, 1);

    let src = DynamicVector::from_slice(&[Money(10), Money(20), Money(30)]);
    view.assign(&src).unwrap();
    assert_eq!(view.to_vec(), src.to_vec());

    view.mul_assign(&src).unwrap();
    assert_eq!(
        parent.to_vec(),
        vec![Money(1), Money(100), Money(400), Money(900)]
    );

    view.div_assign_scalar(Money(10));
    assert_eq!(view.to_vec(), vec![Money(10), Money(40), Money(90)]);
}

#[test]
fn integration_nested_views_write_root() {
    let parent = DynamicVector::from_slice(&(0..16).map(|i| i as f64).collect::<Vec<_>>());
    let outer = parent.subvector(4, 8).unwrap();
    let inner = outer.subvector(2, 4).unwrap();
    let innermost = inner.subvector(1, 2).unwrap();

    assert_eq!(innermost.offset(), 7);
    innermost.fill(-1.0);
    assert_eq!(parent.get(7), Some(-1.0));
    assert_eq!(parent.get(8), Some(-1.0));
    assert_eq!(outer.non_zeros(), 8);
}

#[test]
fn integration_restricted_view_of_cross_product() {
    let a = DynamicVector::from_slice(&[1.0f32, 2.0, 3.0]);
    let b = DynamicVector::from_slice(&[4.0f32, 5.0, 6.0]);
    let target = DynamicVector::from_slice(&[0.0f32; 4]);

    let yz = subvector_of((&a).cross(&b).unwrap(), 1, 2).unwrap();
    target.subvector(2, 2).unwrap().assign(yz).unwrap();
    assert_eq!(target.to_vec(), vec![0.0, 0.0, 6.0, -3.0]);

    // Cross product reading the vector it is written into
    a.assign((&a).cross(&b).unwrap()).unwrap();
    assert_eq!(a.to_vec(), vec![-3.0, 6.0, -3.0]);
}

#[test]
fn integration_sparse_subvector_as_source() {
    let sparse = CompressedVector::from_pairs(8, &[(1, 1.5), (4, 2.0), (6, 3.0)]).unwrap();
    let window = sparse.sparse_subvector(3, 4).unwrap();
    assert_eq!(window.non_zeros(), 2);

    let dense = DynamicVector::from_slice(&[1.0f64; 4]);
    dense.add_assign(window).unwrap();
    assert_eq!(dense.to_vec(), vec![1.0, 3.0, 1.0, 4.0]);
}

#[test]
fn integration_large_assign_streams_identically() {
    let n = 100_003;
    let data: Vec<f32> = (0..n).map(|i| (i % 1000) as f32).collect();
    for backend in backends() {
        let config = EngineConfig::new()
            .with_backend(backend)
            .with_cache_size(1024);
        let parent = DynamicVector::zeros_with_config(n, config);

        // Register-aligned base, so aligned views qualify for non-temporal stores
        let base = parent.cells().as_ptr() as usize;
        assert_eq!(base % MAX_REGISTER_BYTES, 0, "{backend:?}");
        assert!(parent.as_view().is_aligned());

        parent.assign(&DynamicVector::from_slice(&data)).unwrap();
        assert_eq!(parent.to_vec(), data, "{backend:?}");
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

/// Copy-first reference for `dst[..] op= src[..]` on one buffer
fn reference<T: Copy>(
    data: &[T],
    dst: usize,
    src: usize,
    len: usize,
    op: impl Fn(T, T) -> T,
) -> Vec<T> {
    let copy = data[src..src + len].to_vec();
    let mut expected = data.to_vec();
    for (i, value) in copy.into_iter().enumerate() {
        expected[dst + i] = op(expected[dst + i], value);
    }
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Integration test: overlapping views behave like copy-then-write
    #[test]
    fn integration_overlapping_assign_matches_reference(
        data in prop::collection::vec(-1000i32..1000, 2..200),
        dst_seed in 0usize..200,
        src_seed in 0usize..200,
        len_seed in 0usize..200,
    ) {
        let n = data.len();
        let len = len_seed % n + 1;
        let dst = dst_seed % (n - len + 1);
        let src = src_seed % (n - len + 1);

        for backend in backends() {
            let parent = DynamicVector::from_slice_with_backend(&data, backend);
            let target = parent.subvector(dst, len).unwrap();
            target.assign(parent.subvector(src, len).unwrap()).unwrap();
            prop_assert_eq!(parent.to_vec(), reference(&data, dst, src, len, |_, s| s));

            let parent = DynamicVector::from_slice_with_backend(&data, backend);
            let target = parent.subvector(dst, len).unwrap();
            target.add_assign(parent.subvector(src, len).unwrap()).unwrap();
            prop_assert_eq!(parent.to_vec(), reference(&data, dst, src, len, |d, s| d + s));
        }
    }

    /// Integration test: dense assignment reads back the source (f32)
    #[test]
    fn integration_assign_roundtrip_f32(
        data in prop::collection::vec(-1.0e3f32..1.0e3, 1..300),
        offset in 0usize..40,
        pad in 0usize..40,
    ) {
        for backend in backends() {
            let parent = DynamicVector::zeros_with_config(
                offset + data.len() + pad,
                EngineConfig::new().with_backend(backend),
            );
            let view = parent.subvector(offset, data.len()).unwrap();
            view.assign(&DynamicVector::from_slice(&data)).unwrap();

            prop_assert_eq!(view.to_vec(), data.clone());
            prop_assert!(parent.iter().take(offset).all(|x| x == 0.0));
            prop_assert!(parent.iter().skip(offset + data.len()).all(|x| x == 0.0));
        }
    }

    /// Integration test: compound operators agree with element-wise math (f64)
    #[test]
    fn integration_compound_ops_f64(
        pairs in prop::collection::vec((-1.0e3f64..1.0e3, -1.0e3f64..1.0e3), 1..200),
        offset in 0usize..16,
    ) {
        let (lhs, rhs): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let mut data = vec![0.5f64; offset];
        data.extend_from_slice(&lhs);

        for backend in backends() {
            let parent = DynamicVector::from_slice_with_backend(&data, backend);
            let view = parent.subvector(offset, lhs.len()).unwrap();
            let src = DynamicVector::from_slice(&rhs);

            view.add_assign(&src).unwrap();
            view.mul_assign(&src).unwrap();
            view.sub_assign(&src).unwrap();

            for i in 0..lhs.len() {
                prop_assert_eq!(view.at(i), (lhs[i] + rhs[i]) * rhs[i] - rhs[i]);
            }
            prop_assert!(parent.iter().take(offset).all(|x| x == 0.5));
        }
    }

    /// Integration test: opaque elements take the scalar path with the same results
    #[test]
    fn integration_opaque_matches_i64(
        lhs in prop::collection::vec(-1000i64..1000, 1..64),
        scalar in 1i64..10,
    ) {
        let rhs: Vec<i64> = lhs.iter().map(|x| x / 3 + 1).collect();
        let ints = DynamicVector::from_slice(&lhs);
        let money = DynamicVector::from_slice(&lhs.iter().map(|&x| Money(x)).collect::<Vec<_>>());

        ints.add_assign((&DynamicVector::from_slice(&rhs)).mul_scalar(scalar)).unwrap();
        money
            .add_assign(
                (&DynamicVector::from_slice(&rhs.iter().map(|&x| Money(x)).collect::<Vec<_>>()))
                    .mul_scalar(Money(scalar)),
            )
            .unwrap();

        let expected: Vec<Money> = ints.iter().map(Money).collect();
        prop_assert_eq!(money.to_vec(), expected);
    }

    /// Integration test: sparse multiply zeroes unlisted positions
    #[test]
    fn integration_sparse_mul_property(
        data in prop::collection::vec(-100i32..100, 1..64),
        entries in prop::collection::vec((0usize..64, -10i32..10), 0..16),
    ) {
        let n = data.len();
        let pairs: Vec<(usize, i32)> = entries.into_iter().map(|(i, v)| (i % n, v)).collect();
        let sparse = CompressedVector::from_pairs(n, &pairs).unwrap();

        let parent = DynamicVector::from_slice(&data);
        parent.mul_assign(&sparse).unwrap();

        for (i, &old) in data.iter().enumerate() {
            let factor = sparse.get(i).unwrap_or_default();
            prop_assert_eq!(parent.get(i), Some(old * factor));
        }
    }
}
