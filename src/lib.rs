//! Subvec: Subvector Views with a Fused Assignment Engine
//!
//! **Subvec** provides non-owning views into dense vectors and an assignment
//! engine that evaluates lazy expressions straight into a view's storage:
//!
//! 1. **Views** - `subvector(parent, offset, length)`, nested views, read-only
//!    views over expressions such as cross products
//! 2. **Expressions** - element-wise add/sub/mul, scalar scaling, casts and
//!    cross products, built lazily and evaluated once
//! 3. **Dispatch** - scalar, SIMD (SSE2/AVX2) or sparse-scatter loops chosen
//!    at runtime from the element type, backend, alignment and aliasing
//!
//! # Design Principles
//!
//! - **No hidden temporaries**: a temporary is only created when the source
//!   really reads memory the assignment overwrites
//! - **Runtime dispatch**: the backend is detected once per process and the
//!   packed kernel once per assignment
//! - **Zero unsafe in public API**: Safety via type system, `unsafe` isolated in backends
//! - **Validation at the edges**: range and size errors are reported before
//!   anything is written; hot loops carry no checks
//!
//! # Quick Start
//!
//! ```rust
//! use subvec::{subvector, DynamicVector, OperandExt};
//!
//! let parent = DynamicVector::from_slice(&[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
//! let other = DynamicVector::from_slice(&[1.0f32, 1.0, 1.0, 1.0]);
//!
//! // parent[4..8] = other + parent[0..4] * 2
//! let view = subvector(&parent, 4, 4).unwrap();
//! let head = subvector(&parent, 0, 4).unwrap();
//! view.assign(other.add(head.mul_scalar(2.0)).unwrap()).unwrap();
//!
//! assert_eq!(parent.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 1.0, 3.0, 5.0, 7.0]);
//! ```

pub mod alias;
pub mod backends;
pub mod config;
pub mod dense;
pub mod element;
pub mod engine;
pub mod error;
pub mod expr;
pub mod layout;
pub mod operand;
pub mod restricted;
pub mod simd;
pub mod sparse;
pub mod view;

pub use alias::{Footprint, StorageId};
pub use backends::{Kernel, PackedOp};
pub use config::EngineConfig;
pub use dense::{CustomVector, DenseStorage, DynamicVector};
pub use element::{Element, ElementKind};
pub use engine::AssignOp;
pub use error::{Result, ViewError};
pub use expr::{BinaryExpr, BinaryOp, CastExpr, CrossExpr, OperandExt, ScaledExpr};
pub use layout::{compute_alignment, Alignment};
pub use operand::{Capabilities, Density, Operand};
pub use restricted::{subvector_of, RestrictedView, SparseSubvector};
pub use simd::{OpSet, SimdCaps};
pub use sparse::CompressedVector;
pub use view::{subvector, Subvector};

/// Instruction set the engine targets
///
/// Carried by every parent's [`EngineConfig`] and inherited by its views.
/// The backend fixes the register width used for alignment decisions (see
/// [`SimdCaps::resolve`]); the kernel that actually runs is picked from it
/// once per assignment by [`Kernel::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// No packed kernels, width 1 everywhere
    Scalar,
    /// 128-bit registers
    SSE2,
    /// 256-bit float registers, 128-bit integer registers
    AVX,
    /// 256-bit registers
    AVX2,
    /// 512-bit registers
    AVX512,
    /// ARM 128-bit registers
    NEON,
    /// WebAssembly SIMD128
    WasmSIMD,
    /// Resolved to [`select_best_available_backend`] on use
    Auto,
}

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
fn detect_x86_backend() -> Backend {
    if is_x86_feature_detected!("avx512f") {
        Backend::AVX512
    } else if is_x86_feature_detected!("avx2") {
        Backend::AVX2
    } else if is_x86_feature_detected!("avx") {
        Backend::AVX
    } else if is_x86_feature_detected!("sse2") {
        Backend::SSE2
    } else {
        Backend::Scalar
    }
}

/// Widest backend the running CPU supports
///
/// x86 is checked at runtime, widest first. ARM and WebAssembly report
/// NEON/SIMD128 when the target was compiled with them. Everything else is
/// [`Backend::Scalar`].
///
/// # Examples
///
/// ```
/// use subvec::{select_best_available_backend, EngineConfig};
///
/// assert_eq!(EngineConfig::default().backend, select_best_available_backend());
/// ```
pub fn select_best_available_backend() -> Backend {
    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        detect_x86_backend()
    }

    #[cfg(all(any(target_arch = "aarch64", target_arch = "arm"), target_feature = "neon"))]
    {
        Backend::NEON
    }

    #[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
    {
        Backend::WasmSIMD
    }

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        all(any(target_arch = "aarch64", target_arch = "arm"), target_feature = "neon"),
        all(target_arch = "wasm32", target_feature = "simd128")
    )))]
    {
        Backend::Scalar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    #[test]
    fn test_default_config_and_views_follow_detection() {
        let detected = select_best_available_backend();
        assert_ne!(detected, Backend::Auto);
        assert_eq!(EngineConfig::default().backend, detected);

        let parent = DynamicVector::<f32>::zeros(16);
        let view = parent.as_view();
        assert_eq!(view.backend(), detected);
        assert_eq!(view.simd(), SimdCaps::of::<f32>(detected));
        assert_eq!(SimdCaps::resolve(ElementKind::F32, Backend::Auto), view.simd());
    }

    #[test]
    fn test_x86_detection_yields_packed_float_kernel() {
        #[cfg(target_arch = "x86_64")]
        {
            let detected = select_best_available_backend();
            assert!(matches!(
                detected,
                Backend::SSE2 | Backend::AVX | Backend::AVX2 | Backend::AVX512
            ));
            assert!(SimdCaps::of::<f32>(detected).width >= 4);
            assert!(SimdCaps::of::<f64>(detected).stream);
            assert!(!Kernel::select::<f32>(detected).is_scalar());
            assert!(Kernel::select::<i32>(detected).is_scalar());

            if is_x86_feature_detected!("avx2") && detected != Backend::AVX {
                assert_eq!(Kernel::select::<f64>(detected).stream_alignment(), Some(32));
            }
        }
    }

    #[test]
    fn test_scalar_backend_disables_vectorization() {
        let parent = DynamicVector::from_slice_with_backend(&[1.0f32; 10], Backend::Scalar);
        let view = parent.as_view();
        assert_eq!(view.simd().width, 1);
        assert!(!view.simd().is_vectorized());
        assert!(Kernel::select::<f32>(Backend::Scalar).is_scalar());
        assert!(view.is_aligned());
    }
}
