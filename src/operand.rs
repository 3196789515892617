//! The expression-tree interface
//!
//! Anything that can appear on the right-hand side of an assignment
//! implements [`Operand`]: container references, views, expression nodes and
//! restricted views. The engine only ever talks to this trait.

use crate::alias::Footprint;
use crate::element::Element;
use crate::backends::Kernel;
use crate::simd::OpSet;

/// How an operand prefers to be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// Every element, in blocks
    Dense,
    /// Only listed `(index, value)` pairs; everything else is zero
    Sparse,
}

/// Runtime capability flags of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Preferred traversal
    pub density: Density,
    /// Whether [`Operand::load_block`] is worth calling from the packed path
    pub vectorizable: bool,
    /// Packed operations needed to evaluate the operand itself
    pub requires: OpSet,
}

impl Capabilities {
    /// Dense, vectorizable, no arithmetic of its own
    pub const fn dense() -> Self {
        Self {
            density: Density::Dense,
            vectorizable: true,
            requires: OpSet::EMPTY,
        }
    }

    /// Sparse; the packed path never applies
    pub const fn sparse() -> Self {
        Self {
            density: Density::Sparse,
            vectorizable: false,
            requires: OpSet::EMPTY,
        }
    }

    /// Same flags with vectorization disabled
    #[must_use]
    pub const fn non_vectorizable(mut self) -> Self {
        self.vectorizable = false;
        self
    }

    /// Same flags additionally requiring `ops`
    #[must_use]
    pub const fn with_requires(mut self, ops: OpSet) -> Self {
        self.requires = self.requires.union(ops);
        self
    }

    /// Sparse density
    pub const fn is_sparse(&self) -> bool {
        matches!(self.density, Density::Sparse)
    }
}

/// A right-hand side of an assignment
///
/// Element types of the two sides of an assignment are identical by
/// construction (`Elem` must match the target's element type).
pub trait Operand {
    /// Element type produced
    type Elem: Element;

    /// Number of elements
    fn size(&self) -> usize;

    /// Element at `index`
    ///
    /// `index < self.size()` is a caller precondition, checked in debug builds.
    fn at(&self, index: usize) -> Self::Elem;

    /// Capability flags
    fn capabilities(&self) -> Capabilities;

    /// Conservative check: does the operand read the storage of `target` at all?
    fn can_alias(&self, target: &Footprint) -> bool;

    /// Precise check: does the operand read any element inside `target`?
    fn is_aliased(&self, target: &Footprint) -> bool;

    /// Storage range this operand is a direct view of, if any
    fn footprint(&self) -> Option<Footprint> {
        None
    }

    /// Evaluate elements `start..start + out.len()` into `out`
    fn load_block(&self, start: usize, out: &mut [Self::Elem], kernel: Kernel) {
        let _ = kernel;
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.at(start + k);
        }
    }

    /// Visit every non-default element in ascending index order
    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, Self::Elem)) {
        for i in 0..self.size() {
            let value = self.at(i);
            if !value.is_default() {
                f(i, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal operand computing `i * step`
    struct Ramp {
        len: usize,
        step: i32,
    }

    impl Operand for Ramp {
        type Elem = i32;

        fn size(&self) -> usize {
            self.len
        }

        fn at(&self, index: usize) -> i32 {
            index as i32 * self.step
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::dense().non_vectorizable()
        }

        fn can_alias(&self, _target: &Footprint) -> bool {
            false
        }

        fn is_aliased(&self, _target: &Footprint) -> bool {
            false
        }
    }

    #[test]
    fn test_capability_builders() {
        let caps = Capabilities::dense().with_requires(OpSet::MUL);
        assert!(caps.vectorizable);
        assert!(caps.requires.contains(OpSet::MUL));
        assert!(!caps.is_sparse());

        let caps = caps.non_vectorizable().with_requires(OpSet::ADD);
        assert!(!caps.vectorizable);
        assert!(caps.requires.contains(OpSet::ADD.union(OpSet::MUL)));

        assert!(Capabilities::sparse().is_sparse());
        assert!(!Capabilities::sparse().vectorizable);
    }

    #[test]
    fn test_default_load_block() {
        let ramp = Ramp { len: 10, step: 3 };
        let mut out = [0; 4];
        ramp.load_block(5, &mut out, Kernel::SCALAR);
        assert_eq!(out, [15, 18, 21, 24]);
        assert_eq!(ramp.footprint(), None);
    }

    #[test]
    fn test_default_nonzero_visitor_skips_zero() {
        let ramp = Ramp { len: 4, step: 2 };
        let mut seen = Vec::new();
        ramp.for_each_nonzero(&mut |i, v| seen.push((i, v)));
        assert_eq!(seen, vec![(1, 2), (2, 4), (3, 6)]);
    }
}
