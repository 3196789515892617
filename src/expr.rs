//! Lazy expression nodes
//!
//! Nodes own their children (container references, views or other nodes)
//! and evaluate on demand, either element by element through
//! [`Operand::at`] or block by block through [`Operand::load_block`], where
//! arithmetic runs on the packed kernels. Nothing is computed until the
//! expression is assigned or [`OperandExt::evaluate`]d.
//!
//! # Examples
//!
//! ```
//! use subvec::{DynamicVector, OperandExt};
//!
//! let a = DynamicVector::from_slice(&[1.0f32, 2.0, 3.0, 4.0]);
//! let b = DynamicVector::from_slice(&[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
//!
//! // a + subvector(b, 4, 4) * 2
//! let expr = a.add(b.subvector(4, 4).unwrap().mul_scalar(2.0)).unwrap();
//! assert_eq!(expr.evaluate().to_vec(), vec![9.0, 12.0, 15.0, 18.0]);
//! ```

use std::cell::Cell;
use std::marker::PhantomData;

use crate::alias::Footprint;
use crate::backends::{Kernel, PackedOp};
use crate::dense::DynamicVector;
use crate::element::Element;
use crate::engine::MAX_BLOCK;
use crate::error::{Result, ViewError};
use crate::operand::{Capabilities, Density, Operand};
use crate::simd::OpSet;

/// Element-wise binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `lhs + rhs`
    Add,
    /// `lhs - rhs`
    Sub,
    /// `lhs * rhs`
    Mul,
}

impl BinaryOp {
    #[inline]
    fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
        }
    }

    fn packed(self) -> PackedOp {
        match self {
            Self::Add => PackedOp::Add,
            Self::Sub => PackedOp::Sub,
            Self::Mul => PackedOp::Mul,
        }
    }

    fn required(self) -> OpSet {
        match self {
            Self::Add => OpSet::ADD,
            Self::Sub => OpSet::SUB,
            Self::Mul => OpSet::MUL,
        }
    }
}

/// `lhs op rhs`, element-wise
///
/// A product with a sparse side is sparse; sums and differences are dense.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<L, R> {
    lhs: L,
    rhs: R,
    op: BinaryOp,
}

impl<L, R> BinaryExpr<L, R>
where
    L: Operand,
    R: Operand<Elem = L::Elem>,
{
    /// Combine two operands of equal size
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if the sizes differ.
    pub fn new(lhs: L, rhs: R, op: BinaryOp) -> Result<Self> {
        if lhs.size() != rhs.size() {
            return Err(ViewError::SizeMismatch {
                expected: lhs.size(),
                actual: rhs.size(),
            });
        }
        Ok(Self { lhs, rhs, op })
    }

    /// Operator of this node
    pub fn op(&self) -> BinaryOp {
        self.op
    }
}

impl<L, R> Operand for BinaryExpr<L, R>
where
    L: Operand,
    R: Operand<Elem = L::Elem>,
{
    type Elem = L::Elem;

    fn size(&self) -> usize {
        self.lhs.size()
    }

    #[inline]
    fn at(&self, index: usize) -> L::Elem {
        self.op.apply(self.lhs.at(index), self.rhs.at(index))
    }

    fn capabilities(&self) -> Capabilities {
        let (l, r) = (self.lhs.capabilities(), self.rhs.capabilities());
        let sparse = self.op == BinaryOp::Mul && (l.is_sparse() || r.is_sparse());
        Capabilities {
            density: if sparse { Density::Sparse } else { Density::Dense },
            vectorizable: !sparse && l.vectorizable && r.vectorizable,
            requires: l.requires.union(r.requires).union(self.op.required()),
        }
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.lhs.can_alias(target) || self.rhs.can_alias(target)
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.lhs.is_aliased(target) || self.rhs.is_aliased(target)
    }

    fn load_block(&self, start: usize, out: &mut [L::Elem], kernel: Kernel) {
        let mut rhs = [L::Elem::default(); MAX_BLOCK];
        for (k, chunk) in out.chunks_mut(MAX_BLOCK).enumerate() {
            let at = start + k * MAX_BLOCK;
            let n = chunk.len();
            self.lhs.load_block(at, chunk, kernel);
            self.rhs.load_block(at, &mut rhs[..n], kernel);
            <L::Elem as Element>::run_packed(
                kernel,
                self.op.packed(),
                Cell::from_mut(chunk).as_slice_of_cells(),
                &rhs[..n],
            );
        }
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, L::Elem)) {
        let (l, r) = (self.lhs.capabilities(), self.rhs.capabilities());
        let emit = &mut |index: usize, value: L::Elem| {
            if !value.is_default() {
                f(index, value);
            }
        };

        if self.op == BinaryOp::Mul && l.is_sparse() {
            self.lhs
                .for_each_nonzero(&mut |i, value| emit(i, value * self.rhs.at(i)));
        } else if self.op == BinaryOp::Mul && r.is_sparse() {
            self.rhs
                .for_each_nonzero(&mut |i, value| emit(i, self.lhs.at(i) * value));
        } else {
            for i in 0..self.size() {
                emit(i, self.at(i));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleOp {
    Mul,
    Div,
}

/// `expr * scalar` or `expr / scalar`
#[derive(Debug, Clone, Copy)]
pub struct ScaledExpr<E: Operand> {
    expr: E,
    scalar: E::Elem,
    op: ScaleOp,
}

impl<E: Operand> ScaledExpr<E> {
    fn apply(&self, value: E::Elem) -> E::Elem {
        match self.op {
            ScaleOp::Mul => value * self.scalar,
            ScaleOp::Div => value / self.scalar,
        }
    }
}

impl<E: Operand> Operand for ScaledExpr<E> {
    type Elem = E::Elem;

    fn size(&self) -> usize {
        self.expr.size()
    }

    #[inline]
    fn at(&self, index: usize) -> E::Elem {
        self.apply(self.expr.at(index))
    }

    fn capabilities(&self) -> Capabilities {
        let inner = self.expr.capabilities();
        match self.op {
            ScaleOp::Mul => inner.with_requires(OpSet::MUL),
            ScaleOp::Div => inner.non_vectorizable(),
        }
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.expr.can_alias(target)
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.expr.is_aliased(target)
    }

    fn load_block(&self, start: usize, out: &mut [E::Elem], kernel: Kernel) {
        self.expr.load_block(start, out, kernel);
        match self.op {
            ScaleOp::Mul => {
                let factors = [self.scalar; MAX_BLOCK];
                for chunk in out.chunks_mut(MAX_BLOCK) {
                    let n = chunk.len();
                    <E::Elem as Element>::run_packed(
                        kernel,
                        PackedOp::Mul,
                        Cell::from_mut(chunk).as_slice_of_cells(),
                        &factors[..n],
                    );
                }
            }
            ScaleOp::Div => {
                for slot in out.iter_mut() {
                    *slot = *slot / self.scalar;
                }
            }
        }
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, E::Elem)) {
        self.expr.for_each_nonzero(&mut |i, value| {
            let scaled = self.apply(value);
            if !scaled.is_default() {
                f(i, scaled);
            }
        });
    }
}

/// Element type conversion; never vectorizable
#[derive(Debug, Clone, Copy)]
pub struct CastExpr<E, U> {
    expr: E,
    target: PhantomData<U>,
}

impl<E, U> Operand for CastExpr<E, U>
where
    E: Operand,
    U: Element + From<E::Elem>,
{
    type Elem = U;

    fn size(&self) -> usize {
        self.expr.size()
    }

    fn at(&self, index: usize) -> U {
        U::from(self.expr.at(index))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            requires: OpSet::EMPTY,
            ..self.expr.capabilities().non_vectorizable()
        }
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.expr.can_alias(target)
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.expr.is_aliased(target)
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, U)) {
        self.expr.for_each_nonzero(&mut |i, value| {
            let converted = U::from(value);
            if !converted.is_default() {
                f(i, converted);
            }
        });
    }
}

/// Three-dimensional cross product `lhs x rhs`
///
/// Has no storage of its own; wrap it with [`crate::subvector_of`] to take
/// a view of it.
#[derive(Debug, Clone, Copy)]
pub struct CrossExpr<L, R> {
    lhs: L,
    rhs: R,
}

impl<L, R> Operand for CrossExpr<L, R>
where
    L: Operand,
    R: Operand<Elem = L::Elem>,
{
    type Elem = L::Elem;

    fn size(&self) -> usize {
        3
    }

    fn at(&self, index: usize) -> L::Elem {
        debug_assert!(index < 3);
        let (j, k) = ((index + 1) % 3, (index + 2) % 3);
        self.lhs.at(j) * self.rhs.at(k) - self.lhs.at(k) * self.rhs.at(j)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dense().non_vectorizable()
    }

    fn can_alias(&self, target: &Footprint) -> bool {
        self.lhs.can_alias(target) || self.rhs.can_alias(target)
    }

    fn is_aliased(&self, target: &Footprint) -> bool {
        self.lhs.is_aliased(target) || self.rhs.is_aliased(target)
    }
}

/// Expression builders available on every operand
pub trait OperandExt: Operand + Sized {
    /// `self + rhs`
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if the sizes differ.
    fn add<R: Operand<Elem = Self::Elem>>(self, rhs: R) -> Result<BinaryExpr<Self, R>> {
        BinaryExpr::new(self, rhs, BinaryOp::Add)
    }

    /// `self - rhs`
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if the sizes differ.
    fn sub<R: Operand<Elem = Self::Elem>>(self, rhs: R) -> Result<BinaryExpr<Self, R>> {
        BinaryExpr::new(self, rhs, BinaryOp::Sub)
    }

    /// `self * rhs`, element-wise
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] if the sizes differ.
    fn mul<R: Operand<Elem = Self::Elem>>(self, rhs: R) -> Result<BinaryExpr<Self, R>> {
        BinaryExpr::new(self, rhs, BinaryOp::Mul)
    }

    /// `self * scalar`
    fn mul_scalar(self, scalar: Self::Elem) -> ScaledExpr<Self> {
        ScaledExpr {
            expr: self,
            scalar,
            op: ScaleOp::Mul,
        }
    }

    /// `self / scalar`
    ///
    /// Floating-point kinds multiply by the reciprocal instead of dividing.
    /// Division by zero is a caller bug, checked in debug builds.
    fn div_scalar(self, scalar: Self::Elem) -> ScaledExpr<Self> {
        debug_assert!(!scalar.is_default(), "division by zero");
        if <Self::Elem as Element>::KIND.is_float() {
            self.mul_scalar(<Self::Elem as Element>::one() / scalar)
        } else {
            ScaledExpr {
                expr: self,
                scalar,
                op: ScaleOp::Div,
            }
        }
    }

    /// Convert every element to `U`
    fn cast<U: Element + From<Self::Elem>>(self) -> CastExpr<Self, U> {
        CastExpr {
            expr: self,
            target: PhantomData,
        }
    }

    /// Cross product of two 3-element operands
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SizeMismatch`] (expected 3) if either side has
    /// another size.
    fn cross<R: Operand<Elem = Self::Elem>>(self, rhs: R) -> Result<CrossExpr<Self, R>> {
        for actual in [self.size(), rhs.size()] {
            if actual != 3 {
                return Err(ViewError::SizeMismatch {
                    expected: 3,
                    actual,
                });
            }
        }
        Ok(CrossExpr { lhs: self, rhs })
    }

    /// Evaluate into a new dense vector
    fn evaluate(self) -> DynamicVector<Self::Elem> {
        DynamicVector::from_operand(self)
    }
}

impl<O: Operand> OperandExt for O {}
