/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Fixed-size numeric tuples.
//!
//! [`Vector`] is the value type used throughout the crate for shapes,
//! strides, and index tuples. It is a thin wrapper over `[T; N]` with
//! elementwise arithmetic, scalar broadcasting, reductions, and
//! compile-time-checked subranges.

use std::array;
use std::fmt;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div, DivAssign,
    Index, IndexMut, Mul, MulAssign, Neg, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};

use num_traits::{One, Zero};

/// A fixed-length numeric tuple.
///
/// `Vector` is `Copy` and passed by value. Binary operators accept either
/// another `Vector` of the same length or a bare scalar, which is broadcast
/// to every component; each operator is available exactly when `T` supports
/// it. Length-changing operations ([`first`], [`last`], [`segment`],
/// [`concat`]) take their output length as a const parameter and reject
/// impossible requests at compile time.
///
/// ```
/// use ndspan::Vector;
///
/// let v = Vector::from([1, 2, 3]);
/// assert_eq!(v + v, [2, 4, 6]);
/// assert_eq!(v * 10, [10, 20, 30]);
/// assert_eq!(v.sum(), 6);
/// let head: Vector<i32, 2> = v.first();
/// assert_eq!(head, [1, 2]);
/// ```
///
/// [`first`]: Vector::first
/// [`last`]: Vector::last
/// [`segment`]: Vector::segment
/// [`concat`]: Vector::concat
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vector<T, const N: usize>([T; N]);

impl<T, const N: usize> Vector<T, N> {
    /// Number of components.
    pub const fn len(&self) -> usize {
        N
    }

    /// `true` iff `N == 0`.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Unwrap into the underlying array.
    pub fn into_inner(self) -> [T; N] {
        self.0
    }

    /// Borrow the components as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Borrow the components as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.0
    }

    /// Iterate over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Iterate mutably over the components.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.0.iter_mut()
    }
}

impl<T: Copy, const N: usize> Vector<T, N> {
    /// A vector with every component equal to `value`.
    pub fn from_elem(value: T) -> Self {
        Vector([value; N])
    }

    /// The leading `M` components.
    ///
    /// Requesting more components than the vector holds is a compile-time
    /// error.
    pub fn first<const M: usize>(self) -> Vector<T, M> {
        const {
            assert!(M <= N, "subrange length exceeds the vector length");
        }
        Vector(array::from_fn(|d| self.0[d]))
    }

    /// The trailing `M` components.
    ///
    /// Requesting more components than the vector holds is a compile-time
    /// error.
    pub fn last<const M: usize>(self) -> Vector<T, M> {
        const {
            assert!(M <= N, "subrange length exceeds the vector length");
        }
        Vector(array::from_fn(|d| self.0[N - M + d]))
    }

    /// `M` components starting at `START`.
    ///
    /// A subrange extending past the end of the vector is a compile-time
    /// error.
    pub fn segment<const START: usize, const M: usize>(self) -> Vector<T, M> {
        const {
            assert!(START + M <= N, "subrange extends past the end of the vector");
        }
        Vector(array::from_fn(|d| self.0[START + d]))
    }

    /// Concatenate with `other`. The output length `L` must equal `N + M`;
    /// anything else is a compile-time error.
    pub fn concat<const M: usize, const L: usize>(self, other: Vector<T, M>) -> Vector<T, L> {
        const {
            assert!(L == N + M, "concatenated length must equal the sum of the input lengths");
        }
        Vector(array::from_fn(|d| {
            if d < N {
                self.0[d]
            } else {
                other.0[d - N]
            }
        }))
    }

    /// The components in reverse order.
    pub fn reversed(self) -> Self {
        Vector(array::from_fn(|d| self.0[N - 1 - d]))
    }

    /// Reorder the components so that component `d` of the result is
    /// component `order[d]` of `self`.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of `0..N`.
    pub fn permuted(self, order: Vector<isize, N>) -> Self {
        let mut seen = [false; N];
        for d in 0..N {
            let o = order.0[d];
            assert!(
                o >= 0 && (o as usize) < N,
                "permutation entry {o} is out of bounds (length: {N})"
            );
            assert!(!seen[o as usize], "permutation repeats entry {o}");
            seen[o as usize] = true;
        }
        Vector(array::from_fn(|d| self.0[order.0[d] as usize]))
    }

    /// Sum of the components; `0` for a zero-length vector.
    pub fn sum(self) -> T
    where
        T: Zero,
    {
        self.0.into_iter().fold(T::zero(), |acc, v| acc + v)
    }

    /// Product of the components; `1` for a zero-length vector.
    pub fn product(self) -> T
    where
        T: One,
    {
        self.0.into_iter().fold(T::one(), |acc, v| acc * v)
    }

    /// Dot product with `other`; `0` for zero-length vectors.
    pub fn dot(self, other: Self) -> T
    where
        T: Zero + Mul<Output = T>,
    {
        self.0
            .into_iter()
            .zip(other.0)
            .fold(T::zero(), |acc, (a, b)| acc + a * b)
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T, N> {
    fn from(values: [T; N]) -> Self {
        Vector(values)
    }
}

impl<T: Default, const N: usize> Default for Vector<T, N> {
    fn default() -> Self {
        Vector(array::from_fn(|_| T::default()))
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for Vector<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T, const N: usize> Index<usize> for Vector<T, N> {
    type Output = T;

    fn index(&self, d: usize) -> &T {
        assert!(d < N, "component {d} is out of bounds (length: {N})");
        &self.0[d]
    }
}

impl<T, const N: usize> IndexMut<usize> for Vector<T, N> {
    fn index_mut(&mut self, d: usize) -> &mut T {
        assert!(d < N, "component {d} is out of bounds (length: {N})");
        &mut self.0[d]
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Vector<T, N> {
    fn eq(&self, other: &[T; N]) -> bool {
        &self.0 == other
    }
}

impl<T: Neg<Output = T> + Copy, const N: usize> Neg for Vector<T, N> {
    type Output = Vector<T, N>;

    fn neg(mut self) -> Vector<T, N> {
        for d in 0..N {
            self.0[d] = self.0[d].neg();
        }
        self
    }
}

macro_rules! vector_arith {
    ($op:ident :: $method:ident, $op_assign:ident :: $method_assign:ident) => {
        impl<T: $op<Output = T> + Copy, const N: usize> $op for Vector<T, N> {
            type Output = Vector<T, N>;

            fn $method(mut self, rhs: Vector<T, N>) -> Vector<T, N> {
                for d in 0..N {
                    self.0[d] = self.0[d].$method(rhs.0[d]);
                }
                self
            }
        }

        impl<T: $op<Output = T> + Copy, const N: usize> $op<T> for Vector<T, N> {
            type Output = Vector<T, N>;

            fn $method(mut self, rhs: T) -> Vector<T, N> {
                for d in 0..N {
                    self.0[d] = self.0[d].$method(rhs);
                }
                self
            }
        }

        impl<T: $op_assign + Copy, const N: usize> $op_assign for Vector<T, N> {
            fn $method_assign(&mut self, rhs: Vector<T, N>) {
                for d in 0..N {
                    self.0[d].$method_assign(rhs.0[d]);
                }
            }
        }

        impl<T: $op_assign + Copy, const N: usize> $op_assign<T> for Vector<T, N> {
            fn $method_assign(&mut self, rhs: T) {
                for d in 0..N {
                    self.0[d].$method_assign(rhs);
                }
            }
        }
    };
}

vector_arith!(Add::add, AddAssign::add_assign);
vector_arith!(Sub::sub, SubAssign::sub_assign);
vector_arith!(Mul::mul, MulAssign::mul_assign);
vector_arith!(Div::div, DivAssign::div_assign);
vector_arith!(Rem::rem, RemAssign::rem_assign);
vector_arith!(BitAnd::bitand, BitAndAssign::bitand_assign);
vector_arith!(BitOr::bitor, BitOrAssign::bitor_assign);
vector_arith!(BitXor::bitxor, BitXorAssign::bitxor_assign);
vector_arith!(Shl::shl, ShlAssign::shl_assign);
vector_arith!(Shr::shr, ShrAssign::shr_assign);

/// Operations the view layer needs from an index tuple of erased length.
///
/// Implemented for every `Vector<isize, N>`; generic array code reaches
/// shapes, strides, and indices exclusively through this trait.
pub trait IndexTuple: Copy + PartialEq + fmt::Debug + 'static {
    /// Number of components.
    const LEN: usize;

    /// A tuple with every component equal to `value`.
    fn splat(value: isize) -> Self;

    /// Component `d`.
    fn get(&self, d: usize) -> isize;

    /// Overwrite component `d`.
    fn set(&mut self, d: usize, value: isize);

    /// The components in reverse order.
    fn reversed(self) -> Self;

    /// Reorder components by a permutation.
    fn permuted(self, order: Self) -> Self;

    /// Product of the components (`1` when empty).
    fn product(self) -> isize;

    /// Borrow the components as a slice.
    fn as_slice(&self) -> &[isize];
}

impl<const N: usize> IndexTuple for Vector<isize, N> {
    const LEN: usize = N;

    fn splat(value: isize) -> Self {
        Vector::from_elem(value)
    }

    fn get(&self, d: usize) -> isize {
        self.0[d]
    }

    fn set(&mut self, d: usize, value: isize) {
        self.0[d] = value;
    }

    fn reversed(self) -> Self {
        Vector::reversed(self)
    }

    fn permuted(self, order: Self) -> Self {
        Vector::permuted(self, order)
    }

    fn product(self) -> isize {
        Vector::product(self)
    }

    fn as_slice(&self) -> &[isize] {
        &self.0
    }
}

///////////
// Tests //
///////////
