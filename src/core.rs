/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! View descriptors.
//!
//! A [`Core`] is the per-view bookkeeping record: the shape, the strides,
//! and the optional [`Manager`] handle that keeps the storage alive. Views
//! of the same array share a core behind `Rc`; restructuring operations
//! build new cores that reuse the same manager handle.

use std::fmt;
use std::rc::Rc;

use crate::manager::Manager;
use crate::vector::{IndexTuple, Vector};

/// Memory layout used when strides are derived from a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// The last dimension is contiguous (C convention).
    #[default]
    RowMajor,
    /// The first dimension is contiguous (Fortran convention).
    ColumnMajor,
}

/// Packed strides for `shape` in the given `order`.
///
/// The contiguous dimension gets stride 1 and each further dimension the
/// product of the sizes packed before it. Every size must be non-negative.
pub fn compute_strides<I: IndexTuple>(shape: I, order: Order) -> I {
    let mut strides = I::splat(0);
    let mut acc = 1isize;
    match order {
        Order::RowMajor => {
            for d in (0..I::LEN).rev() {
                debug_assert!(shape.get(d) >= 0, "negative size in dimension {d}");
                strides.set(d, acc);
                acc *= shape.get(d);
            }
        }
        Order::ColumnMajor => {
            for d in 0..I::LEN {
                debug_assert!(shape.get(d) >= 0, "negative size in dimension {d}");
                strides.set(d, acc);
                acc *= shape.get(d);
            }
        }
    }
    strides
}

/// Interface to a view descriptor of statically unknown rank.
///
/// Implemented by [`Core`] for every supported rank; generic view code
/// reaches descriptors exclusively through this trait.
pub trait RawCore: Clone + 'static {
    /// Index tuple with one component per dimension.
    type Index: IndexTuple;

    /// Number of dimensions.
    const RANK: usize;

    /// Descriptor with explicit strides.
    fn new(shape: Self::Index, strides: Self::Index, manager: Option<Rc<dyn Manager>>) -> Self;

    /// Descriptor with packed strides derived from `shape`.
    fn with_order(shape: Self::Index, order: Order, manager: Option<Rc<dyn Manager>>) -> Self {
        Self::new(shape, compute_strides(shape, order), manager)
    }

    /// The all-zero descriptor of an empty view. Holds no manager.
    fn zeroed() -> Self {
        let zero = <Self::Index as IndexTuple>::splat(0);
        Self::new(zero, zero, None)
    }

    /// The shape tuple.
    fn shape(&self) -> Self::Index;

    /// The stride tuple, in elements.
    fn strides(&self) -> Self::Index;

    /// Size of dimension `d`.
    ///
    /// # Panics
    ///
    /// Panics if `d` is not a dimension of this descriptor.
    fn size(&self, d: usize) -> isize;

    /// Stride of dimension `d`, in elements.
    ///
    /// # Panics
    ///
    /// Panics if `d` is not a dimension of this descriptor.
    fn stride(&self, d: usize) -> isize;

    /// Total number of elements; zero when any dimension has size zero.
    fn num_elements(&self) -> isize {
        self.shape().product()
    }

    /// Whether `index` addresses an element of this descriptor.
    fn in_bounds(&self, index: Self::Index) -> bool;

    /// Element offset of `index` from the view origin, in elements.
    ///
    /// The offset is the dot product of `index` and the strides; `index`
    /// must be in bounds.
    fn offset_of(&self, index: Self::Index) -> isize;

    /// The manager keeping the storage alive, if any.
    fn manager(&self) -> Option<&Rc<dyn Manager>>;

    /// Whether this descriptor's handle is the only path to the storage.
    ///
    /// `false` for unmanaged descriptors: without a manager there is no
    /// way to rule out other references.
    fn manager_unique(&self) -> bool;
}

/// View descriptor of rank `N`.
#[derive(Clone)]
pub struct Core<const N: usize> {
    shape: Vector<isize, N>,
    strides: Vector<isize, N>,
    manager: Option<Rc<dyn Manager>>,
}

impl<const N: usize> Core<N> {
    /// Descriptor with explicit strides.
    pub fn new(
        shape: Vector<isize, N>,
        strides: Vector<isize, N>,
        manager: Option<Rc<dyn Manager>>,
    ) -> Self {
        Core {
            shape,
            strides,
            manager,
        }
    }

    /// Overwrite the size of dimension `d`.
    ///
    /// Needs exclusive access, so a descriptor shared behind `Rc` must be
    /// cloned (or reached through [`Rc::get_mut`]) first; shared
    /// descriptors stay immutable.
    ///
    /// # Panics
    ///
    /// Panics if `d` is not a dimension of this descriptor.
    pub fn set_size(&mut self, d: usize, size: isize) {
        assert!(d < N, "dimension {d} is out of bounds (rank: {N})");
        self.shape[d] = size;
    }

    /// Overwrite the stride of dimension `d`, in elements.
    ///
    /// Same exclusivity rule as [`set_size`](Self::set_size).
    ///
    /// # Panics
    ///
    /// Panics if `d` is not a dimension of this descriptor.
    pub fn set_stride(&mut self, d: usize, stride: isize) {
        assert!(d < N, "dimension {d} is out of bounds (rank: {N})");
        self.strides[d] = stride;
    }
}

impl<const N: usize> RawCore for Core<N> {
    type Index = Vector<isize, N>;

    const RANK: usize = N;

    fn new(shape: Self::Index, strides: Self::Index, manager: Option<Rc<dyn Manager>>) -> Self {
        Core::new(shape, strides, manager)
    }

    fn shape(&self) -> Self::Index {
        self.shape
    }

    fn strides(&self) -> Self::Index {
        self.strides
    }

    fn size(&self, d: usize) -> isize {
        assert!(d < N, "dimension {d} is out of bounds (rank: {N})");
        self.shape[d]
    }

    fn stride(&self, d: usize) -> isize {
        assert!(d < N, "dimension {d} is out of bounds (rank: {N})");
        self.strides[d]
    }

    fn in_bounds(&self, index: Self::Index) -> bool {
        (0..N).all(|d| index[d] >= 0 && index[d] < self.shape[d])
    }

    fn offset_of(&self, index: Self::Index) -> isize {
        debug_assert!(
            self.in_bounds(index),
            "index {index:?} is out of bounds (shape: {:?})",
            self.shape
        );
        index.dot(self.strides)
    }

    fn manager(&self) -> Option<&Rc<dyn Manager>> {
        self.manager.as_ref()
    }

    fn manager_unique(&self) -> bool {
        match &self.manager {
            Some(manager) => Rc::strong_count(manager) == 1 && manager.is_unique(),
            None => false,
        }
    }
}

impl<const N: usize> fmt::Debug for Core<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("managed", &self.manager.is_some())
            .finish()
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::OwnedManager;

    #[test]
    fn packed_strides_row_major() {
        let shape = Vector::from([2isize, 3, 4]);
        assert_eq!(compute_strides(shape, Order::RowMajor), [12, 4, 1]);
    }

    #[test]
    fn packed_strides_column_major() {
        let shape = Vector::from([2isize, 3, 4]);
        assert_eq!(compute_strides(shape, Order::ColumnMajor), [1, 2, 6]);
    }

    #[test]
    fn packed_strides_rank_zero() {
        let shape: Vector<isize, 0> = Vector::from([]);
        assert_eq!(compute_strides(shape, Order::RowMajor), []);
    }

    #[test]
    fn offsets_follow_strides() {
        let core = Core::new(Vector::from([2isize, 3]), Vector::from([3isize, 1]), None);
        assert_eq!(core.num_elements(), 6);
        assert_eq!(core.offset_of(Vector::from([0, 0])), 0);
        assert_eq!(core.offset_of(Vector::from([1, 2])), 5);
        assert!(core.in_bounds(Vector::from([1, 2])));
        assert!(!core.in_bounds(Vector::from([2, 0])));
        assert!(!core.in_bounds(Vector::from([0, -1])));
    }

    #[test]
    fn zeroed_descriptor_is_empty_and_unmanaged() {
        let core = Core::<3>::zeroed();
        assert_eq!(core.shape(), [0, 0, 0]);
        assert_eq!(core.num_elements(), 0);
        assert!(core.manager().is_none());
        assert!(!core.manager_unique());
    }

    #[test]
    fn manager_uniqueness_tracks_handle_count() {
        let (manager, _ptr, _len) = OwnedManager::from_vec(vec![0u8; 6]);
        let core = Core::new(
            Vector::from([2isize, 3]),
            Vector::from([3isize, 1]),
            Some(manager),
        );
        assert!(core.manager_unique());
        let other = core.clone();
        assert!(!core.manager_unique());
        drop(other);
        assert!(core.manager_unique());
    }

    #[test]
    #[should_panic(expected = "dimension 2 is out of bounds (rank: 2)")]
    fn dimension_queries_are_checked() {
        let core = Core::<2>::zeroed();
        let _ = core.size(2);
    }

    #[test]
    fn mutation_needs_a_sole_referent() {
        let shared = Rc::new(Core::new(
            Vector::from([2isize, 3]),
            Vector::from([3isize, 1]),
            None,
        ));
        let mut shared = shared;
        let other = Rc::clone(&shared);
        assert!(Rc::get_mut(&mut shared).is_none());
        drop(other);

        let core = Rc::get_mut(&mut shared).unwrap();
        core.set_size(0, 4);
        core.set_stride(0, 6);
        assert_eq!(shared.shape(), [4, 3]);
        assert_eq!(shared.strides(), [6, 1]);
    }
}
