/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Constructors and layout validation.
//!
//! Owning arrays come from [`Array::allocate`], [`Array::from_elem`], and
//! [`Array::from_vec`]; borrowed views come from slices. Every safe
//! constructor validates the shape (and, for explicit strides, the whole
//! layout) before any pointer arithmetic happens, so the rest of the crate
//! can trust that in-bounds indices address live elements.

use std::ptr::NonNull;
use std::rc::Rc;

use crate::core::{Order, RawCore};
use crate::error::LayoutError;
use crate::geometry::Geometry;
use crate::manager::{Manager, OwnedManager};
use crate::vector::IndexTuple;

use super::{Array, ArrayRef, ArrayView, ArrayViewMut};

/// Element count of `shape`, rejecting negative sizes and overflow.
pub(crate) fn checked_num_elements<I: IndexTuple>(shape: I) -> Result<isize, LayoutError> {
    let mut total = 1isize;
    for d in 0..I::LEN {
        let size = shape.get(d);
        if size < 0 {
            return Err(LayoutError::NegativeSize { size, dim: d });
        }
        total = total.checked_mul(size).ok_or(LayoutError::Overflow)?;
    }
    Ok(total)
}

/// Smallest and largest element offsets reachable from in-bounds indices.
///
/// Assumes a non-empty, non-negative shape; fails only on offset overflow.
pub(crate) fn offset_bounds<I: IndexTuple>(
    shape: I,
    strides: I,
) -> Result<(isize, isize), LayoutError> {
    let mut min = 0isize;
    let mut max = 0isize;
    for d in 0..I::LEN {
        let reach = strides
            .get(d)
            .checked_mul(shape.get(d) - 1)
            .ok_or(LayoutError::Overflow)?;
        if reach >= 0 {
            max = max.checked_add(reach).ok_or(LayoutError::Overflow)?;
        } else {
            min = min.checked_add(reach).ok_or(LayoutError::Overflow)?;
        }
    }
    Ok((min, max))
}

/// Conservative injectivity test for a strided layout.
///
/// Sorts the dimensions by stride magnitude and requires each stride to
/// clear the whole span of the dimensions before it, which rules out any
/// two in-bounds indices sharing an element. Some exotic injective
/// layouts fail the test; nothing aliased passes it.
pub(crate) fn layout_is_injective<I: IndexTuple>(shape: I, strides: I) -> bool {
    let mut dims: Vec<(isize, isize)> = Vec::with_capacity(I::LEN);
    for d in 0..I::LEN {
        let size = shape.get(d);
        if size == 0 {
            return true;
        }
        if size > 1 {
            dims.push((strides.get(d).abs(), size));
        }
    }
    dims.sort_unstable();
    let mut extent = 1isize;
    for (stride, size) in dims {
        if stride < extent {
            return false;
        }
        extent += stride * (size - 1);
    }
    true
}

/// Packing order that honors `G`'s contiguity claim.
fn packing_order<G: Geometry>() -> Order {
    if G::RMC < 0 {
        Order::ColumnMajor
    } else {
        Order::RowMajor
    }
}

fn slice_origin<T>(data: &[T]) -> NonNull<T> {
    match NonNull::new(data.as_ptr().cast_mut()) {
        Some(ptr) => ptr,
        None => NonNull::dangling(),
    }
}

impl<T, G: Geometry> Array<T, G> {
    /// A freshly allocated array of default-initialized elements.
    ///
    /// The storage is packed row-major, or column-major when `G` claims
    /// column-major contiguity, so the result always honors the geometry's
    /// contract.
    pub fn allocate(shape: G::Index) -> Result<Self, LayoutError>
    where
        T: Default + 'static,
    {
        let len = checked_num_elements(shape)?;
        let data = (0..len).map(|_| T::default()).collect();
        Ok(Self::from_parts_packed(shape, data, packing_order::<G>()))
    }

    /// A freshly allocated array with every element a clone of `value`.
    pub fn from_elem(shape: G::Index, value: T) -> Result<Self, LayoutError>
    where
        T: Clone + 'static,
    {
        let len = checked_num_elements(shape)?;
        let data = vec![value; len as usize];
        Ok(Self::from_parts_packed(shape, data, packing_order::<G>()))
    }

    /// An array adopting `data` as its storage, filled in row-major order.
    ///
    /// `data.len()` must equal the number of elements `shape` implies.
    /// Only geometries without a column-major claim can be built this way,
    /// since the storage order is fixed by the vector.
    pub fn from_vec(shape: G::Index, data: Vec<T>) -> Result<Self, LayoutError>
    where
        T: 'static,
    {
        const {
            assert!(
                G::RMC >= 0 || G::RANK <= 1,
                "a vector fills a view in row-major order"
            );
        }
        let len = checked_num_elements(shape)?;
        if data.len() != len as usize {
            return Err(LayoutError::SizeMismatch {
                expected: len as usize,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts_packed(shape, data, Order::RowMajor))
    }

    fn from_parts_packed(shape: G::Index, data: Vec<T>, order: Order) -> Self
    where
        T: 'static,
    {
        let (manager, ptr, _len) = OwnedManager::from_vec(data);
        let manager: Rc<dyn Manager> = manager;
        let core = <G::Core as RawCore>::with_order(shape, order, Some(manager));
        Array::from_ref(ArrayRef::from_parts(ptr, Rc::new(core)))
    }

    /// The empty array: zero shape and strides, no storage.
    ///
    /// A rank-0 geometry always holds exactly one element and so has no
    /// empty state; asking for one is a compile-time error.
    pub fn empty() -> Self {
        const {
            assert!(G::RANK >= 1, "rank-0 views always hold one element");
        }
        Array::from_ref(ArrayRef::from_parts(
            NonNull::dangling(),
            Rc::new(<G::Core as RawCore>::zeroed()),
        ))
    }

    /// An array over storage described by raw parts.
    ///
    /// `ptr` is the view origin, not necessarily the start of an
    /// allocation; negative strides are permitted as long as every
    /// in-bounds index stays inside the allocation.
    ///
    /// # Safety
    ///
    /// For the lifetime of the array and everything derived from it:
    ///
    /// * every in-bounds index must address a valid element through `ptr`
    ///   and `strides`;
    /// * the layout must be injective and must satisfy `G`'s contiguity
    ///   claim;
    /// * the storage must stay alive, which `manager` can take care of;
    /// * no access outside this crate may alias the elements while a
    ///   mutable path ([`Array::deep_unchecked`] or a unique handle) is
    ///   used.
    pub unsafe fn from_raw_parts(
        ptr: NonNull<T>,
        shape: G::Index,
        strides: G::Index,
        manager: Option<Rc<dyn Manager>>,
    ) -> Self {
        Array::from_ref(ArrayRef::from_parts(
            ptr,
            Rc::new(<G::Core as RawCore>::new(shape, strides, manager)),
        ))
    }
}

impl<'a, T, G: Geometry> ArrayView<'a, T, G> {
    /// A view of `data` in row-major order.
    ///
    /// `data.len()` must equal the number of elements `shape` implies.
    pub fn from_slice(data: &'a [T], shape: G::Index) -> Result<Self, LayoutError> {
        const {
            assert!(
                G::RMC >= 0 || G::RANK <= 1,
                "a slice fills a view in row-major order"
            );
        }
        let len = checked_num_elements(shape)?;
        if data.len() != len as usize {
            return Err(LayoutError::SizeMismatch {
                expected: len as usize,
                actual: data.len(),
            });
        }
        let core = <G::Core as RawCore>::with_order(shape, Order::RowMajor, None);
        Ok(ArrayView::from_parts(slice_origin(data), Rc::new(core)))
    }

    /// A view of `data` with explicit strides.
    ///
    /// The origin is the first slice element, so every stride must keep
    /// the layout inside the slice; in particular negative strides are
    /// rejected for non-degenerate dimensions. The geometry must claim no
    /// contiguity, because none is verified here; claim one afterwards
    /// with [`dynamic_dimension_cast`](ArrayRef::dynamic_dimension_cast).
    pub fn from_slice_strided(
        data: &'a [T],
        shape: G::Index,
        strides: G::Index,
    ) -> Result<Self, LayoutError> {
        const {
            assert!(
                G::RMC == 0,
                "strided views carry no contiguity guarantee until one is verified"
            );
        }
        let len = checked_num_elements(shape)?;
        if len > 0 {
            let (min, max) = offset_bounds(shape, strides)?;
            if min < 0 || max >= data.len() as isize {
                return Err(LayoutError::OutOfBounds {
                    min,
                    max,
                    len: data.len(),
                });
            }
        }
        let core = <G::Core as RawCore>::new(shape, strides, None);
        Ok(ArrayView::from_parts(slice_origin(data), Rc::new(core)))
    }
}

impl<'a, T, G: Geometry> ArrayViewMut<'a, T, G> {
    /// An exclusive view of `data` in row-major order.
    ///
    /// `data.len()` must equal the number of elements `shape` implies.
    pub fn from_slice(data: &'a mut [T], shape: G::Index) -> Result<Self, LayoutError> {
        const {
            assert!(
                G::RMC >= 0 || G::RANK <= 1,
                "a slice fills a view in row-major order"
            );
        }
        let len = checked_num_elements(shape)?;
        if data.len() != len as usize {
            return Err(LayoutError::SizeMismatch {
                expected: len as usize,
                actual: data.len(),
            });
        }
        let origin = match NonNull::new(data.as_mut_ptr()) {
            Some(ptr) => ptr,
            None => NonNull::dangling(),
        };
        let core = <G::Core as RawCore>::with_order(shape, Order::RowMajor, None);
        Ok(ArrayViewMut::from_parts(origin, Rc::new(core)))
    }

    /// An exclusive view of `data` with explicit strides.
    ///
    /// On top of the bounds validation of the shared version, the layout
    /// must pass the injectivity test: a layout where two indices share an
    /// element cannot back a mutable view.
    pub fn from_slice_strided(
        data: &'a mut [T],
        shape: G::Index,
        strides: G::Index,
    ) -> Result<Self, LayoutError> {
        const {
            assert!(
                G::RMC == 0,
                "strided views carry no contiguity guarantee until one is verified"
            );
        }
        let len = checked_num_elements(shape)?;
        if len > 0 {
            let (min, max) = offset_bounds(shape, strides)?;
            if min < 0 || max >= data.len() as isize {
                return Err(LayoutError::OutOfBounds {
                    min,
                    max,
                    len: data.len(),
                });
            }
        }
        if !layout_is_injective(shape, strides) {
            return Err(LayoutError::Aliasing);
        }
        let origin = match NonNull::new(data.as_mut_ptr()) {
            Some(ptr) => ptr,
            None => NonNull::dangling(),
        };
        let core = <G::Core as RawCore>::new(shape, strides, None);
        Ok(ArrayViewMut::from_parts(origin, Rc::new(core)))
    }
}

///////////
// Tests //
///////////
