/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Iteration over strided views.
//!
//! Element iterators visit logical row-major order: the last index moves
//! fastest regardless of how the elements sit in memory. The offset
//! odometer at the bottom does the stride bookkeeping once; element and
//! row iterators, fills, and copies all ride on it.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::core::{compute_strides, Order, RawCore};
use crate::geometry::Geometry;
use crate::vector::IndexTuple;

use super::{offset_ptr, ArrayRef, ArrayView, ArrayViewMut};

/// Element offsets of a strided view in logical row-major order.
///
/// Carries an index odometer: each step bumps the last dimension, and a
/// dimension that wraps rolls its stride contribution back and carries
/// into the next one. A rank-0 view yields offset zero exactly once.
pub(crate) struct Offsets<I: IndexTuple> {
    shape: I,
    strides: I,
    index: I,
    offset: isize,
    remaining: isize,
}

impl<I: IndexTuple> Offsets<I> {
    pub(crate) fn new(shape: I, strides: I) -> Self {
        Offsets {
            shape,
            strides,
            index: I::splat(0),
            offset: 0,
            remaining: shape.product(),
        }
    }
}

impl<I: IndexTuple> Iterator for Offsets<I> {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;
        let mut d = I::LEN;
        while d > 0 {
            d -= 1;
            let i = self.index.get(d) + 1;
            if i < self.shape.get(d) {
                self.index.set(d, i);
                self.offset += self.strides.get(d);
                break;
            }
            self.index.set(d, 0);
            self.offset -= self.strides.get(d) * (self.shape.get(d) - 1);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl<I: IndexTuple> ExactSizeIterator for Offsets<I> {}

/// Immutable element iterator in logical row-major order.
pub struct Iter<'a, T, I: IndexTuple> {
    base: NonNull<T>,
    offsets: Offsets<I>,
    marker: PhantomData<&'a T>,
}

impl<'a, T, I: IndexTuple> Iterator for Iter<'a, T, I> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let offset = self.offsets.next()?;
        // SAFETY: the odometer only produces in-bounds element offsets of
        // the view this iterator borrows.
        Some(unsafe { &*self.base.as_ptr().offset(offset) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl<T, I: IndexTuple> ExactSizeIterator for Iter<'_, T, I> {}

/// Mutable element iterator in logical row-major order.
pub struct IterMut<'a, T, I: IndexTuple> {
    base: NonNull<T>,
    offsets: Offsets<I>,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T, I: IndexTuple> Iterator for IterMut<'a, T, I> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        let offset = self.offsets.next()?;
        // SAFETY: in-bounds as in `Iter`. The view's layout is injective,
        // so the odometer never repeats an offset and the handed-out
        // references never alias.
        Some(unsafe { &mut *self.base.as_ptr().offset(offset) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl<T, I: IndexTuple> ExactSizeIterator for IterMut<'_, T, I> {}

/// Iterator of sub-views along the leading dimension.
///
/// All yielded views share one trailing descriptor; only their origins
/// differ.
pub struct OuterIter<'a, T, G: Geometry> {
    base: NonNull<T>,
    stride: isize,
    core: Rc<<G::Sub as Geometry>::Core>,
    next: isize,
    size: isize,
    marker: PhantomData<&'a T>,
}

impl<'a, T, G: Geometry> Iterator for OuterIter<'a, T, G> {
    type Item = ArrayView<'a, T, G::Sub>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.size {
            return None;
        }
        let ptr = offset_ptr(self.base, self.next * self.stride);
        self.next += 1;
        Some(ArrayView::from_parts(ptr, Rc::clone(&self.core)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<T, G: Geometry> ExactSizeIterator for OuterIter<'_, T, G> {}

/// Iterator of exclusive sub-views along the leading dimension.
pub struct OuterIterMut<'a, T, G: Geometry> {
    base: NonNull<T>,
    stride: isize,
    core: Rc<<G::Sub as Geometry>::Core>,
    next: isize,
    size: isize,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T, G: Geometry> Iterator for OuterIterMut<'a, T, G> {
    type Item = ArrayViewMut<'a, T, G::Sub>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.size {
            return None;
        }
        // Rows of an injective layout are pairwise disjoint, so each row
        // can be handed out exclusively while the others are still live.
        let ptr = offset_ptr(self.base, self.next * self.stride);
        self.next += 1;
        Some(ArrayViewMut::from_parts(ptr, Rc::clone(&self.core)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<T, G: Geometry> ExactSizeIterator for OuterIterMut<'_, T, G> {}

impl<T, G: Geometry> ArrayRef<T, G> {
    /// Iterate the elements in logical row-major order.
    pub fn iter(&self) -> Iter<'_, T, G::Index> {
        Iter {
            base: self.ptr,
            offsets: Offsets::new(self.shape(), self.strides()),
            marker: PhantomData,
        }
    }

    /// Iterate the elements mutably in logical row-major order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, G::Index> {
        IterMut {
            base: self.ptr,
            offsets: Offsets::new(self.shape(), self.strides()),
            marker: PhantomData,
        }
    }

    /// Iterate the sub-views along the leading dimension.
    pub fn outer_iter(&self) -> OuterIter<'_, T, G> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        OuterIter {
            base: self.ptr,
            stride: self.core.stride(0),
            core: G::sub_core(&self.core),
            next: 0,
            size: self.core.size(0),
            marker: PhantomData,
        }
    }

    /// Iterate the sub-views along the leading dimension, each exclusive.
    pub fn outer_iter_mut(&mut self) -> OuterIterMut<'_, T, G> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        OuterIterMut {
            base: self.ptr,
            stride: self.core.stride(0),
            core: G::sub_core(&self.core),
            next: 0,
            size: self.core.size(0),
            marker: PhantomData,
        }
    }

    /// Whether the strides are exactly the packed row-major strides of
    /// the shape, making memory order and logical order coincide.
    pub fn is_standard_layout(&self) -> bool {
        self.strides() == compute_strides(self.shape(), Order::RowMajor)
    }

    /// The elements as one contiguous slice, if the view is in standard
    /// layout.
    pub fn as_slice(&self) -> Option<&[T]> {
        if !self.is_standard_layout() {
            return None;
        }
        // SAFETY: standard layout means the view's elements sit
        // contiguously at the origin.
        Some(unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.num_elements() as usize) })
    }

    /// The elements as one contiguous mutable slice, if the view is in
    /// standard layout.
    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if !self.is_standard_layout() {
            return None;
        }
        // SAFETY: as in `as_slice`; exclusivity comes with `&mut self`.
        Some(unsafe {
            std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.num_elements() as usize)
        })
    }
}

impl<'a, T, G: Geometry> IntoIterator for &'a ArrayRef<T, G> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, G::Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, G: Geometry> IntoIterator for &'a mut ArrayRef<T, G> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, G::Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'a, T, G: Geometry> IntoIterator for &'a super::Array<T, G> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, G::Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, G: Geometry> IntoIterator for &'a ArrayView<'_, T, G> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, G::Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, G: Geometry> IntoIterator for &'a mut ArrayViewMut<'_, T, G> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, G::Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

///////////
// Tests //
///////////
