/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Multidimensional strided views.
//!
//! Four types share one behavior carrier:
//!
//! * [`ArrayRef`] holds the data pointer and the shared descriptor. All
//!   view behavior lives here; the other three deref to it.
//! * [`Array`] owns a handle to reference-counted storage. Shallow to
//!   copy, and mutable only through [`Array::try_deep`] once the handle
//!   is provably the last one.
//! * [`ArrayView`] borrows storage immutably for a lifetime.
//! * [`ArrayViewMut`] borrows storage exclusively and is the only safe
//!   route to `&mut ArrayRef` besides `try_deep`.
//!
//! # Layout invariant
//!
//! Mutable access relies on the view's layout being injective: distinct
//! in-bounds indices address distinct elements. Every safe constructor
//! either produces a packed layout or validates the strides; the unsafe
//! constructors make injectivity part of their contract.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::NonNull;
use std::rc::Rc;

use crate::core::RawCore;
use crate::geometry::Geometry;
use crate::manager::Manager;
use crate::vector::Vector;

mod construct;
mod iter;
mod ops;

pub use iter::{Iter, IterMut, OuterIter, OuterIterMut};

/// Move `ptr` by `offset` elements without leaving provenance behind.
///
/// Uses wrapping arithmetic so that the pointers of empty views, which are
/// never dereferenced, may wander outside any allocation.
pub(crate) fn offset_ptr<T>(ptr: NonNull<T>, offset: isize) -> NonNull<T> {
    match NonNull::new(ptr.as_ptr().wrapping_offset(offset)) {
        Some(ptr) => ptr,
        // Only reachable through an empty view, whose pointer is never read.
        None => NonNull::dangling(),
    }
}

/// A strided view of element type `T` and geometry `G`.
///
/// `ArrayRef` never appears by value in user code; it is reached by
/// dereferencing an [`Array`] or one of the borrowed views. Methods on
/// `&self` read, methods on `&mut self` write, and the owning and
/// borrowing wrappers control which of the two can be reached.
pub struct ArrayRef<T, G: Geometry> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) core: Rc<G::Core>,
    pub(crate) marker: PhantomData<*mut T>,
}

impl<T, G: Geometry> ArrayRef<T, G> {
    pub(crate) fn from_parts(ptr: NonNull<T>, core: Rc<G::Core>) -> Self {
        ArrayRef {
            ptr,
            core,
            marker: PhantomData,
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        G::RANK
    }

    /// Row-major contiguity guaranteed by the geometry.
    pub fn contiguity(&self) -> isize {
        G::RMC
    }

    /// The shape tuple.
    pub fn shape(&self) -> G::Index {
        self.core.shape()
    }

    /// The stride tuple, in elements.
    pub fn strides(&self) -> G::Index {
        self.core.strides()
    }

    /// Size of dimension `d`.
    ///
    /// # Panics
    ///
    /// Panics if `d >= rank()`.
    pub fn size(&self, d: usize) -> isize {
        self.core.size(d)
    }

    /// Stride of dimension `d`, in elements.
    ///
    /// # Panics
    ///
    /// Panics if `d >= rank()`.
    pub fn stride(&self, d: usize) -> isize {
        self.core.stride(d)
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> isize {
        self.core.num_elements()
    }

    /// `true` iff the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    /// Pointer to the view origin.
    ///
    /// Dangling for empty views; only in-bounds elements may be read
    /// through it.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the view origin.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The manager keeping the storage alive, if the view has one.
    ///
    /// Borrowed views over slices have none; their storage is kept alive
    /// by the borrow itself.
    pub fn manager(&self) -> Option<&Rc<dyn Manager>> {
        self.core.manager()
    }

    /// The element at `index`, or `None` if out of bounds.
    pub fn get(&self, index: G::Index) -> Option<&T> {
        if !self.core.in_bounds(index) {
            return None;
        }
        // SAFETY: the index is in bounds, so the offset addresses a live
        // element of the view.
        Some(unsafe { &*self.ptr.as_ptr().offset(self.core.offset_of(index)) })
    }

    /// The element at `index` mutably, or `None` if out of bounds.
    pub fn get_mut(&mut self, index: G::Index) -> Option<&mut T> {
        if !self.core.in_bounds(index) {
            return None;
        }
        // SAFETY: as in `get`; exclusivity comes with `&mut self`.
        Some(unsafe { &mut *self.ptr.as_ptr().offset(self.core.offset_of(index)) })
    }

    /// The element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds.
    pub unsafe fn get_unchecked(&self, index: G::Index) -> &T {
        debug_assert!(
            self.core.in_bounds(index),
            "index {index:?} is out of bounds (shape: {:?})",
            self.shape()
        );
        // SAFETY: the caller promises an in-bounds index.
        unsafe { &*self.ptr.as_ptr().offset(self.core.offset_of(index)) }
    }

    /// The element at `index` mutably, without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds.
    pub unsafe fn get_unchecked_mut(&mut self, index: G::Index) -> &mut T {
        debug_assert!(
            self.core.in_bounds(index),
            "index {index:?} is out of bounds (shape: {:?})",
            self.shape()
        );
        // SAFETY: the caller promises an in-bounds index.
        unsafe { &mut *self.ptr.as_ptr().offset(self.core.offset_of(index)) }
    }

    /// The view with the leading dimension fixed to `i`.
    ///
    /// Requires rank at least 2; use indexing or [`iter`](Self::iter) to
    /// reach the elements of a rank-1 view.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn sub(&self, i: isize) -> ArrayView<'_, T, G::Sub> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        match self.get_sub(i) {
            Some(view) => view,
            None => panic!("row {i} is out of bounds (size: {})", self.core.size(0)),
        }
    }

    /// The view with the leading dimension fixed to `i`, or `None` if `i`
    /// is out of bounds.
    pub fn get_sub(&self, i: isize) -> Option<ArrayView<'_, T, G::Sub>> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        if i < 0 || i >= self.core.size(0) {
            return None;
        }
        // SAFETY: `i` is in bounds for the leading dimension.
        Some(unsafe { self.sub_view_unchecked(i) })
    }

    /// The view with the leading dimension fixed to `i`, without a bounds
    /// check.
    ///
    /// # Safety
    ///
    /// `i` must be in bounds for the leading dimension.
    pub unsafe fn sub_unchecked(&self, i: isize) -> ArrayView<'_, T, G::Sub> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        // SAFETY: forwarded caller contract.
        unsafe { self.sub_view_unchecked(i) }
    }

    /// The view with the leading dimension fixed to `i`, mutable.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn sub_mut(&mut self, i: isize) -> ArrayViewMut<'_, T, G::Sub> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        let size = self.core.size(0);
        match self.get_sub_mut(i) {
            Some(view) => view,
            None => panic!("row {i} is out of bounds (size: {size})"),
        }
    }

    /// The view with the leading dimension fixed to `i`, mutable, or
    /// `None` if `i` is out of bounds.
    pub fn get_sub_mut(&mut self, i: isize) -> Option<ArrayViewMut<'_, T, G::Sub>> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        if i < 0 || i >= self.core.size(0) {
            return None;
        }
        let ptr = offset_ptr(self.ptr, i * self.core.stride(0));
        Some(ArrayViewMut::from_parts(ptr, G::sub_core(&self.core)))
    }

    // No rank requirement; generic callers guard the rank themselves.
    pub(crate) unsafe fn sub_view_unchecked(&self, i: isize) -> ArrayView<'_, T, G::Sub> {
        debug_assert!(G::RANK >= 1, "rank-0 views have no sub-views");
        debug_assert!(
            i >= 0 && i < self.core.size(0),
            "row {i} is out of bounds (size: {})",
            self.core.size(0)
        );
        let ptr = offset_ptr(self.ptr, i * self.core.stride(0));
        ArrayView::from_parts(ptr, G::sub_core(&self.core))
    }

    /// A borrowed view of the whole array.
    pub fn view(&self) -> ArrayView<'_, T, G> {
        ArrayView::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// An exclusive borrowed view of the whole array.
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, G> {
        ArrayViewMut::from_parts(self.ptr, Rc::clone(&self.core))
    }
}

impl<T, G, const N: usize> Index<[isize; N]> for ArrayRef<T, G>
where
    G: Geometry<Index = Vector<isize, N>>,
{
    type Output = T;

    fn index(&self, index: [isize; N]) -> &T {
        let index = Vector::from(index);
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index {index:?} is out of bounds (shape: {:?})",
                self.shape()
            ),
        }
    }
}

impl<T, G, const N: usize> IndexMut<[isize; N]> for ArrayRef<T, G>
where
    G: Geometry<Index = Vector<isize, N>>,
{
    fn index_mut(&mut self, index: [isize; N]) -> &mut T {
        let index = Vector::from(index);
        let shape = self.shape();
        match self.get_mut(index) {
            Some(element) => element,
            None => panic!("index {index:?} is out of bounds (shape: {shape:?})"),
        }
    }
}

impl<T, G> Index<isize> for ArrayRef<T, G>
where
    G: Geometry<Index = Vector<isize, 1>>,
{
    type Output = T;

    fn index(&self, i: isize) -> &T {
        &self[[i]]
    }
}

impl<T, G> IndexMut<isize> for ArrayRef<T, G>
where
    G: Geometry<Index = Vector<isize, 1>>,
{
    fn index_mut(&mut self, i: isize) -> &mut T {
        &mut self[[i]]
    }
}

/// Shallow equality: same origin pointer, shape, and strides.
///
/// Two views compare equal exactly when they are views of the same
/// elements in the same arrangement, regardless of element values.
impl<T, G: Geometry> PartialEq for ArrayRef<T, G> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.shape() == other.shape() && self.strides() == other.strides()
    }
}

impl<T, G: Geometry> Eq for ArrayRef<T, G> {}

/// An owning handle to reference-counted array storage.
///
/// Cloning is shallow: both handles see the same elements. Reads go
/// through [`Deref`] to [`ArrayRef`]; writes must first prove the handle
/// unique via [`try_deep`](Self::try_deep) or [`deep`](Self::deep), which
/// is what makes shallow sharing sound.
pub struct Array<T, G: Geometry> {
    inner: ArrayRef<T, G>,
}

impl<T, G: Geometry> Array<T, G> {
    pub(crate) fn from_ref(inner: ArrayRef<T, G>) -> Self {
        Array { inner }
    }

    /// Whether this handle is provably the only path to the storage.
    ///
    /// True when no other view shares the descriptor and the manager
    /// reports that arrays are the storage's only owners.
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.inner.core) == 1 && self.inner.core.manager_unique()
    }

    /// Mutable access to the view, if this handle is unique.
    pub fn try_deep(&mut self) -> Option<&mut ArrayRef<T, G>> {
        if self.is_unique() {
            Some(&mut self.inner)
        } else {
            None
        }
    }

    /// Mutable access to the view.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not unique.
    pub fn deep(&mut self) -> &mut ArrayRef<T, G> {
        match self.is_unique() {
            true => &mut self.inner,
            false => panic!("mutation requires a unique handle (shallow copies or views exist)"),
        }
    }

    /// Mutable access to the view without the uniqueness check.
    ///
    /// # Safety
    ///
    /// No other handle or view may access the storage while the returned
    /// reference (or anything derived from it) is live.
    pub unsafe fn deep_unchecked(&mut self) -> &mut ArrayRef<T, G> {
        &mut self.inner
    }

    /// An exclusive borrowed view, if this handle is unique.
    pub fn try_view_mut(&mut self) -> Option<ArrayViewMut<'_, T, G>> {
        self.try_deep().map(|array| array.view_mut())
    }
}

impl<T, G: Geometry> Deref for Array<T, G> {
    type Target = ArrayRef<T, G>;

    fn deref(&self) -> &ArrayRef<T, G> {
        &self.inner
    }
}

/// Shallow copy: the new handle shares the storage and the descriptor.
impl<T, G: Geometry> Clone for Array<T, G> {
    fn clone(&self) -> Self {
        Array {
            inner: ArrayRef::from_parts(self.inner.ptr, Rc::clone(&self.inner.core)),
        }
    }
}

/// The empty array.
impl<T, G: Geometry> Default for Array<T, G> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, G: Geometry> PartialEq for Array<T, G> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, G: Geometry> Eq for Array<T, G> {}

/// An immutably borrowed view.
///
/// Acts like `&'a ArrayRef<T, G>` with its own shape and strides.
pub struct ArrayView<'a, T, G: Geometry> {
    inner: ArrayRef<T, G>,
    marker: PhantomData<&'a [T]>,
}

impl<'a, T, G: Geometry> ArrayView<'a, T, G> {
    pub(crate) fn from_parts(ptr: NonNull<T>, core: Rc<G::Core>) -> Self {
        ArrayView {
            inner: ArrayRef::from_parts(ptr, core),
            marker: PhantomData,
        }
    }

    /// The view with the leading dimension fixed to `i`, keeping the
    /// borrow lifetime `'a`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn into_sub(self, i: isize) -> ArrayView<'a, T, G::Sub> {
        const {
            assert!(G::RANK >= 2, "sub-views require rank at least 2");
        }
        assert!(
            i >= 0 && i < self.size(0),
            "row {i} is out of bounds (size: {})",
            self.size(0)
        );
        let ptr = offset_ptr(self.inner.ptr, i * self.stride(0));
        ArrayView::from_parts(ptr, G::sub_core(&self.inner.core))
    }

    /// Promote the borrow to an exclusive one.
    ///
    /// # Safety
    ///
    /// For the rest of `'a` nothing else may access the viewed elements,
    /// and the layout must be injective.
    pub unsafe fn assume_mut(self) -> ArrayViewMut<'a, T, G> {
        ArrayViewMut {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T, G: Geometry> Deref for ArrayView<'_, T, G> {
    type Target = ArrayRef<T, G>;

    fn deref(&self) -> &ArrayRef<T, G> {
        &self.inner
    }
}

impl<T, G: Geometry> Clone for ArrayView<'_, T, G> {
    fn clone(&self) -> Self {
        ArrayView {
            inner: ArrayRef::from_parts(self.inner.ptr, Rc::clone(&self.inner.core)),
            marker: PhantomData,
        }
    }
}

impl<T, G: Geometry> PartialEq for ArrayView<'_, T, G> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, G: Geometry> Eq for ArrayView<'_, T, G> {}

/// An exclusively borrowed view.
///
/// The only safe route to `&mut ArrayRef` besides [`Array::try_deep`];
/// dereferencing mutably unlocks the whole write surface.
pub struct ArrayViewMut<'a, T, G: Geometry> {
    inner: ArrayRef<T, G>,
    marker: PhantomData<&'a mut [T]>,
}

impl<'a, T, G: Geometry> ArrayViewMut<'a, T, G> {
    pub(crate) fn from_parts(ptr: NonNull<T>, core: Rc<G::Core>) -> Self {
        ArrayViewMut {
            inner: ArrayRef::from_parts(ptr, core),
            marker: PhantomData,
        }
    }

    /// Borrow the view exclusively for a shorter lifetime.
    pub fn reborrow(&mut self) -> ArrayViewMut<'_, T, G> {
        ArrayViewMut::from_parts(self.inner.ptr, Rc::clone(&self.inner.core))
    }

    /// Demote the borrow to a shared one.
    pub fn into_view(self) -> ArrayView<'a, T, G> {
        ArrayView {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T, G: Geometry> Deref for ArrayViewMut<'_, T, G> {
    type Target = ArrayRef<T, G>;

    fn deref(&self) -> &ArrayRef<T, G> {
        &self.inner
    }
}

impl<T, G: Geometry> DerefMut for ArrayViewMut<'_, T, G> {
    fn deref_mut(&mut self) -> &mut ArrayRef<T, G> {
        &mut self.inner
    }
}

impl<T, G: Geometry> PartialEq for ArrayViewMut<'_, T, G> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T, G: Geometry> Eq for ArrayViewMut<'_, T, G> {}

///////////
// Tests //
///////////
