/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Restructuring casts.
//!
//! Everything here produces a new view of the same elements: no element
//! is read, written, or copied. Casts that only reinterpret the geometry
//! share the source descriptor; casts that rearrange dimensions build a
//! new descriptor over the same manager handle.
//!
//! Each cast comes in up to three receivers: on [`ArrayRef`] producing a
//! borrowed [`ArrayView`] (through any handle), a `_mut` sibling
//! producing an [`ArrayViewMut`] (through an exclusive handle), and on
//! [`Array`] producing another owning, shallowly shared [`Array`].

use std::ptr::NonNull;
use std::rc::Rc;

use num_complex::Complex;

use crate::array::{offset_ptr, Array, ArrayRef, ArrayView, ArrayViewMut};
use crate::core::RawCore;
use crate::geometry::{Geo, Geometry};
use crate::vector::IndexTuple;

/// Whether `strides` satisfy a contiguity claim of `rmc` packed
/// dimensions over `shape`.
///
/// Positive claims are checked from the last dimension inwards, negative
/// claims from the first dimension outwards; in both directions each
/// checked stride must equal the product of the sizes already covered.
pub(crate) fn contiguity_holds<I: IndexTuple>(shape: I, strides: I, rmc: isize) -> bool {
    let mut acc = 1isize;
    if rmc >= 0 {
        for d in (I::LEN - rmc as usize..I::LEN).rev() {
            if strides.get(d) != acc {
                return false;
            }
            acc *= shape.get(d);
        }
    } else {
        for d in 0..(-rmc) as usize {
            if strides.get(d) != acc {
                return false;
            }
            acc *= shape.get(d);
        }
    }
    true
}

fn doubled<I: IndexTuple>(strides: I) -> I {
    let mut doubled = strides;
    for d in 0..I::LEN {
        doubled.set(d, strides.get(d) * 2);
    }
    doubled
}

// Descriptor of `core` with its trailing dimensions merged into the last
// dimension of the `G2::RANK`-dimensional result. The callers' const
// assertions guarantee the merged dimensions are packed row-major, which
// is what makes the unit stride of the merged dimension correct.
fn merged_core<G: Geometry, G2: Geometry>(core: &G::Core) -> G2::Core {
    let shape = core.shape();
    let strides = core.strides();
    let nf = G2::RANK;
    let mut merged_shape = <G2::Index as IndexTuple>::splat(0);
    let mut merged_strides = <G2::Index as IndexTuple>::splat(0);
    for d in 0..nf - 1 {
        merged_shape.set(d, shape.get(d));
        merged_strides.set(d, strides.get(d));
    }
    let mut tail = 1isize;
    for d in nf - 1..G::RANK {
        tail *= shape.get(d);
    }
    merged_shape.set(nf - 1, tail);
    merged_strides.set(nf - 1, 1);
    <G2::Core as RawCore>::new(merged_shape, merged_strides, core.manager().cloned())
}

macro_rules! flatten_contract {
    ($g:ident, $g2:ident) => {
        const {
            assert!(
                $g2::RANK >= 1 && $g2::RANK <= $g::RANK,
                "flattening merges trailing dimensions and cannot raise the rank"
            );
            assert!(
                $g::RMC >= 0 && $g::RMC + $g2::RANK as isize - $g::RANK as isize >= 1,
                "the merged dimensions must be packed row-major"
            );
            assert!(
                $g2::RMC == $g::RMC + $g2::RANK as isize - $g::RANK as isize,
                "the result keeps exactly the packed dimensions that survive the merge"
            );
        }
    };
}

impl<T, G: Geometry> ArrayRef<T, G> {
    /// The view with all dimensions reversed.
    ///
    /// Shape and strides are reversed together, so `t[[j, i]]` addresses
    /// the same element as `self[[i, j]]`. A contiguity guarantee moves
    /// to the other end: row-major packing becomes column-major packing.
    pub fn transposed(&self) -> ArrayView<'_, T, G::Rev> {
        let core = <G::Core as RawCore>::new(
            self.shape().reversed(),
            self.strides().reversed(),
            self.manager().cloned(),
        );
        ArrayView::from_parts(self.ptr, Rc::new(core))
    }

    /// The view with all dimensions reversed, mutable.
    pub fn transposed_mut(&mut self) -> ArrayViewMut<'_, T, G::Rev> {
        let core = <G::Core as RawCore>::new(
            self.shape().reversed(),
            self.strides().reversed(),
            self.manager().cloned(),
        );
        ArrayViewMut::from_parts(self.ptr, Rc::new(core))
    }

    /// The view with dimensions rearranged so that dimension `d` of the
    /// result is dimension `order[d]` of `self`.
    ///
    /// An arbitrary permutation can break any packing, so the result
    /// carries no contiguity guarantee; reclaim one afterwards with
    /// [`dynamic_dimension_cast`](Self::dynamic_dimension_cast).
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of the dimensions.
    pub fn permuted_axes(&self, order: G::Index) -> ArrayView<'_, T, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape().permuted(order),
            self.strides().permuted(order),
            self.manager().cloned(),
        );
        ArrayView::from_parts(self.ptr, Rc::new(core))
    }

    /// The view with dimensions rearranged, mutable.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of the dimensions.
    pub fn permuted_axes_mut(&mut self, order: G::Index) -> ArrayViewMut<'_, T, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape().permuted(order),
            self.strides().permuted(order),
            self.manager().cloned(),
        );
        ArrayViewMut::from_parts(self.ptr, Rc::new(core))
    }

    /// The same view with its contiguity guarantee dropped entirely.
    pub fn relaxed(&self) -> ArrayView<'_, T, G::Relaxed> {
        ArrayView::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view with its contiguity guarantee dropped, mutable.
    pub fn relaxed_mut(&mut self) -> ArrayViewMut<'_, T, G::Relaxed> {
        ArrayViewMut::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view under a weaker contiguity guarantee `G2`.
    ///
    /// Only weakening is allowed: the target must promise at most what
    /// `G` already promises, from the same end. Anything else is a
    /// compile-time error; strengthening goes through
    /// [`dynamic_dimension_cast`](Self::dynamic_dimension_cast) instead.
    pub fn relax<G2>(&self) -> ArrayView<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        const {
            assert!(
                (G2::RMC >= 0 && G::RMC >= G2::RMC) || (G2::RMC <= 0 && G::RMC <= G2::RMC),
                "relaxing may only weaken a contiguity guarantee"
            );
        }
        ArrayView::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view under a weaker contiguity guarantee, mutable.
    pub fn relax_mut<G2>(&mut self) -> ArrayViewMut<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        const {
            assert!(
                (G2::RMC >= 0 && G::RMC >= G2::RMC) || (G2::RMC <= 0 && G::RMC <= G2::RMC),
                "relaxing may only weaken a contiguity guarantee"
            );
        }
        ArrayViewMut::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view under the contiguity guarantee `G2`, unchecked.
    ///
    /// # Safety
    ///
    /// The strides must actually satisfy `G2`'s claim. Later operations
    /// (flattening in particular) trust the claim and read memory based
    /// on it.
    pub unsafe fn static_dimension_cast<G2>(&self) -> ArrayView<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        ArrayView::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view under the contiguity guarantee `G2`, unchecked,
    /// mutable.
    ///
    /// # Safety
    ///
    /// As for [`static_dimension_cast`](Self::static_dimension_cast).
    pub unsafe fn static_dimension_cast_mut<G2>(&mut self) -> ArrayViewMut<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        ArrayViewMut::from_parts(self.ptr, Rc::clone(&self.core))
    }

    /// The same view under the contiguity guarantee `G2`, verified
    /// against the actual strides.
    ///
    /// If the strides satisfy `G2`'s claim the result shares this view's
    /// descriptor; otherwise it is the empty view, distinguishable by
    /// [`is_empty`](Self::is_empty). A view that already has no elements
    /// can satisfy a claim, in which case success and failure are
    /// indistinguishable through `is_empty`; both outcomes are equally
    /// usable, since either way the result holds nothing.
    pub fn dynamic_dimension_cast<G2>(&self) -> ArrayView<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        if contiguity_holds(self.shape(), self.strides(), G2::RMC) {
            ArrayView::from_parts(self.ptr, Rc::clone(&self.core))
        } else {
            ArrayView::from_parts(NonNull::dangling(), Rc::new(<G::Core as RawCore>::zeroed()))
        }
    }

    /// The same view under the contiguity guarantee `G2`, verified,
    /// mutable. Empty on failure.
    pub fn dynamic_dimension_cast_mut<G2>(&mut self) -> ArrayViewMut<'_, T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        if contiguity_holds(self.shape(), self.strides(), G2::RMC) {
            ArrayViewMut::from_parts(self.ptr, Rc::clone(&self.core))
        } else {
            ArrayViewMut::from_parts(NonNull::dangling(), Rc::new(<G::Core as RawCore>::zeroed()))
        }
    }

    /// The view with trailing dimensions merged down to rank `G2::RANK`.
    ///
    /// The merged dimensions must be covered by the row-major packing
    /// guarantee, which makes their memory order and logical order
    /// coincide; the merged dimension then has unit stride and the size
    /// product of the dimensions it replaces. The result geometry keeps
    /// exactly the packed dimensions that survive the merge. A request
    /// the guarantee cannot support is a compile-time error; verify the
    /// packing first with a dynamic cast when the geometry is weaker.
    pub fn flatten<G2: Geometry>(&self) -> ArrayView<'_, T, G2> {
        flatten_contract!(G, G2);
        ArrayView::from_parts(self.ptr, Rc::new(merged_core::<G, G2>(&self.core)))
    }

    /// The view with trailing dimensions merged, mutable.
    pub fn flatten_mut<G2: Geometry>(&mut self) -> ArrayViewMut<'_, T, G2> {
        flatten_contract!(G, G2);
        ArrayViewMut::from_parts(self.ptr, Rc::new(merged_core::<G, G2>(&self.core)))
    }

    /// The fully packed view reshaped to rank 1.
    ///
    /// Shorthand for [`flatten`](Self::flatten) to `Geo<1, 1>`, which
    /// requires full row-major packing.
    pub fn flattened(&self) -> ArrayView<'_, T, Geo<1, 1>> {
        self.flatten::<Geo<1, 1>>()
    }

    /// The fully packed view reshaped to rank 1, mutable.
    pub fn flattened_mut(&mut self) -> ArrayViewMut<'_, T, Geo<1, 1>> {
        self.flatten_mut::<Geo<1, 1>>()
    }
}

// Component views of complex elements. `Complex<U>` is repr(C), a real
// followed by an imaginary `U`, so the storage reads as `U`s at twice the
// stride, offset by one for the imaginary half.
impl<U, G: Geometry> ArrayRef<Complex<U>, G> {
    /// View of the real components: same shape, strides doubled.
    ///
    /// The components interleave in memory, so the result carries no
    /// contiguity guarantee.
    pub fn real(&self) -> ArrayView<'_, U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        ArrayView::from_parts(self.ptr.cast(), Rc::new(core))
    }

    /// View of the real components, mutable.
    pub fn real_mut(&mut self) -> ArrayViewMut<'_, U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        ArrayViewMut::from_parts(self.ptr.cast(), Rc::new(core))
    }

    /// View of the imaginary components: same shape, strides doubled.
    pub fn imag(&self) -> ArrayView<'_, U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        ArrayView::from_parts(offset_ptr(self.ptr.cast(), 1), Rc::new(core))
    }

    /// View of the imaginary components, mutable.
    pub fn imag_mut(&mut self) -> ArrayViewMut<'_, U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        ArrayViewMut::from_parts(offset_ptr(self.ptr.cast(), 1), Rc::new(core))
    }
}

// Owning versions: same casts, but the result is another shallowly
// shared handle and so outlives the source. While both handles are live
// neither is unique.
impl<T, G: Geometry> Array<T, G> {
    /// An owning handle on the transposed view.
    pub fn transposed(&self) -> Array<T, G::Rev> {
        let core = <G::Core as RawCore>::new(
            self.shape().reversed(),
            self.strides().reversed(),
            self.manager().cloned(),
        );
        Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::new(core)))
    }

    /// An owning handle on the permuted view.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of the dimensions.
    pub fn permuted_axes(&self, order: G::Index) -> Array<T, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape().permuted(order),
            self.strides().permuted(order),
            self.manager().cloned(),
        );
        Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::new(core)))
    }

    /// An owning handle with the contiguity guarantee dropped.
    pub fn relaxed(&self) -> Array<T, G::Relaxed> {
        Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::clone(&self.core)))
    }

    /// An owning handle under a weaker contiguity guarantee `G2`.
    pub fn relax<G2>(&self) -> Array<T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        const {
            assert!(
                (G2::RMC >= 0 && G::RMC >= G2::RMC) || (G2::RMC <= 0 && G::RMC <= G2::RMC),
                "relaxing may only weaken a contiguity guarantee"
            );
        }
        Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::clone(&self.core)))
    }

    /// An owning handle under the contiguity guarantee `G2`, unchecked.
    ///
    /// # Safety
    ///
    /// The strides must actually satisfy `G2`'s claim.
    pub unsafe fn static_dimension_cast<G2>(&self) -> Array<T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::clone(&self.core)))
    }

    /// An owning handle under the contiguity guarantee `G2`, verified.
    /// The empty array on failure.
    pub fn dynamic_dimension_cast<G2>(&self) -> Array<T, G2>
    where
        G2: Geometry<Index = G::Index, Core = G::Core>,
    {
        if contiguity_holds(self.shape(), self.strides(), G2::RMC) {
            Array::from_ref(ArrayRef::from_parts(self.ptr, Rc::clone(&self.core)))
        } else {
            Array::from_ref(ArrayRef::from_parts(
                NonNull::dangling(),
                Rc::new(<G::Core as RawCore>::zeroed()),
            ))
        }
    }

    /// An owning handle with trailing dimensions merged down to rank
    /// `G2::RANK`.
    pub fn flatten<G2: Geometry>(&self) -> Array<T, G2> {
        flatten_contract!(G, G2);
        Array::from_ref(ArrayRef::from_parts(
            self.ptr,
            Rc::new(merged_core::<G, G2>(&self.core)),
        ))
    }

    /// An owning handle on the view reshaped to rank 1.
    pub fn flattened(&self) -> Array<T, Geo<1, 1>> {
        self.flatten::<Geo<1, 1>>()
    }
}

impl<U, G: Geometry> Array<Complex<U>, G> {
    /// An owning handle on the real components.
    pub fn real(&self) -> Array<U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        Array::from_ref(ArrayRef::from_parts(self.ptr.cast(), Rc::new(core)))
    }

    /// An owning handle on the imaginary components.
    pub fn imag(&self) -> Array<U, G::Relaxed> {
        let core = <G::Core as RawCore>::new(
            self.shape(),
            doubled(self.strides()),
            self.manager().cloned(),
        );
        Array::from_ref(ArrayRef::from_parts(
            offset_ptr(self.ptr.cast(), 1),
            Rc::new(core),
        ))
    }
}

///////////
// Tests //
///////////
