/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Nested rendering of views.
//!
//! Views print as nested lists in logical order, one bracket level per
//! dimension, whatever the memory layout. Rank-1 rows stay on one line;
//! at rank 2 and above each sub-view starts on its own line, indented by
//! its nesting depth, so a (2, 3) view renders as
//!
//! ```text
//! [[a, b, c],
//! [d, e, f]]
//! ```
//!
//! `Debug` and `Display` differ only in how the elements themselves are
//! rendered.

use std::fmt;
use std::ptr::NonNull;

use crate::array::{offset_ptr, Array, ArrayRef, ArrayView, ArrayViewMut};
use crate::core::RawCore;
use crate::geometry::Geometry;

// Recurses one geometry level per dimension; the rank-0 geometry is its
// own sub-geometry, which closes the instantiation chain. `level` is the
// nesting depth of the current bracket and sets the indentation of the
// sub-views it separates.
fn fmt_nested<T, G: Geometry>(
    ptr: NonNull<T>,
    core: &G::Core,
    f: &mut fmt::Formatter<'_>,
    level: usize,
    item: fn(&T, &mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    if G::RANK == 0 {
        // SAFETY: rank-0 views always hold exactly one element at the
        // origin.
        let element = unsafe { &*ptr.as_ptr() };
        return item(element, f);
    }
    f.write_str("[")?;
    if G::RANK == 1 {
        for i in 0..core.size(0) {
            if i > 0 {
                f.write_str(", ")?;
            }
            // SAFETY: `i` is in bounds for the single dimension.
            let element = unsafe { &*ptr.as_ptr().offset(i * core.stride(0)) };
            item(element, f)?;
        }
    } else {
        let sub = G::sub_core(core);
        for i in 0..core.size(0) {
            if i > 0 {
                f.write_str(",\n")?;
                for _ in 0..level {
                    f.write_str(" ")?;
                }
            }
            fmt_nested::<T, G::Sub>(
                offset_ptr(ptr, i * core.stride(0)),
                &sub,
                f,
                level + 1,
                item,
            )?;
        }
    }
    f.write_str("]")
}

impl<T: fmt::Debug, G: Geometry> fmt::Debug for ArrayRef<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_nested::<T, G>(self.ptr, &self.core, f, 0, |element, f| {
            fmt::Debug::fmt(element, f)
        })
    }
}

impl<T: fmt::Display, G: Geometry> fmt::Display for ArrayRef<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_nested::<T, G>(self.ptr, &self.core, f, 0, |element, f| {
            fmt::Display::fmt(element, f)
        })
    }
}

impl<T: fmt::Debug, G: Geometry> fmt::Debug for Array<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display, G: Geometry> fmt::Display for Array<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: fmt::Debug, G: Geometry> fmt::Debug for ArrayView<'_, T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display, G: Geometry> fmt::Display for ArrayView<'_, T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: fmt::Debug, G: Geometry> fmt::Debug for ArrayViewMut<'_, T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display, G: Geometry> fmt::Display for ArrayViewMut<'_, T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

///////////
// Tests //
///////////
