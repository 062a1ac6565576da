/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Multidimensional strided array views with shared ownership.
//!
//! An [`Array`] is a lightweight handle: shape, strides, a data pointer,
//! and a reference-counted [`Manager`] that keeps the storage alive.
//! Copying a handle, slicing out a row, transposing, or reinterpreting
//! contiguity never touches an element; all of those produce new views of
//! the same storage, and the storage is released when the last view
//! drops.
//!
//! Geometry is part of the type. Every view carries a [`Geo<N, C>`]
//! parameter: `N` is the rank and `C` counts how many dimensions are
//! guaranteed packed (from the back for row-major, from the front for
//! column-major). Operations that need packing, like
//! [`flattened`](ArrayRef::flattened), are compile-time errors on views
//! that do not guarantee it; a guarantee can be verified onto a view at
//! runtime with [`dynamic_dimension_cast`](ArrayRef::dynamic_dimension_cast).
//!
//! Because handles share storage freely, mutation is gated: a handle
//! mutates only after proving it is the storage's last one
//! ([`Array::try_deep`]), or through an exclusive borrow
//! ([`ArrayViewMut`]). Reads need no ceremony.
//!
//! ```
//! use ndspan::{Array, Geo, Vector};
//!
//! # fn main() -> Result<(), ndspan::LayoutError> {
//! let data: Vec<f64> = (0..6).map(f64::from).collect();
//! let a = Array::<f64, Geo<2, 2>>::from_vec(Vector::from([2, 3]), data)?;
//! assert_eq!(a.shape(), [2, 3]);
//! assert_eq!(a.strides(), [3, 1]);
//!
//! // Shallow restructuring: no elements move.
//! let t = a.transposed();
//! assert_eq!(t.shape(), [3, 2]);
//! assert_eq!(t.strides(), [1, 3]);
//! assert_eq!(t[[2, 1]], a[[1, 2]]);
//!
//! // Packing guarantees are types; claims are verified at runtime.
//! let packed = a.dynamic_dimension_cast::<Geo<2, 1>>();
//! assert!(!packed.is_empty());
//! assert_eq!(a.flattened().shape(), [6]);
//!
//! // Mutation requires the last handle.
//! drop((t, packed));
//! let mut a = a;
//! a.deep().fill(0.0);
//! assert_eq!(a[[1, 2]], 0.0);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod array;
mod casts;
mod core;
mod error;
mod format;
mod geometry;
mod manager;
mod vector;

pub use crate::array::{
    Array, ArrayRef, ArrayView, ArrayViewMut, Iter, IterMut, OuterIter, OuterIterMut,
};
pub use crate::core::{compute_strides, Core, Order, RawCore};
pub use crate::error::LayoutError;
pub use crate::geometry::{Geo, Geometry};
pub use crate::manager::{CompositeManager, ExternalManager, Manager, OwnedManager};
pub use crate::vector::{IndexTuple, Vector};
