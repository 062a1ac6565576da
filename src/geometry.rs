/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Compile-time view geometry.
//!
//! Every view type in this crate carries a [`Geo`] parameter encoding its
//! rank `N` and its row-major contiguity `C`. The [`Geometry`] trait maps
//! each supported `(N, C)` pair to its index tuple, its descriptor type,
//! and the geometries produced by restructuring: dropping the leading
//! dimension, transposing, and relaxing or asserting contiguity.
//!
//! The contiguity parameter is a count of packed dimensions, not a flag.
//! `C > 0` promises that the last `C` dimensions are packed row-major
//! (the final dimension has stride 1, and each of the `C` trailing strides
//! is the product of the sizes after it). `C < 0` promises the mirror
//! image: the first `|C|` dimensions are packed column-major. `C == 0`
//! promises nothing. The fully packed geometries `C == N` and `C == -N`
//! admit whole-view flattening; everything in between only bounds which
//! casts are allowed.
//!
//! Supported ranks are `0..=6` with every legal contiguity for each rank,
//! enumerated the same way SIMD lane counts are: one impl per supported
//! pair, so an unsupported pair is a compile-time "trait not implemented"
//! error rather than a runtime surprise.

use std::rc::Rc;

use crate::core::{Core, RawCore};
use crate::vector::{IndexTuple, Vector};

/// Type-level geometry token: rank `N`, row-major contiguity `C`.
///
/// `Geo` is never instantiated; it only selects a [`Geometry`] impl.
/// The contiguity defaults to `0` (no guarantee).
pub struct Geo<const N: usize, const C: isize = 0>;

/// Everything the view layer knows about a geometry at compile time.
///
/// Implemented for each supported `(N, C)` pair; see the [module
/// docs](self) for what the contiguity parameter promises.
pub trait Geometry: 'static {
    /// Number of dimensions.
    const RANK: usize;

    /// Row-major contiguity: how many dimensions are packed, and from
    /// which end (positive from the last, negative from the first).
    const RMC: isize;

    /// Index tuple with one component per dimension.
    type Index: IndexTuple;

    /// Descriptor type for views of this geometry.
    type Core: RawCore<Index = Self::Index>;

    /// Geometry of a view with the leading dimension dropped.
    ///
    /// One rank shorter; a row-major contiguity survives capped at the new
    /// rank, a column-major one is lost (the packed dimensions were at the
    /// front, and the front changed). Rank 0 is its own sub-geometry.
    type Sub: Geometry;

    /// Geometry of the fully transposed view: same rank, contiguity
    /// mirrored to the other end.
    type Rev: Geometry<Index = Self::Index, Core = Self::Core>;

    /// Same rank with no contiguity guarantee.
    type Relaxed: Geometry<Index = Self::Index, Core = Self::Core>;

    /// Same rank, fully packed row-major.
    type Full: Geometry<Index = Self::Index, Core = Self::Core>;

    /// Descriptor of a view with the leading dimension dropped: the
    /// trailing shape and strides, sharing the same manager handle.
    fn sub_core(core: &Self::Core) -> Rc<<Self::Sub as Geometry>::Core>;
}

macro_rules! geometries {
    ($(($n:literal, $c:literal) => sub ($sn:literal, $sc:literal), rev $rc:literal;)*) => {
        $(
            impl Geometry for Geo<$n, $c> {
                const RANK: usize = $n;
                const RMC: isize = $c;

                type Index = Vector<isize, $n>;
                type Core = Core<$n>;

                type Sub = Geo<$sn, $sc>;
                type Rev = Geo<$n, $rc>;
                type Relaxed = Geo<$n, 0>;
                type Full = Geo<$n, $n>;

                fn sub_core(core: &Core<$n>) -> Rc<Core<$sn>> {
                    Rc::new(Core::new(
                        core.shape().last(),
                        core.strides().last(),
                        core.manager().cloned(),
                    ))
                }
            }
        )*
    };
}

geometries! {
    (0, 0) => sub (0, 0), rev 0;

    (1, -1) => sub (0, 0), rev 1;
    (1, 0) => sub (0, 0), rev 0;
    (1, 1) => sub (0, 0), rev -1;

    (2, -2) => sub (1, 0), rev 2;
    (2, -1) => sub (1, 0), rev 1;
    (2, 0) => sub (1, 0), rev 0;
    (2, 1) => sub (1, 1), rev -1;
    (2, 2) => sub (1, 1), rev -2;

    (3, -3) => sub (2, 0), rev 3;
    (3, -2) => sub (2, 0), rev 2;
    (3, -1) => sub (2, 0), rev 1;
    (3, 0) => sub (2, 0), rev 0;
    (3, 1) => sub (2, 1), rev -1;
    (3, 2) => sub (2, 2), rev -2;
    (3, 3) => sub (2, 2), rev -3;

    (4, -4) => sub (3, 0), rev 4;
    (4, -3) => sub (3, 0), rev 3;
    (4, -2) => sub (3, 0), rev 2;
    (4, -1) => sub (3, 0), rev 1;
    (4, 0) => sub (3, 0), rev 0;
    (4, 1) => sub (3, 1), rev -1;
    (4, 2) => sub (3, 2), rev -2;
    (4, 3) => sub (3, 3), rev -3;
    (4, 4) => sub (3, 3), rev -4;

    (5, -5) => sub (4, 0), rev 5;
    (5, -4) => sub (4, 0), rev 4;
    (5, -3) => sub (4, 0), rev 3;
    (5, -2) => sub (4, 0), rev 2;
    (5, -1) => sub (4, 0), rev 1;
    (5, 0) => sub (4, 0), rev 0;
    (5, 1) => sub (4, 1), rev -1;
    (5, 2) => sub (4, 2), rev -2;
    (5, 3) => sub (4, 3), rev -3;
    (5, 4) => sub (4, 4), rev -4;
    (5, 5) => sub (4, 4), rev -5;

    (6, -6) => sub (5, 0), rev 6;
    (6, -5) => sub (5, 0), rev 5;
    (6, -4) => sub (5, 0), rev 4;
    (6, -3) => sub (5, 0), rev 3;
    (6, -2) => sub (5, 0), rev 2;
    (6, -1) => sub (5, 0), rev 1;
    (6, 0) => sub (5, 0), rev 0;
    (6, 1) => sub (5, 1), rev -1;
    (6, 2) => sub (5, 2), rev -2;
    (6, 3) => sub (5, 3), rev -3;
    (6, 4) => sub (5, 4), rev -4;
    (6, 5) => sub (5, 5), rev -5;
    (6, 6) => sub (5, 5), rev -6;
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Order, RawCore};

    #[test]
    fn rank_and_contiguity_round_trip() {
        assert_eq!(<Geo<3, 2> as Geometry>::RANK, 3);
        assert_eq!(<Geo<3, 2> as Geometry>::RMC, 2);
        assert_eq!(<Geo<4, -4> as Geometry>::RMC, -4);
        assert_eq!(<Geo<0> as Geometry>::RANK, 0);
    }

    #[test]
    fn sub_geometry_caps_row_major_contiguity() {
        assert_eq!(<<Geo<3, 3> as Geometry>::Sub as Geometry>::RANK, 2);
        assert_eq!(<<Geo<3, 3> as Geometry>::Sub as Geometry>::RMC, 2);
        assert_eq!(<<Geo<3, 1> as Geometry>::Sub as Geometry>::RMC, 1);
        assert_eq!(<<Geo<4, 2> as Geometry>::Sub as Geometry>::RMC, 2);
    }

    #[test]
    fn sub_geometry_drops_column_major_contiguity() {
        assert_eq!(<<Geo<3, -3> as Geometry>::Sub as Geometry>::RMC, 0);
        assert_eq!(<<Geo<2, -1> as Geometry>::Sub as Geometry>::RMC, 0);
    }

    #[test]
    fn reversal_mirrors_contiguity() {
        assert_eq!(<<Geo<2, 2> as Geometry>::Rev as Geometry>::RMC, -2);
        assert_eq!(<<Geo<5, -3> as Geometry>::Rev as Geometry>::RMC, 3);
        assert_eq!(
            <<<Geo<6, 4> as Geometry>::Rev as Geometry>::Rev as Geometry>::RMC,
            4
        );
    }

    #[test]
    fn relaxed_and_full_endpoints() {
        assert_eq!(<<Geo<3, 2> as Geometry>::Relaxed as Geometry>::RMC, 0);
        assert_eq!(<<Geo<3, 2> as Geometry>::Full as Geometry>::RMC, 3);
        assert_eq!(<<Geo<3, -1> as Geometry>::Full as Geometry>::RMC, 3);
    }

    #[test]
    fn rank_zero_is_its_own_sub_geometry() {
        assert_eq!(<<Geo<0> as Geometry>::Sub as Geometry>::RANK, 0);
        assert_eq!(
            <<<Geo<0> as Geometry>::Sub as Geometry>::Sub as Geometry>::RANK,
            0
        );
    }

    #[test]
    fn sub_core_keeps_trailing_dimensions() {
        let core = Core::with_order(Vector::from([2isize, 3, 4]), Order::RowMajor, None);
        let sub = <Geo<3, 3> as Geometry>::sub_core(&core);
        assert_eq!(sub.shape(), [3, 4]);
        assert_eq!(sub.strides(), [4, 1]);
    }
}
