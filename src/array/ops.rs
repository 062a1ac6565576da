/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Whole-view element operations.
//!
//! Everything here works element-by-element in logical order, with a
//! contiguous fast path when the layout permits. These are the deep
//! counterparts to the shallow copies and casts: they touch values, not
//! descriptors.

use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use crate::geometry::Geometry;

use super::{Array, ArrayRef};

impl<T, G: Geometry> ArrayRef<T, G> {
    /// Overwrite every element with a clone of `value`.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        if let Some(slice) = self.as_mut_slice() {
            slice.fill(value);
            return;
        }
        for element in self.iter_mut() {
            *element = value.clone();
        }
    }

    /// Apply `f` to every element in place, in logical order.
    pub fn map_inplace(&mut self, mut f: impl FnMut(&mut T)) {
        for element in self.iter_mut() {
            f(element);
        }
    }

    /// Copy every element of `src` into `self`.
    ///
    /// The source may have any geometry of the same rank; elements are
    /// matched up in logical order, so copying from a transposed view
    /// transposes the values.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn assign<G2>(&mut self, src: &ArrayRef<T, G2>)
    where
        T: Clone,
        G2: Geometry<Index = G::Index>,
    {
        assert!(
            self.shape() == src.shape(),
            "shape mismatch in assignment: {:?} vs {:?}",
            self.shape(),
            src.shape()
        );
        if let Some(from) = src.as_slice() {
            if let Some(to) = self.as_mut_slice() {
                to.clone_from_slice(from);
                return;
            }
        }
        for (to, from) in self.iter_mut().zip(src.iter()) {
            *to = from.clone();
        }
    }

    /// A deep copy with freshly allocated, packed row-major storage.
    ///
    /// The result owns its elements and is unique, whatever the layout or
    /// sharing state of `self`. Not named `to_owned`: on the wrapper
    /// types that would resolve to the std `ToOwned` blanket impl (a
    /// shallow clone) instead of reaching this method through deref.
    pub fn to_dense(&self) -> Array<T, G::Full>
    where
        T: Clone + 'static,
    {
        let data: Vec<T> = self.iter().cloned().collect();
        match Array::from_vec(self.shape(), data) {
            Ok(array) => array,
            // The shape was validated when this view was built.
            Err(_) => unreachable!(),
        }
    }
}

macro_rules! scalar_assign {
    ($op:ident :: $method:ident) => {
        impl<T, G> $op<T> for ArrayRef<T, G>
        where
            T: $op<T> + Copy,
            G: Geometry,
        {
            fn $method(&mut self, rhs: T) {
                if let Some(slice) = self.as_mut_slice() {
                    for element in slice {
                        element.$method(rhs);
                    }
                    return;
                }
                for element in self.iter_mut() {
                    element.$method(rhs);
                }
            }
        }
    };
}

scalar_assign!(AddAssign::add_assign);
scalar_assign!(SubAssign::sub_assign);
scalar_assign!(MulAssign::mul_assign);
scalar_assign!(DivAssign::div_assign);

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use crate::{Array, ArrayView, ArrayViewMut, Geo, Vector};

    #[test]
    fn fill_covers_packed_and_strided_views() {
        let mut a = Array::<i32, Geo<2, 2>>::allocate(Vector::from([2, 3])).unwrap();
        a.deep().fill(7);
        assert!(a.iter().all(|&v| v == 7));

        let mut data = [0i32; 6];
        let mut v = ArrayViewMut::<i32, Geo<1, 0>>::from_slice_strided(
            &mut data,
            Vector::from([3]),
            Vector::from([2]),
        )
        .unwrap();
        v.fill(5);
        drop(v);
        assert_eq!(data, [5, 0, 5, 0, 5, 0]);
    }

    #[test]
    fn map_inplace_visits_logical_order() {
        let mut a =
            Array::<i32, Geo<2, 2>>::from_vec(Vector::from([2, 2]), vec![1, 2, 3, 4]).unwrap();
        let mut next = 0;
        a.deep().map_inplace(|element| {
            *element += next;
            next += 10;
        });
        assert_eq!(a.as_slice().unwrap(), &[1, 12, 23, 34]);
    }

    #[test]
    fn assignment_matches_elements_logically() {
        let data: Vec<i32> = (0..6).collect();
        // Column-major source: logical order differs from memory order.
        let src = ArrayView::<i32, Geo<2, 0>>::from_slice_strided(
            &data,
            Vector::from([3, 2]),
            Vector::from([1, 3]),
        )
        .unwrap();
        let mut dst = Array::<i32, Geo<2, 2>>::allocate(Vector::from([3, 2])).unwrap();
        dst.deep().assign(&src);
        assert_eq!(dst.as_slice().unwrap(), &[0, 3, 1, 4, 2, 5]);
    }

    #[test]
    #[should_panic(expected = "shape mismatch in assignment")]
    fn assignment_rejects_shape_mismatch() {
        let src = Array::<i32, Geo<2, 2>>::from_elem(Vector::from([2, 2]), 1).unwrap();
        let mut dst = Array::<i32, Geo<2, 2>>::from_elem(Vector::from([2, 3]), 0).unwrap();
        dst.deep().assign(&src);
    }

    #[test]
    fn deep_copies_are_independent_and_packed() {
        let data: Vec<i32> = (0..6).collect();
        let strided = ArrayView::<i32, Geo<1, 0>>::from_slice_strided(
            &data,
            Vector::from([3]),
            Vector::from([2]),
        )
        .unwrap();
        let mut copy = strided.to_dense();
        assert!(copy.is_unique());
        assert!(copy.is_standard_layout());
        assert_eq!(copy.as_slice().unwrap(), &[0, 2, 4]);
        copy.deep().fill(9);
        assert_eq!(data, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn dense_copies_reach_through_every_wrapper() {
        let a = Array::<i32, Geo<2, 2>>::from_vec(Vector::from([2, 2]), vec![1, 2, 3, 4]).unwrap();

        // Through a borrowed view and through a temporary owning handle:
        // both must yield a fresh unique array, not a shallow handle.
        let mut from_view = a.view().to_dense();
        assert!(from_view.is_unique());
        from_view.deep().fill(0);
        assert_eq!(a[[0, 0]], 1);

        let mut from_handle = a.transposed().to_dense();
        assert!(from_handle.is_unique());
        assert_eq!(from_handle[[1, 0]], a[[0, 1]]);
        from_handle.deep().fill(0);
        assert_eq!(a[[0, 1]], 2);

        // `clone` (and with it std's `to_owned`) stays shallow.
        let shallow = a.clone();
        assert_eq!(shallow, a);
        assert!(!a.is_unique());
    }

    #[test]
    fn scalar_assignment_operators_broadcast() {
        let mut a =
            Array::<f64, Geo<2, 2>>::from_vec(Vector::from([2, 2]), vec![1.0, 2.0, 3.0, 4.0])
                .unwrap();
        *a.deep() += 0.5;
        assert_eq!(a.as_slice().unwrap(), &[1.5, 2.5, 3.5, 4.5]);
        *a.deep() *= 2.0;
        assert_eq!(a.as_slice().unwrap(), &[3.0, 5.0, 7.0, 9.0]);
        *a.deep() -= 1.0;
        *a.deep() /= 2.0;
        assert_eq!(a.as_slice().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn scalar_assignment_respects_strided_views() {
        let mut data = [1i32; 6];
        let mut v = ArrayViewMut::<i32, Geo<1, 0>>::from_slice_strided(
            &mut data,
            Vector::from([3]),
            Vector::from([2]),
        )
        .unwrap();
        *v += 10;
        drop(v);
        assert_eq!(data, [11, 1, 11, 1, 11, 1]);
    }
}
