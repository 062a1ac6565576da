/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! End-to-end checks of the restructuring surface: transposes,
//! permutations, contiguity casts, flattening, and component views, all
//! of which must reach the same elements as the source view.

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use ndspan::{Array, ArrayView, ExternalManager, Geo, Manager, Vector};
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

cfg_if::cfg_if! {
    if #[cfg(miri)] {
        const SIDE: isize = 8;
    } else {
        const SIDE: isize = 64;
    }
}

#[test]
fn element_addresses_follow_the_stride_dot_product() {
    let data: Vec<i64> = (0..24).collect();
    let v = ArrayView::<i64, Geo<2, 0>>::from_slice_strided(
        &data,
        Vector::from([3, 3]),
        Vector::from([8, 2]),
    )
    .unwrap();
    for i in 0..3 {
        for j in 0..3 {
            let flat = (i * 8 + j * 2) as usize;
            assert_eq!(v[[i, j]], data[flat]);
            assert!(std::ptr::eq(&v[[i, j]], &data[flat]));
        }
    }
}

#[test]
fn transposition_matches_the_worked_layout() {
    let data: Vec<f64> = (0..6).map(f64::from).collect();
    let a = Array::<f64, Geo<2, 2>>::from_vec(Vector::from([2, 3]), data).unwrap();
    assert_eq!(a.shape(), [2, 3]);
    assert_eq!(a.strides(), [3, 1]);

    let t = a.transposed();
    assert_eq!(t.shape(), [3, 2]);
    assert_eq!(t.strides(), [1, 3]);
    assert_eq!(t[[2, 1]], a[[1, 2]]);
    assert_eq!(t[[0, 1]], 3.0);

    let back = t.transposed();
    assert_eq!(back.shape(), a.shape());
    assert_eq!(back.strides(), a.strides());
    assert_eq!(back.as_ptr(), a.as_ptr());
    assert_eq!(back, a);
}

#[test]
fn contiguity_claims_verify_or_fail_softly() {
    let data: Vec<i32> = (0..6).collect();
    let v = ArrayView::<i32, Geo<2, 0>>::from_slice(&data, Vector::from([2, 3])).unwrap();

    let packed = v.dynamic_dimension_cast::<Geo<2, 2>>();
    assert!(!packed.is_empty());
    assert_eq!(packed[[1, 2]], 5);

    // Transposing makes the layout column-major; the row-major claim must
    // fail, and failure is an empty view rather than a panic.
    let t = v.transposed();
    let failed = t.dynamic_dimension_cast::<Geo<2, 2>>();
    assert!(failed.is_empty());
    assert_eq!(failed.shape(), [0, 0]);
    let recovered = t.dynamic_dimension_cast::<Geo<2, -2>>();
    assert!(!recovered.is_empty());
}

#[test]
fn flattening_walks_memory_order() {
    let a = Array::<i32, Geo<2, 2>>::from_vec(Vector::from([2, 3]), (0..6).collect()).unwrap();
    let flat = a.flattened();
    assert_eq!(flat.shape(), [6]);
    assert_eq!(flat.strides(), [1]);
    assert_eq!(flat.iter().copied().collect::<Vec<_>>(), (0..6).collect::<Vec<_>>());

    // A relaxed view has to earn the packing back before flattening.
    let relaxed = a.relaxed();
    let packed = relaxed.dynamic_dimension_cast::<Geo<2, 2>>();
    assert!(!packed.is_empty());
    assert_eq!(packed.flattened().as_slice().unwrap(), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn component_views_split_complex_storage() {
    let data: Vec<Complex<f64>> = (0..5)
        .map(|k| Complex::new(k as f64, 10.0 + k as f64))
        .collect();
    let a = Array::<Complex<f64>, Geo<1, 1>>::from_vec(Vector::from([5]), data).unwrap();

    let re = a.real();
    let im = a.imag();
    assert_eq!(re.shape(), [5]);
    assert_eq!(re.strides(), [2]);
    assert_eq!(im.shape(), [5]);
    assert_eq!(im.strides(), [2]);
    for k in 0..5 {
        assert_eq!(re[k], k as f64);
        assert_eq!(im[k], 10.0 + k as f64);
    }

    // The component views address the same storage as the complex view.
    assert_eq!(re.as_ptr(), a.as_ptr().cast());
}

#[test]
fn permutations_generalize_transposition() {
    let a = Array::<i32, Geo<3, 3>>::from_vec(Vector::from([2, 3, 4]), (0..24).collect()).unwrap();
    let p = a.permuted_axes(Vector::from([2, 0, 1]));
    assert_eq!(p.shape(), [4, 2, 3]);
    for i in 0..2 {
        for j in 0..3 {
            for k in 0..4 {
                assert_eq!(p[[k, i, j]], a[[i, j, k]]);
            }
        }
    }
    // The full reversal and the reversing permutation agree.
    let rev = a.permuted_axes(Vector::from([2, 1, 0]));
    let t = a.transposed();
    assert_eq!(rev.shape(), t.shape());
    assert_eq!(rev.strides(), t.strides());
}

#[test]
fn outer_iteration_matches_sub_views() {
    let a = Array::<i32, Geo<3, 3>>::from_vec(Vector::from([3, 2, 2]), (0..12).collect()).unwrap();
    for (i, plane) in a.outer_iter().enumerate() {
        let expected = a.sub(i as isize);
        assert_eq!(plane.shape(), expected.shape());
        assert_eq!(plane.as_ptr(), expected.as_ptr());
        assert_eq!(plane[[1, 1]], expected[[1, 1]]);
    }
}

#[test]
fn zero_length_index_tuples_have_identity_reductions() {
    let empty: Vector<isize, 0> = Vector::from([]);
    assert_eq!(empty.sum(), 0);
    assert_eq!(empty.product(), 1);
    assert_eq!(empty.dot(empty), 0);
}

#[test]
fn randomized_transpose_preserves_the_elements() {
    let mut rng = StdRng::seed_from_u64(0xc0ff33);
    let data: Vec<f64> = (0..SIDE * SIDE).map(|_| rng.random::<f64>()).collect();
    let a = Array::<f64, Geo<2, 2>>::from_vec(Vector::from([SIDE, SIDE]), data.clone()).unwrap();

    let total: f64 = data.iter().sum();
    let transposed_total: f64 = a.transposed().iter().sum();
    assert!((total - transposed_total).abs() < 1e-9);

    let t = a.transposed();
    for k in [0, SIDE / 2, SIDE - 1] {
        let column = t.sub(k);
        for i in 0..SIDE {
            assert_eq!(column[i], a[[i, k]]);
        }
    }
}

#[test]
fn storage_is_released_exactly_once_after_the_last_view() {
    struct Owner {
        data: Vec<i64>,
        releases: Rc<Cell<u32>>,
    }

    impl Drop for Owner {
        fn drop(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    let releases = Rc::new(Cell::new(0));
    let owner = Owner {
        data: (0..6).collect(),
        releases: releases.clone(),
    };
    let ptr = NonNull::new(owner.data.as_ptr().cast_mut()).unwrap();
    let manager: Rc<dyn Manager> = ExternalManager::new(owner);

    // SAFETY: the manager keeps the vector alive, and the packed (2, 3)
    // layout is injective and within its six elements.
    let a = unsafe {
        Array::<i64, Geo<2, 2>>::from_raw_parts(
            ptr,
            Vector::from([2, 3]),
            Vector::from([3, 1]),
            Some(manager),
        )
    };

    // Restructured views keep the storage alive on their own.
    let t = a.transposed();
    let flat = a.flattened();
    drop(a);
    assert_eq!(releases.get(), 0);
    assert_eq!(t[[2, 1]], 5);
    drop(t);
    assert_eq!(releases.get(), 0);
    assert_eq!(flat[0], 0);
    drop(flat);
    assert_eq!(releases.get(), 1);
}

#[test]
fn assignment_copies_across_geometries() {
    let mut rng = StdRng::seed_from_u64(0xc0ff33);
    let data: Vec<f64> = (0..SIDE * SIDE).map(|_| rng.random::<f64>()).collect();
    let a = Array::<f64, Geo<2, 2>>::from_vec(Vector::from([SIDE, SIDE]), data).unwrap();

    let mut b = Array::<f64, Geo<2, 2>>::allocate(Vector::from([SIDE, SIDE])).unwrap();
    b.deep().assign(&a.transposed());
    for (i, j) in [(0, 0), (1, SIDE - 1), (SIDE / 2, SIDE / 3)] {
        assert_eq!(b[[i, j]], a[[j, i]]);
    }

    // Deep copies detach from the source.
    let mut c = a.transposed().to_dense();
    assert!(c.is_unique());
    assert!(c.is_standard_layout());
    assert_eq!(c[[1, 0]], a[[0, 1]]);
    c.deep().fill(0.0);
    assert_ne!(a[[0, 1]], 0.0);
}
