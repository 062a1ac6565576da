/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use thiserror::Error;

/// Errors produced when validating a user-supplied buffer against a
/// requested geometry.
///
/// These arise only from the fallible constructors ([`Array::from_vec`],
/// [`ArrayView::from_slice`] and friends); geometry transformations on
/// already-validated views cannot fail structurally.
///
/// [`Array::from_vec`]: crate::Array::from_vec
/// [`ArrayView::from_slice`]: crate::ArrayView::from_slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The buffer length does not match the number of elements the shape
    /// requires.
    #[error("geometry requires {expected} elements but the buffer holds {actual}")]
    SizeMismatch {
        /// Element count implied by the shape.
        expected: usize,
        /// Element count actually provided.
        actual: usize,
    },

    /// Some addressable offset of the strided layout falls outside the
    /// buffer.
    #[error("stride layout spans offsets {min}..={max} outside a buffer of length {len}")]
    OutOfBounds {
        /// Smallest offset addressed by any in-range index.
        min: isize,
        /// Largest offset addressed by any in-range index.
        max: isize,
        /// Length of the supplied buffer.
        len: usize,
    },

    /// A shape dimension was negative.
    #[error("shape sizes must be non-negative, got {size} in dimension {dim}")]
    NegativeSize {
        /// The offending size.
        size: isize,
        /// The dimension it was supplied for.
        dim: usize,
    },

    /// Offset arithmetic for the requested layout overflowed.
    #[error("stride layout does not fit the addressable range")]
    Overflow,

    /// Two distinct index tuples would map to the same element, which is
    /// not permitted for mutable views.
    #[error("stride layout aliases itself and cannot back a mutable view")]
    Aliasing,
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render() {
        let e = LayoutError::SizeMismatch {
            expected: 6,
            actual: 5,
        };
        assert_eq!(
            e.to_string(),
            "geometry requires 6 elements but the buffer holds 5"
        );

        let e = LayoutError::OutOfBounds {
            min: 0,
            max: 9,
            len: 6,
        };
        assert_eq!(
            e.to_string(),
            "stride layout spans offsets 0..=9 outside a buffer of length 6"
        );
    }
}
