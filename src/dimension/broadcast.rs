// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::{ShapeArray, StrideArray, MAX_RANK};
use crate::error::{from_kind, ArrayError, ErrorKind};

/// Calculate the co-broadcast shape of two shapes. Returns an error if
/// the shapes are not compatible.
///
/// Uses the [NumPy broadcasting rules]
/// (https://docs.scipy.org/doc/numpy/user/basics.broadcasting.html#general-broadcasting-rules):
/// shapes are right-aligned, each axis pair must be equal or have one
/// side equal to 1, and the result extent is the larger of the two.
pub(crate) fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<(ShapeArray, usize), ArrayError> {
    let (ra, rb) = (a.len(), b.len());
    let rank = ra.max(rb);
    debug_assert!(rank <= MAX_RANK);
    let mut out = [0usize; MAX_RANK];
    for i in 0..rank {
        let da = if i >= rank - ra { a[i - (rank - ra)] } else { 1 };
        let db = if i >= rank - rb { b[i - (rank - rb)] } else { 1 };
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        };
    }
    Ok((out, rank))
}

/// Rewrite `strides` so that an operand of `shape` walks `to_shape`:
/// axes where the operand extent is 1 but the target's is not get stride
/// 0, and missing leading axes contribute extent 1 with stride 0.
pub(crate) fn broadcast_strides(
    shape: &[usize],
    strides: &[isize],
    to_shape: &[usize],
) -> Result<StrideArray, ArrayError> {
    let rank = shape.len();
    let to_rank = to_shape.len();
    debug_assert!(rank <= to_rank);
    let lead = to_rank - rank;
    let mut out = [0isize; MAX_RANK];
    for i in 0..rank {
        let d = shape[i];
        let to = to_shape[lead + i];
        out[lead + i] = if d == to {
            strides[i]
        } else if d == 1 {
            0
        } else {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        let (s, r) = broadcast_shapes(&[3, 1], &[1, 4]).unwrap();
        assert_eq!(&s[..r], &[3, 4]);
        let (s, r) = broadcast_shapes(&[7, 2, 9], &[9]).unwrap();
        assert_eq!(&s[..r], &[7, 2, 9]);
        let (s, r) = broadcast_shapes(&[5], &[5]).unwrap();
        assert_eq!(&s[..r], &[5]);
        assert!(broadcast_shapes(&[3, 2], &[2, 2]).is_err());
        assert!(broadcast_shapes(&[32, 1, 2], &[2, 1]).is_err());
    }

    #[test]
    fn strides() {
        // (3, 1) f32 against (3, 4): the length-1 axis replicates
        let s = broadcast_strides(&[3, 1], &[4, 4], &[3, 4]).unwrap();
        assert_eq!(&s[..2], &[4, 0]);
        // (4,) against (3, 4): a missing leading axis replicates
        let s = broadcast_strides(&[4], &[8], &[3, 4]).unwrap();
        assert_eq!(&s[..2], &[0, 8]);
        assert!(broadcast_strides(&[2], &[4], &[3, 4]).is_err());
    }
}
