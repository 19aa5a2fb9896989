// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Public reductions: full and per-axis sum/mean/min/max/prod,
//! argmin/argmax, and the 1-D dot product.
//!
//! Axis reductions pick between two paths. The fused fast path applies
//! when the output is contiguous and the non-reduced input axes form a
//! contiguous block: the whole reduction becomes `reduce_len` dense row
//! passes over the output buffer. Otherwise the generic path walks the
//! output cells through the skip-axis iterator and reduces each cell
//! along the reduction axis.
//!
//! Reductions are always serial (the rayon feature parallelises only
//! element-wise passes), so float sums are reproducible for a given
//! shape and layout.

use std::ptr;

use crate::array::Array;
use crate::dimension::{self, Axis, MAX_RANK};
use crate::dispatch::{self, ArgReduceOp, ReduceOp};
use crate::dtype::ScalarKind;
use crate::error::{from_kind, ArrayError, ErrorKind};
use crate::iterators::NdOffsets;

/// Sum of all elements into a shape-`(1,)` output of the same kind.
/// An empty input yields `0`.
pub fn sum(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    full_reduce(ReduceOp::Sum, a, out).map_err(|e| e.record("sum"))
}

/// Product of all elements. An empty input yields `1`.
pub fn prod(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    full_reduce(ReduceOp::Prod, a, out).map_err(|e| e.record("prod"))
}

/// Minimum of all elements. An empty input yields the reduction
/// identity: `+∞` for floats, the type maximum for integers.
pub fn min(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    full_reduce(ReduceOp::Min, a, out).map_err(|e| e.record("min"))
}

/// Maximum of all elements. An empty input yields `-∞` for floats, the
/// type minimum for integers.
pub fn max(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    full_reduce(ReduceOp::Max, a, out).map_err(|e| e.record("max"))
}

/// Mean of all elements: the sum divided by the count. Integer kinds
/// divide the summed value through `f64` and truncate. An empty input
/// leaves the output untouched (no division happens).
pub fn mean(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    let mut inner = || -> Result<(), ArrayError> {
        if a.is_empty() {
            return check_scalar_out(out, a.kind());
        }
        full_reduce(ReduceOp::Sum, a, out)?;
        let scale = dispatch::scale(a.kind());
        unsafe { scale(out.as_mut_ptr(), 1, a.len()) };
        Ok(())
    };
    inner().map_err(|e| e.record("mean"))
}

/// Index of the smallest element (earliest on ties) into a shape-`(1,)`
/// `int64` output. An empty input is a shape error.
pub fn argmin(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    arg_full_reduce(ArgReduceOp::Min, a, out).map_err(|e| e.record("argmin"))
}

/// Index of the largest element (earliest on ties).
pub fn argmax(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    arg_full_reduce(ArgReduceOp::Max, a, out).map_err(|e| e.record("argmax"))
}

/// Sum along one axis.
pub fn sum_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_reduce(ReduceOp::Sum, false, a, axis, keepdim, out).map_err(|e| e.record("sum_axis"))
}

/// Product along one axis.
pub fn prod_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_reduce(ReduceOp::Prod, false, a, axis, keepdim, out).map_err(|e| e.record("prod_axis"))
}

/// Minimum along one axis.
pub fn min_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_reduce(ReduceOp::Min, false, a, axis, keepdim, out).map_err(|e| e.record("min_axis"))
}

/// Maximum along one axis.
pub fn max_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_reduce(ReduceOp::Max, false, a, axis, keepdim, out).map_err(|e| e.record("max_axis"))
}

/// Mean along one axis; integer kinds truncate the per-cell quotient.
/// A zero-length reduction axis leaves the output untouched.
pub fn mean_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_reduce(ReduceOp::Sum, true, a, axis, keepdim, out).map_err(|e| e.record("mean_axis"))
}

/// Per-axis argmin into an `int64` output (earliest index on ties).
/// A zero-length reduction axis is a shape error.
pub fn argmin_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_arg_reduce(ArgReduceOp::Min, a, axis, keepdim, out).map_err(|e| e.record("argmin_axis"))
}

/// Per-axis argmax into an `int64` output (earliest index on ties).
pub fn argmax_axis(a: &Array, axis: Axis, keepdim: bool, out: &mut Array) -> Result<(), ArrayError> {
    axis_arg_reduce(ArgReduceOp::Max, a, axis, keepdim, out).map_err(|e| e.record("argmax_axis"))
}

/// 1-D dot product: `Σ a[i]·b[i]` into a shape-`(1,)` output. Floats use
/// pairwise summation of the products.
pub fn dot(a: &Array, b: &Array, out: &mut Array) -> Result<(), ArrayError> {
    let mut inner = || -> Result<(), ArrayError> {
        if a.rank() != 1 || b.rank() != 1 {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        }
        if a.kind() != b.kind() {
            return Err(from_kind(ErrorKind::KindMismatch));
        }
        if a.len() != b.len() {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        }
        check_scalar_out(out, a.kind())?;
        let kernel = dispatch::dot(a.kind());
        unsafe {
            kernel(
                a.as_ptr(),
                b.as_ptr(),
                out.as_mut_ptr(),
                a.len(),
                a.strides()[0],
                b.strides()[0],
            )
        };
        Ok(())
    };
    inner().map_err(|e| e.record("dot"))
}

/// The scalar-output contract of the full reductions: rank 1, extent 1,
/// matching kind.
fn check_scalar_out(out: &Array, kind: ScalarKind) -> Result<(), ArrayError> {
    if out.kind() != kind {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    if out.rank() != 1 || out.shape()[0] != 1 {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    Ok(())
}

fn full_reduce(op: ReduceOp, a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    check_scalar_out(out, a.kind())?;
    let kernel = dispatch::reduce(op, a.kind());
    let init = dispatch::reduce_init(op, a.kind());
    let out_ptr = out.as_mut_ptr();
    unsafe { init(out_ptr) };
    if a.is_empty() {
        return Ok(());
    }
    let esz = a.elem_size() as isize;
    if a.is_contiguous() {
        unsafe { kernel(a.as_ptr(), out_ptr, a.len(), esz) };
        return Ok(());
    }
    let rank = a.rank();
    let inner = a.shape()[rank - 1];
    let inner_stride = a.strides()[rank - 1];
    let a_ptr = a.as_ptr();
    for [off] in NdOffsets::<1>::skip_axis(a.shape(), [a.strides()], rank - 1) {
        unsafe { kernel(a_ptr.offset(off), out_ptr, inner, inner_stride) };
    }
    Ok(())
}

fn arg_full_reduce(op: ArgReduceOp, a: &Array, out: &mut Array) -> Result<(), ArrayError> {
    if out.kind() != ScalarKind::Int64 {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    if out.rank() != 1 || out.shape()[0] != 1 {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    if a.is_empty() {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let kernel = dispatch::arg_reduce(op, a.kind());
    // running best value in an 8-byte aligned scratch cell, seeded with
    // the first element
    let mut best = 0u64;
    let best_ptr = &mut best as *mut u64 as *mut u8;
    let mut best_idx = 0i64;
    let a_ptr = a.as_ptr();
    unsafe { ptr::copy_nonoverlapping(a_ptr, best_ptr, a.elem_size()) };
    let esz = a.elem_size() as isize;
    if a.is_contiguous() {
        unsafe { kernel(a_ptr, best_ptr, &mut best_idx, a.len(), esz, 0) };
    } else {
        let rank = a.rank();
        let inner = a.shape()[rank - 1];
        let inner_stride = a.strides()[rank - 1];
        let mut index_base = 0i64;
        for [off] in NdOffsets::<1>::skip_axis(a.shape(), [a.strides()], rank - 1) {
            unsafe {
                kernel(a_ptr.offset(off), best_ptr, &mut best_idx, inner, inner_stride, index_base)
            };
            index_base += inner as i64;
        }
    }
    unsafe { (out.as_mut_ptr() as *mut i64).write(best_idx) };
    Ok(())
}

fn axis_reduce(
    op: ReduceOp,
    mean: bool,
    a: &Array,
    axis: Axis,
    keepdim: bool,
    out: &mut Array,
) -> Result<(), ArrayError> {
    let ax = axis.index();
    if ax >= a.rank() {
        return Err(from_kind(ErrorKind::OutOfBounds));
    }
    if out.kind() != a.kind() {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    let (eshape, erank) = dimension::reduced_shape(a.shape(), ax, keepdim);
    if out.shape() != &eshape[..erank] {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let reduce_len = a.shape()[ax];
    if mean && reduce_len == 0 {
        // no division by zero; the output is left as it was
        return Ok(());
    }
    let stride_ax = a.strides()[ax];
    let out_ptr = out.as_mut_ptr();
    let a_ptr = a.as_ptr();

    // fused fast path: the non-reduced axes are one dense block
    if out.is_contiguous()
        && dimension::is_contiguous_skipping(a.shape(), a.strides(), a.elem_size(), ax)
    {
        let n_cols = out.len();
        match op {
            ReduceOp::Sum => {
                // the sum identity is all-zero bytes for every kind
                unsafe { ptr::write_bytes(out_ptr, 0, out.capacity()) };
                let row = dispatch::row_reduce(op, a.kind());
                unsafe { row(a_ptr, stride_ax, reduce_len, out_ptr, n_cols) };
            }
            ReduceOp::Prod => {
                fill_identity(op, a.kind(), out_ptr, n_cols);
                let row = dispatch::row_reduce(op, a.kind());
                unsafe { row(a_ptr, stride_ax, reduce_len, out_ptr, n_cols) };
            }
            ReduceOp::Min | ReduceOp::Max => {
                if reduce_len == 0 {
                    fill_identity(op, a.kind(), out_ptr, n_cols);
                } else {
                    // seed with the first slice, then stream the rest
                    unsafe { ptr::copy_nonoverlapping(a_ptr, out_ptr, n_cols * a.elem_size()) };
                    let row = dispatch::row_reduce(op, a.kind());
                    unsafe {
                        row(a_ptr.offset(stride_ax), stride_ax, reduce_len - 1, out_ptr, n_cols)
                    };
                }
            }
        }
        if mean {
            let scale = dispatch::scale(a.kind());
            unsafe { scale(out_ptr, n_cols, reduce_len) };
        }
        return Ok(());
    }

    // generic path: one cell per output slot
    let out_strides = padded_out_strides(out.strides(), a.rank(), ax, keepdim);
    let init = dispatch::reduce_init(op, a.kind());
    let kernel = dispatch::reduce(op, a.kind());
    let scale = dispatch::scale(a.kind());
    for [ia, io] in
        NdOffsets::<2>::skip_axis(a.shape(), [a.strides(), &out_strides[..a.rank()]], ax)
    {
        let cell = unsafe { out_ptr.offset(io) };
        unsafe {
            init(cell);
            kernel(a_ptr.offset(ia), cell, reduce_len, stride_ax);
        }
        if mean {
            unsafe { scale(cell, 1, reduce_len) };
        }
    }
    Ok(())
}

fn axis_arg_reduce(
    op: ArgReduceOp,
    a: &Array,
    axis: Axis,
    keepdim: bool,
    out: &mut Array,
) -> Result<(), ArrayError> {
    let ax = axis.index();
    if ax >= a.rank() {
        return Err(from_kind(ErrorKind::OutOfBounds));
    }
    if out.kind() != ScalarKind::Int64 {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    let (eshape, erank) = dimension::reduced_shape(a.shape(), ax, keepdim);
    if out.shape() != &eshape[..erank] {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let reduce_len = a.shape()[ax];
    if reduce_len == 0 {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let stride_ax = a.strides()[ax];
    let out_ptr = out.as_mut_ptr();
    let a_ptr = a.as_ptr();

    if out.is_contiguous()
        && dimension::is_contiguous_skipping(a.shape(), a.strides(), a.elem_size(), ax)
    {
        let fused = dispatch::arg_row_reduce(op, a.kind());
        unsafe { fused(a_ptr, stride_ax, reduce_len, out_ptr as *mut i64, out.len()) };
        return Ok(());
    }

    let out_strides = padded_out_strides(out.strides(), a.rank(), ax, keepdim);
    let kernel = dispatch::arg_reduce(op, a.kind());
    for [ia, io] in
        NdOffsets::<2>::skip_axis(a.shape(), [a.strides(), &out_strides[..a.rank()]], ax)
    {
        let mut best = 0u64;
        let best_ptr = &mut best as *mut u64 as *mut u8;
        let mut best_idx = 0i64;
        unsafe {
            ptr::copy_nonoverlapping(a_ptr.offset(ia), best_ptr, a.elem_size());
            kernel(a_ptr.offset(ia), best_ptr, &mut best_idx, reduce_len, stride_ax, 0);
            (out_ptr.offset(io) as *mut i64).write(best_idx);
        }
    }
    Ok(())
}

/// Align the output strides with the input's rank for the skip-axis
/// walk: with `keepdim` the ranks already match (the pinned axis never
/// moves), otherwise the missing axis gets a placeholder stride that is
/// never stepped.
fn padded_out_strides(out_strides: &[isize], rank: usize, ax: usize, keepdim: bool) -> [isize; MAX_RANK] {
    let mut padded = [0isize; MAX_RANK];
    if keepdim {
        padded[..rank].copy_from_slice(out_strides);
    } else {
        let mut j = 0;
        for (i, slot) in padded.iter_mut().enumerate().take(rank) {
            if i != ax && j < out_strides.len() {
                *slot = out_strides[j];
                j += 1;
            }
        }
    }
    padded
}

fn fill_identity(op: ReduceOp, kind: ScalarKind, out_ptr: *mut u8, n: usize) {
    let init = dispatch::reduce_init(op, kind);
    let esz = kind.size_in_bytes();
    for i in 0..n {
        unsafe { init(out_ptr.add(i * esz)) };
    }
}
