// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Public element-wise operations.
//!
//! Every entry point validates kinds and shapes, resolves the kernel
//! through [`dispatch`], then either runs the flat contiguous loop (the
//! exact-shape all-contiguous case) or restrides the operands for
//! broadcasting and drives the kernel row by row through [`NdOffsets`].
//! The `_assign` variants alias input and output, which the kernels
//! support by construction.

use crate::array::Array;
use crate::dimension::broadcast::{broadcast_shapes, broadcast_strides};
use crate::dispatch::{self, BinaryOp, UnaryOp};
use crate::error::{from_kind, ArrayError, ErrorKind};
use crate::iterators::NdOffsets;

/// Byte count above which a contiguous pass may be partitioned across
/// the rayon pool (`RAYON_NUM_THREADS` sizes the pool).
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD_BYTES: usize = 1 << 20;

#[cfg(feature = "rayon")]
#[derive(Copy, Clone)]
struct SendPtr<P>(P);

#[cfg(feature = "rayon")]
unsafe impl<P> Send for SendPtr<P> {}
#[cfg(feature = "rayon")]
unsafe impl<P> Sync for SendPtr<P> {}

/// Run `run(byte_offset, len)` over a static partition of `0..n`.
#[cfg(feature = "rayon")]
fn par_partition(n: usize, elem_size: usize, run: impl Fn(isize, usize) + Send + Sync) {
    use rayon::prelude::*;
    let slots = rayon::current_num_threads().max(1) * 4;
    let chunk = (n + slots - 1) / slots;
    let chunk = chunk.max(1);
    let n_chunks = (n + chunk - 1) / chunk;
    (0..n_chunks).into_par_iter().for_each(|c| {
        let start = c * chunk;
        run((start * elem_size) as isize, chunk.min(n - start));
    });
}

macro_rules! binary_entry {
    ($(#[$attr:meta])* $name:ident, $assign:ident, $op:expr) => {
        $(#[$attr])*
        pub fn $name(a: &Array, b: &Array, out: &mut Array) -> Result<(), ArrayError> {
            let out_ptr = out.as_mut_ptr();
            binary_impl($op, a, b, out_ptr, out.shape(), out.strides(), out.is_contiguous(), out.kind())
                .map_err(|e| e.record(stringify!($name)))
        }

        /// In-place form: `a = a OP b`, with `b` broadcast to `a`'s shape.
        pub fn $assign(a: &mut Array, b: &Array) -> Result<(), ArrayError> {
            let out_ptr = a.as_mut_ptr();
            let a = &*a;
            binary_impl($op, a, b, out_ptr, a.shape(), a.strides(), a.is_contiguous(), a.kind())
                .map_err(|e| e.record(stringify!($assign)))
        }
    };
}

binary_entry!(
    /// Element-wise addition with NumPy-style broadcasting. Integer
    /// overflow wraps.
    add, add_assign, BinaryOp::Add
);
binary_entry!(
    /// Element-wise subtraction with broadcasting. Integer overflow
    /// wraps.
    sub, sub_assign, BinaryOp::Sub
);
binary_entry!(
    /// Element-wise multiplication with broadcasting. Integer overflow
    /// wraps.
    mul, mul_assign, BinaryOp::Mul
);
binary_entry!(
    /// Element-wise division with broadcasting. Integer division
    /// truncates and **panics on a zero divisor**; float division is
    /// IEEE-754 (yielding `±∞`/NaN rather than errors).
    div, div_assign, BinaryOp::Div
);
binary_entry!(
    /// Element-wise larger-of with broadcasting.
    maximum, maximum_assign, BinaryOp::Maximum
);
binary_entry!(
    /// Element-wise smaller-of with broadcasting.
    minimum, minimum_assign, BinaryOp::Minimum
);
binary_entry!(
    /// Element-wise exponentiation with broadcasting: `powf` for floats,
    /// exponentiation by squaring for integers (`x^0 == 1` always;
    /// negative exponents truncate to 0 unless `|x| == 1`).
    pow, pow_assign, BinaryOp::Pow
);

macro_rules! scalar_entry {
    ($(#[$attr:meta])* $name:ident, $assign:ident, $op:expr) => {
        $(#[$attr])*
        pub fn $name(a: &Array, scalar: f64, out: &mut Array) -> Result<(), ArrayError> {
            let out_ptr = out.as_mut_ptr();
            scalar_impl($op, a, scalar, out_ptr, out.shape(), out.strides(), out.is_contiguous(), out.kind())
                .map_err(|e| e.record(stringify!($name)))
        }

        /// In-place form.
        pub fn $assign(a: &mut Array, scalar: f64) -> Result<(), ArrayError> {
            let out_ptr = a.as_mut_ptr();
            let a = &*a;
            scalar_impl($op, a, scalar, out_ptr, a.shape(), a.strides(), a.is_contiguous(), a.kind())
                .map_err(|e| e.record(stringify!($assign)))
        }
    };
}

scalar_entry!(
    /// Add a scalar to every element. The double operand is cast to the
    /// element kind at kernel entry.
    add_scalar, add_scalar_assign, BinaryOp::Add
);
scalar_entry!(
    /// Subtract a scalar from every element.
    sub_scalar, sub_scalar_assign, BinaryOp::Sub
);
scalar_entry!(
    /// Multiply every element by a scalar.
    mul_scalar, mul_scalar_assign, BinaryOp::Mul
);
scalar_entry!(
    /// Divide every element by a scalar.
    div_scalar, div_scalar_assign, BinaryOp::Div
);

macro_rules! unary_entry {
    ($(#[$attr:meta])* $name:ident, $assign:ident, $op:expr) => {
        $(#[$attr])*
        pub fn $name(a: &Array, out: &mut Array) -> Result<(), ArrayError> {
            let out_ptr = out.as_mut_ptr();
            unary_impl($op, a, out_ptr, out.shape(), out.strides(), out.is_contiguous(), out.kind())
                .map_err(|e| e.record(stringify!($name)))
        }

        /// In-place form.
        pub fn $assign(a: &mut Array) -> Result<(), ArrayError> {
            let out_ptr = a.as_mut_ptr();
            let a = &*a;
            unary_impl($op, a, out_ptr, a.shape(), a.strides(), a.is_contiguous(), a.kind())
                .map_err(|e| e.record(stringify!($assign)))
        }
    };
}

unary_entry!(
    /// Element-wise negation: wrapping two's complement for signed
    /// integers, sign flip for floats. Unsigned kinds are a type error.
    neg, neg_assign, UnaryOp::Neg
);
unary_entry!(
    /// Element-wise absolute value (`abs(MIN) == MIN` for signed
    /// integers). Unsigned kinds are a type error.
    abs, abs_assign, UnaryOp::Abs
);
unary_entry!(
    /// Element-wise exponential. Floats clamp to `+∞`/`0` beyond the
    /// overflow/underflow thresholds; integer kinds promote through the
    /// width-matched float and truncate back.
    exp, exp_assign, UnaryOp::Exp
);
unary_entry!(
    /// Element-wise natural logarithm, exact at powers of two. Integer
    /// kinds promote through the width-matched float and truncate back.
    log, log_assign, UnaryOp::Log
);
unary_entry!(
    /// Element-wise square root. Negative integer inputs clamp to 0.
    sqrt, sqrt_assign, UnaryOp::Sqrt
);

/// Element-wise `max(lo, min(hi, a[i]))`, bounds cast per element kind.
pub fn clip(a: &Array, out: &mut Array, lo: f64, hi: f64) -> Result<(), ArrayError> {
    let out_ptr = out.as_mut_ptr();
    clip_impl(a, lo, hi, out_ptr, out.shape(), out.strides(), out.is_contiguous(), out.kind())
        .map_err(|e| e.record("clip"))
}

/// In-place form of [`clip`].
pub fn clip_assign(a: &mut Array, lo: f64, hi: f64) -> Result<(), ArrayError> {
    let out_ptr = a.as_mut_ptr();
    let a = &*a;
    clip_impl(a, lo, hi, out_ptr, a.shape(), a.strides(), a.is_contiguous(), a.kind())
        .map_err(|e| e.record("clip_assign"))
}

#[allow(clippy::too_many_arguments)]
fn binary_impl(
    op: BinaryOp,
    a: &Array,
    b: &Array,
    out_ptr: *mut u8,
    out_shape: &[usize],
    out_strides: &[isize],
    out_contig: bool,
    out_kind: crate::dtype::ScalarKind,
) -> Result<(), ArrayError> {
    if a.kind() != b.kind() || a.kind() != out_kind {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    let kernel = dispatch::binary(op, a.kind());
    let esz = a.elem_size() as isize;
    if a.shape() == b.shape()
        && a.shape() == out_shape
        && a.is_contiguous()
        && b.is_contiguous()
        && out_contig
    {
        let n = a.len();
        #[cfg(feature = "rayon")]
        if a.capacity() >= PARALLEL_THRESHOLD_BYTES {
            let ap = SendPtr(a.as_ptr());
            let bp = SendPtr(b.as_ptr());
            let op_ = SendPtr(out_ptr);
            par_partition(n, a.elem_size(), move |off, len| unsafe {
                kernel(ap.0.offset(off), bp.0.offset(off), op_.0.offset(off), len, esz, esz, esz)
            });
            return Ok(());
        }
        unsafe { kernel(a.as_ptr(), b.as_ptr(), out_ptr, n, esz, esz, esz) };
        return Ok(());
    }
    let (bshape, brank) = broadcast_shapes(a.shape(), b.shape())?;
    let bshape = &bshape[..brank];
    if out_shape != bshape {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let sa = broadcast_strides(a.shape(), a.strides(), bshape)?;
    let sb = broadcast_strides(b.shape(), b.strides(), bshape)?;
    let inner = bshape[brank - 1];
    let (ia, ib, io) = (sa[brank - 1], sb[brank - 1], out_strides[brank - 1]);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();
    for [oa, ob, oo] in
        NdOffsets::<3>::skip_axis(bshape, [&sa[..brank], &sb[..brank], out_strides], brank - 1)
    {
        unsafe {
            kernel(a_ptr.offset(oa), b_ptr.offset(ob), out_ptr.offset(oo), inner, ia, ib, io)
        };
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn scalar_impl(
    op: BinaryOp,
    a: &Array,
    scalar: f64,
    out_ptr: *mut u8,
    out_shape: &[usize],
    out_strides: &[isize],
    out_contig: bool,
    out_kind: crate::dtype::ScalarKind,
) -> Result<(), ArrayError> {
    if a.kind() != out_kind {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    if a.shape() != out_shape {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let kernel = dispatch::scalar(op, a.kind());
    let esz = a.elem_size() as isize;
    if a.is_contiguous() && out_contig {
        let n = a.len();
        #[cfg(feature = "rayon")]
        if a.capacity() >= PARALLEL_THRESHOLD_BYTES {
            let ap = SendPtr(a.as_ptr());
            let op_ = SendPtr(out_ptr);
            par_partition(n, a.elem_size(), move |off, len| unsafe {
                kernel(ap.0.offset(off), scalar, op_.0.offset(off), len, esz, esz)
            });
            return Ok(());
        }
        unsafe { kernel(a.as_ptr(), scalar, out_ptr, n, esz, esz) };
        return Ok(());
    }
    strided_2(a, out_ptr, out_strides, |a_row, out_row, n, ia, io| unsafe {
        kernel(a_row, scalar, out_row, n, ia, io)
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn unary_impl(
    op: UnaryOp,
    a: &Array,
    out_ptr: *mut u8,
    out_shape: &[usize],
    out_strides: &[isize],
    out_contig: bool,
    out_kind: crate::dtype::ScalarKind,
) -> Result<(), ArrayError> {
    if a.kind() != out_kind {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    if a.shape() != out_shape {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let kernel =
        dispatch::unary(op, a.kind()).ok_or_else(|| from_kind(ErrorKind::UnsupportedKind))?;
    let esz = a.elem_size() as isize;
    if a.is_contiguous() && out_contig {
        let n = a.len();
        #[cfg(feature = "rayon")]
        if a.capacity() >= PARALLEL_THRESHOLD_BYTES {
            let ap = SendPtr(a.as_ptr());
            let op_ = SendPtr(out_ptr);
            par_partition(n, a.elem_size(), move |off, len| unsafe {
                kernel(ap.0.offset(off), op_.0.offset(off), len, esz, esz)
            });
            return Ok(());
        }
        unsafe { kernel(a.as_ptr(), out_ptr, n, esz, esz) };
        return Ok(());
    }
    strided_2(a, out_ptr, out_strides, |a_row, out_row, n, ia, io| unsafe {
        kernel(a_row, out_row, n, ia, io)
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn clip_impl(
    a: &Array,
    lo: f64,
    hi: f64,
    out_ptr: *mut u8,
    out_shape: &[usize],
    out_strides: &[isize],
    out_contig: bool,
    out_kind: crate::dtype::ScalarKind,
) -> Result<(), ArrayError> {
    if a.kind() != out_kind {
        return Err(from_kind(ErrorKind::KindMismatch));
    }
    if a.shape() != out_shape {
        return Err(from_kind(ErrorKind::IncompatibleShape));
    }
    let kernel = dispatch::clip(a.kind());
    let esz = a.elem_size() as isize;
    if a.is_contiguous() && out_contig {
        unsafe { kernel(a.as_ptr(), lo, hi, out_ptr, a.len(), esz, esz) };
        return Ok(());
    }
    strided_2(a, out_ptr, out_strides, |a_row, out_row, n, ia, io| unsafe {
        kernel(a_row, lo, hi, out_row, n, ia, io)
    });
    Ok(())
}

/// Drive a two-cursor kernel row by row over matching shapes.
fn strided_2(
    a: &Array,
    out_ptr: *mut u8,
    out_strides: &[isize],
    mut row: impl FnMut(*const u8, *mut u8, usize, isize, isize),
) {
    let rank = a.rank();
    let inner = a.shape()[rank - 1];
    let ia = a.strides()[rank - 1];
    let io = out_strides[rank - 1];
    let a_ptr = a.as_ptr();
    for [oa, oo] in NdOffsets::<2>::skip_axis(a.shape(), [a.strides(), out_strides], rank - 1) {
        row(unsafe { a_ptr.offset(oa) }, unsafe { out_ptr.offset(oo) }, inner, ia, io);
    }
}
