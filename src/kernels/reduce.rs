// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reduction kernels.
//!
//! Integer reductions are serial `acc OP val` loops. Float sums (and the
//! sums inside mean and dot) use pairwise summation: blocks of
//! [`PAIRWISE_BLOCK`] reduced with eight independent accumulators, larger
//! inputs split recursively, which bounds the rounding error to
//! `O(log n · ε)` and leaves the inner loop open to the SLP vectorizer.
//! Float min/max/prod use the same eightfold-unrolled fold with the
//! reduction's identity. Strided float input falls back to the serial
//! loop; pairwise applies only when the stride equals the element width.
//!
//! The cell kernels *combine into* an accumulator cell so that one shape
//! serves both the full reductions and the generic axis path; the fused
//! row kernels stream whole rows into the output buffer for the axis
//! fast path.

use std::slice;

use rawpointer::PointerExt;

use crate::element::{Element, FloatElement, IntElement};

/// Block size below which a float sum is a single unrolled pass. Matches
/// the NumPy pairwise-summation constant.
pub(crate) const PAIRWISE_BLOCK: usize = 128;

/// A reduction: identity plus combining step, instantiated per element
/// type.
pub(crate) trait Reducer<T: Element> {
    fn identity() -> T;
    fn combine(acc: T, v: T) -> T;
}

macro_rules! reducer {
    ($name:ident, $identity:expr, |$acc:ident, $v:ident| $body:expr) => {
        pub(crate) struct $name;

        impl<T: Element> Reducer<T> for $name {
            #[inline(always)]
            fn identity() -> T {
                $identity
            }

            #[inline(always)]
            fn combine($acc: T, $v: T) -> T {
                $body
            }
        }
    };
}

reducer!(SumRed, T::ZERO, |acc, v| acc.add(v));
reducer!(ProdRed, T::ONE, |acc, v| acc.mul(v));
reducer!(MinRed, T::HIGHEST, |acc, v| acc.minimum(v));
reducer!(MaxRed, T::LOWEST, |acc, v| acc.maximum(v));

/// Which operand wins in an arg reduction. Strict comparison keeps the
/// earliest index on ties.
pub(crate) trait ArgCmp<T: Element> {
    fn better(candidate: T, best: T) -> bool;
}

pub(crate) struct ArgMinCmp;
pub(crate) struct ArgMaxCmp;

impl<T: Element> ArgCmp<T> for ArgMinCmp {
    #[inline(always)]
    fn better(candidate: T, best: T) -> bool {
        candidate < best
    }
}

impl<T: Element> ArgCmp<T> for ArgMaxCmp {
    #[inline(always)]
    fn better(candidate: T, best: T) -> bool {
        candidate > best
    }
}

/// Fold over `xs` with eight independent accumulators so that floating
/// point can be vectorized even under strict accuracy semantics.
pub(crate) fn unrolled_fold<T: Element, R: Reducer<T>>(mut xs: &[T]) -> T {
    let mut acc = R::identity();
    let (mut p0, mut p1, mut p2, mut p3, mut p4, mut p5, mut p6, mut p7) = (
        R::identity(),
        R::identity(),
        R::identity(),
        R::identity(),
        R::identity(),
        R::identity(),
        R::identity(),
        R::identity(),
    );
    while xs.len() >= 8 {
        p0 = R::combine(p0, xs[0]);
        p1 = R::combine(p1, xs[1]);
        p2 = R::combine(p2, xs[2]);
        p3 = R::combine(p3, xs[3]);
        p4 = R::combine(p4, xs[4]);
        p5 = R::combine(p5, xs[5]);
        p6 = R::combine(p6, xs[6]);
        p7 = R::combine(p7, xs[7]);

        xs = &xs[8..];
    }
    acc = R::combine(acc, R::combine(p0, p4));
    acc = R::combine(acc, R::combine(p1, p5));
    acc = R::combine(acc, R::combine(p2, p6));
    acc = R::combine(acc, R::combine(p3, p7));

    // make it clear to the optimizer that this loop is short
    // and can not be autovectorized.
    for (i, &x) in xs.iter().enumerate() {
        if i >= 7 {
            break;
        }
        acc = R::combine(acc, x);
    }
    acc
}

/// Pairwise sum of a contiguous float slice.
pub(crate) fn pairwise_sum<T: FloatElement>(xs: &[T]) -> T {
    if xs.len() <= PAIRWISE_BLOCK {
        unrolled_fold::<T, SumRed>(xs)
    } else {
        let (lo, hi) = xs.split_at(xs.len() / 2);
        pairwise_sum(lo).add(pairwise_sum(hi))
    }
}

/// Eightfold-unrolled dot product block.
///
/// `xs` and `ys` must be the same length.
pub(crate) fn unrolled_dot<T: Element>(xs: &[T], ys: &[T]) -> T {
    debug_assert_eq!(xs.len(), ys.len());
    let len = xs.len().min(ys.len());
    let mut xs = &xs[..len];
    let mut ys = &ys[..len];
    let mut sum = T::ZERO;
    let (mut p0, mut p1, mut p2, mut p3, mut p4, mut p5, mut p6, mut p7) = (
        T::ZERO,
        T::ZERO,
        T::ZERO,
        T::ZERO,
        T::ZERO,
        T::ZERO,
        T::ZERO,
        T::ZERO,
    );
    while xs.len() >= 8 {
        p0 = p0.add(xs[0].mul(ys[0]));
        p1 = p1.add(xs[1].mul(ys[1]));
        p2 = p2.add(xs[2].mul(ys[2]));
        p3 = p3.add(xs[3].mul(ys[3]));
        p4 = p4.add(xs[4].mul(ys[4]));
        p5 = p5.add(xs[5].mul(ys[5]));
        p6 = p6.add(xs[6].mul(ys[6]));
        p7 = p7.add(xs[7].mul(ys[7]));

        xs = &xs[8..];
        ys = &ys[8..];
    }
    sum = sum.add(p0.add(p4));
    sum = sum.add(p1.add(p5));
    sum = sum.add(p2.add(p6));
    sum = sum.add(p3.add(p7));

    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if i >= 7 {
            break;
        }
        sum = sum.add(x.mul(y));
    }
    sum
}

/// Pairwise summation of per-element products.
pub(crate) fn pairwise_dot<T: FloatElement>(xs: &[T], ys: &[T]) -> T {
    if xs.len() <= PAIRWISE_BLOCK {
        unrolled_dot(xs, ys)
    } else {
        let mid = xs.len() / 2;
        let (xl, xh) = xs.split_at(mid);
        let (yl, yh) = ys.split_at(mid);
        pairwise_dot(xl, yl).add(pairwise_dot(xh, yh))
    }
}

/// Serial strided reduction of `n` elements.
pub(crate) unsafe fn reduce_strided<T: Element, R: Reducer<T>>(
    src: *const u8,
    n: usize,
    stride: isize,
) -> T {
    let mut acc = R::identity();
    for i in 0..n {
        acc = R::combine(acc, (src.stride_offset(stride, i) as *const T).read());
    }
    acc
}

/// Write the reduction identity into a single cell.
pub(crate) unsafe fn write_identity<T: Element, R: Reducer<T>>(cell: *mut u8) {
    (cell as *mut T).write(R::identity());
}

/// Combine the serial reduction of a row into the accumulator cell.
/// The integer path; also the strided-float fallback shape.
pub(crate) unsafe fn reduce_cell<T: Element, R: Reducer<T>>(
    src: *const u8,
    acc: *mut u8,
    n: usize,
    stride: isize,
) {
    let acc = acc as *mut T;
    acc.write(R::combine(acc.read(), reduce_strided::<T, R>(src, n, stride)));
}

/// Combine a float sum into the accumulator cell: pairwise when the row
/// is dense, serial otherwise.
pub(crate) unsafe fn reduce_cell_float_sum<T: FloatElement>(
    src: *const u8,
    acc: *mut u8,
    n: usize,
    stride: isize,
) {
    let v = if stride == std::mem::size_of::<T>() as isize {
        pairwise_sum(slice::from_raw_parts(src as *const T, n))
    } else {
        reduce_strided::<T, SumRed>(src, n, stride)
    };
    let acc = acc as *mut T;
    acc.write(acc.read().add(v));
}

/// Combine a float fold (prod/min/max) into the accumulator cell with
/// the multi-accumulator loop when the row is dense.
pub(crate) unsafe fn reduce_cell_float_fold<T: FloatElement, R: Reducer<T>>(
    src: *const u8,
    acc: *mut u8,
    n: usize,
    stride: isize,
) {
    let v = if stride == std::mem::size_of::<T>() as isize {
        unrolled_fold::<T, R>(slice::from_raw_parts(src as *const T, n))
    } else {
        reduce_strided::<T, R>(src, n, stride)
    };
    let acc = acc as *mut T;
    acc.write(R::combine(acc.read(), v));
}

/// Fused row reduction: stream `n_rows` dense rows of `n_cols` elements
/// into `dst`, `dst[i] = combine(dst[i], row[i])`. The axis fast path
/// calls this once with the reduction-axis stride as `row_stride`.
pub(crate) unsafe fn row_reduce<T: Element, R: Reducer<T>>(
    base: *const u8,
    row_stride: isize,
    n_rows: usize,
    dst: *mut u8,
    n_cols: usize,
) {
    let dst = dst as *mut T;
    for r in 0..n_rows {
        let row = base.stride_offset(row_stride, r) as *const T;
        for i in 0..n_cols {
            dst.add(i).write(R::combine(dst.add(i).read(), row.add(i).read()));
        }
    }
}

/// Divide-by-count post-pass for mean over a dense cell range. Integer
/// kinds divide through `f64` and truncate toward zero, matching the
/// truncation of dividing the summed value.
pub(crate) unsafe fn scale_int<T: IntElement>(data: *mut u8, n: usize, count: usize) {
    let p = data as *mut T;
    let c = count as f64;
    for i in 0..n {
        let v = p.add(i).read();
        p.add(i).write(T::from_f64(v.to_f64() / c));
    }
}

pub(crate) unsafe fn scale_float<T: FloatElement>(data: *mut u8, n: usize, count: usize) {
    let p = data as *mut T;
    let c = T::from_f64(count as f64);
    for i in 0..n {
        p.add(i).write(p.add(i).read().div(c));
    }
}

/// Scan a row and fold the best (value, index) pair into the running
/// best. `best` must hold a valid element, `best_idx` its index. Strict
/// comparison keeps the earliest index.
pub(crate) unsafe fn arg_reduce_cell<T: Element, C: ArgCmp<T>>(
    src: *const u8,
    best: *mut u8,
    best_idx: *mut i64,
    n: usize,
    stride: isize,
    index_base: i64,
) {
    let bestp = best as *mut T;
    let mut bv = bestp.read();
    let mut bi = best_idx.read();
    for i in 0..n {
        let v = (src.stride_offset(stride, i) as *const T).read();
        if C::better(v, bv) {
            bv = v;
            bi = index_base + i as i64;
        }
    }
    bestp.write(bv);
    best_idx.write(bi);
}

/// Fused axis arg reduction: a scratch row of best values seeded from
/// row 0, indices written into the `int64` output. `n_rows >= 1`.
pub(crate) unsafe fn arg_row_reduce<T: Element, C: ArgCmp<T>>(
    base: *const u8,
    row_stride: isize,
    n_rows: usize,
    dst: *mut i64,
    n_cols: usize,
) {
    let row0 = base as *const T;
    let mut best: Vec<T> = (0..n_cols).map(|i| row0.add(i).read()).collect();
    for i in 0..n_cols {
        dst.add(i).write(0);
    }
    for r in 1..n_rows {
        let row = base.stride_offset(row_stride, r) as *const T;
        for i in 0..n_cols {
            let v = row.add(i).read();
            if C::better(v, best[i]) {
                best[i] = v;
                dst.add(i).write(r as i64);
            }
        }
    }
}

/// 1-D dot, integer path: serial wrapping accumulation of products.
pub(crate) unsafe fn dot_serial<T: Element>(
    a: *const u8,
    b: *const u8,
    out: *mut u8,
    n: usize,
    sa: isize,
    sb: isize,
) {
    let mut acc = T::ZERO;
    for i in 0..n {
        let av = (a.stride_offset(sa, i) as *const T).read();
        let bv = (b.stride_offset(sb, i) as *const T).read();
        acc = acc.add(av.mul(bv));
    }
    (out as *mut T).write(acc);
}

/// 1-D dot, float path: pairwise over dense operands, serial otherwise.
pub(crate) unsafe fn dot_float<T: FloatElement>(
    a: *const u8,
    b: *const u8,
    out: *mut u8,
    n: usize,
    sa: isize,
    sb: isize,
) {
    let esz = std::mem::size_of::<T>() as isize;
    if sa == esz && sb == esz {
        let xs = slice::from_raw_parts(a as *const T, n);
        let ys = slice::from_raw_parts(b as *const T, n);
        (out as *mut T).write(pairwise_dot(xs, ys));
    } else {
        dot_serial::<T>(a, b, out, n, sa, sb);
    }
}
