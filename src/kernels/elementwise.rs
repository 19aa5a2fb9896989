// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Element-wise kernels.
//!
//! Each loop branches once on whether every stride equals the element
//! width and takes a tight slice-style loop in that case; otherwise the
//! strided form walks raw pointers. Every kernel reads its inputs at
//! index `i` before writing index `i`, so the in-place entry points may
//! alias input and output.

use rawpointer::PointerExt;

use crate::element::{Element, FloatElement, IntElement, SignedElement};

/// A binary element-wise operation, instantiated per element type.
pub(crate) trait BinOp<T: Element> {
    fn apply(a: T, b: T) -> T;
}

/// A unary element-wise operation.
pub(crate) trait UnOp<T: Element> {
    fn apply(a: T) -> T;
}

macro_rules! bin_op {
    ($name:ident, $bound:ident, |$a:ident, $b:ident| $body:expr) => {
        pub(crate) struct $name;

        impl<T: $bound> BinOp<T> for $name {
            #[inline(always)]
            fn apply($a: T, $b: T) -> T {
                $body
            }
        }
    };
}

macro_rules! un_op {
    ($name:ident, $bound:ident, |$a:ident| $body:expr) => {
        pub(crate) struct $name;

        impl<T: $bound> UnOp<T> for $name {
            #[inline(always)]
            fn apply($a: T) -> T {
                $body
            }
        }
    };
}

bin_op!(AddOp, Element, |a, b| a.add(b));
bin_op!(SubOp, Element, |a, b| a.sub(b));
bin_op!(MulOp, Element, |a, b| a.mul(b));
bin_op!(DivOp, Element, |a, b| a.div(b));
bin_op!(MaxOp, Element, |a, b| a.maximum(b));
bin_op!(MinOp, Element, |a, b| a.minimum(b));
bin_op!(PowOp, Element, |a, b| a.pow(b));

un_op!(NegOp, SignedElement, |a| a.neg());
un_op!(AbsOp, SignedElement, |a| a.abs());
un_op!(ExpOp, FloatElement, |a| a.exp());
un_op!(LogOp, FloatElement, |a| a.log());
un_op!(SqrtOp, FloatElement, |a| a.sqrt());

// Integer transcendentals promote through the float kind of matching
// width and truncate back.
un_op!(IntExpOp, IntElement, |a| T::demote(a.promote().exp()));
un_op!(IntLogOp, IntElement, |a| T::demote(a.promote().log()));
un_op!(IntSqrtOp, IntElement, |a| {
    if a < T::ZERO {
        T::ZERO
    } else {
        T::demote(a.promote().sqrt())
    }
});

pub(crate) unsafe fn binary_loop<T: Element, O: BinOp<T>>(
    a: *const u8,
    b: *const u8,
    out: *mut u8,
    n: usize,
    sa: isize,
    sb: isize,
    so: isize,
) {
    let esz = std::mem::size_of::<T>() as isize;
    if sa == esz && sb == esz && so == esz {
        let a = a as *const T;
        let b = b as *const T;
        let out = out as *mut T;
        for i in 0..n {
            out.add(i).write(O::apply(a.add(i).read(), b.add(i).read()));
        }
    } else {
        for i in 0..n {
            let av = (a.stride_offset(sa, i) as *const T).read();
            let bv = (b.stride_offset(sb, i) as *const T).read();
            (out.stride_offset(so, i) as *mut T).write(O::apply(av, bv));
        }
    }
}

pub(crate) unsafe fn unary_loop<T: Element, O: UnOp<T>>(
    a: *const u8,
    out: *mut u8,
    n: usize,
    sa: isize,
    so: isize,
) {
    let esz = std::mem::size_of::<T>() as isize;
    if sa == esz && so == esz {
        let a = a as *const T;
        let out = out as *mut T;
        for i in 0..n {
            out.add(i).write(O::apply(a.add(i).read()));
        }
    } else {
        for i in 0..n {
            let av = (a.stride_offset(sa, i) as *const T).read();
            (out.stride_offset(so, i) as *mut T).write(O::apply(av));
        }
    }
}

/// Scalar-broadcast loop. The double operand is cast to the element kind
/// once at entry.
pub(crate) unsafe fn scalar_loop<T: Element, O: BinOp<T>>(
    a: *const u8,
    scalar: f64,
    out: *mut u8,
    n: usize,
    sa: isize,
    so: isize,
) {
    let s = T::from_f64(scalar);
    let esz = std::mem::size_of::<T>() as isize;
    if sa == esz && so == esz {
        let a = a as *const T;
        let out = out as *mut T;
        for i in 0..n {
            out.add(i).write(O::apply(a.add(i).read(), s));
        }
    } else {
        for i in 0..n {
            let av = (a.stride_offset(sa, i) as *const T).read();
            (out.stride_offset(so, i) as *mut T).write(O::apply(av, s));
        }
    }
}

/// Per-element `max(lo, min(hi, a[i]))` with the bounds cast per kind.
pub(crate) unsafe fn clip_loop<T: Element>(
    a: *const u8,
    lo: f64,
    hi: f64,
    out: *mut u8,
    n: usize,
    sa: isize,
    so: isize,
) {
    let lo = T::from_f64(lo);
    let hi = T::from_f64(hi);
    let esz = std::mem::size_of::<T>() as isize;
    if sa == esz && so == esz {
        let a = a as *const T;
        let out = out as *mut T;
        for i in 0..n {
            out.add(i).write(a.add(i).read().minimum(hi).maximum(lo));
        }
    } else {
        for i in 0..n {
            let av = (a.stride_offset(sa, i) as *const T).read();
            (out.stride_offset(so, i) as *mut T).write(av.minimum(hi).maximum(lo));
        }
    }
}
