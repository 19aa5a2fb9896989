// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The public operation layer.
//!
//! Every entry point runs the same prologue (element-kind checks, shape
//! and rank checks including broadcasting where applicable) before any
//! kernel runs, so an error never leaves partial output. Failures are
//! also recorded in the thread-local [`last_error`](crate::last_error)
//! slot.

mod elementwise;
mod reduce;

pub use self::elementwise::{
    abs, abs_assign, add, add_assign, add_scalar, add_scalar_assign, clip, clip_assign, div,
    div_assign, div_scalar, div_scalar_assign, exp, exp_assign, log, log_assign, maximum,
    maximum_assign, minimum, minimum_assign, mul, mul_assign, mul_scalar, mul_scalar_assign, neg,
    neg_assign, pow, pow_assign, sqrt, sqrt_assign, sub, sub_assign, sub_scalar,
    sub_scalar_assign,
};
pub use self::reduce::{
    argmax, argmax_axis, argmin, argmin_axis, dot, max, max_axis, mean, mean_axis, min, min_axis,
    prod, prod_axis, sum, sum_axis,
};
