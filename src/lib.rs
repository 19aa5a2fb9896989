// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `ndtensor` crate provides a dynamically typed N-dimensional array
//! in the NumPy tradition: dense strided buffers of primitive scalars
//! whose element kind is chosen at runtime.
//!
//! - [`Array`]: the array/view handle: element kind, shape, byte
//!   strides, and a shared data buffer.
//! - [`Context`]: the creation arena every constructor takes; it keeps
//!   the buffers it allocated alive so a batch of arrays is released
//!   together.
//! - [`ScalarKind`]: the ten element kinds (signed and unsigned integers
//!   of 8–64 bits, `f32`, `f64`).
//! - Free functions ([`add`], [`sum_axis`], [`argmax`], ..): the
//!   operation layer, writing into caller-provided outputs.
//!
//! ## Highlights
//!
//! - Shape manipulation without copying: [`Array::transpose`] and
//!   [`Array::slice`] (arbitrary positive step) produce views sharing
//!   the ancestor's buffer; [`Array::reshape`] rewrites a contiguous
//!   array in place; [`Array::contiguous`] materialises C order.
//! - NumPy-style broadcasting in every binary operation, implemented by
//!   rewriting strides to zero along replicated axes.
//! - Element-wise and reduction kernels branch once on contiguity and
//!   take tight flat loops on dense data; axis reductions additionally
//!   take a fused row-streaming fast path when the layout allows it.
//! - Float sums, means, and dots use pairwise summation with an
//!   eightfold-unrolled block reduction, bounding rounding error to
//!   `O(log n · ε)` while staying open to vectorisation.
//! - Reductions are always serial and therefore reproducible; with the
//!   `rayon` feature, large contiguous element-wise passes are
//!   partitioned across the global pool (`RAYON_NUM_THREADS` sizes it).
//!
//! ## Errors and concurrency
//!
//! Public operations validate everything up front and return
//! [`ArrayError`] (shape-class or type-class, see [`ErrorClass`]);
//! kernels never run on unvalidated input and never produce partial
//! output on error. The most recent failure is also kept in a
//! thread-local slot, see [`last_error`]. Integer overflow wraps, float
//! specials follow IEEE-754, and integer division by zero panics; none
//! of these are reported as errors.
//!
//! Concurrent reads of one array from several threads are fine. Any
//! mutation demands exclusive access, which the `&mut` entry points
//! express; views alias their ancestor's buffer, so mutating through a
//! view while reading an overlapping view is the caller's contract to
//! uphold, exactly as with raw NumPy buffers.

#[macro_use]
mod private;

mod array;
mod context;
mod dimension;
mod dispatch;
mod dtype;
mod element;
mod error;
mod impl_constructors;
mod impl_methods;
mod iterators;
mod kernels;
mod ops;

pub use crate::array::Array;
pub use crate::context::Context;
pub use crate::dimension::{Axis, MAX_RANK};
pub use crate::dtype::ScalarKind;
pub use crate::element::{Element, FloatElement, IntElement, SignedElement};
pub use crate::error::{last_error, ArrayError, ErrorClass, ErrorKind};
pub use crate::ops::*;
