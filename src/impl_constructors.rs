// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Constructors for owning arrays.

use std::ptr;
use std::sync::Arc;

use crate::array::Array;
use crate::context::{Buffer, Context};
use crate::dimension;
use crate::dtype::ScalarKind;
use crate::element::Element;
use crate::error::{from_kind, ArrayError, ErrorKind};

pub(crate) fn alloc_array(
    ctx: &Context,
    shape: &[usize],
    kind: ScalarKind,
    zeroed: bool,
) -> Result<Array, ArrayError> {
    let size = dimension::size_of_shape_checked(shape)?;
    let elem_size = kind.size_in_bytes();
    let bytes = size
        .checked_mul(elem_size)
        .filter(|&b| b <= isize::MAX as usize)
        .ok_or_else(|| from_kind(ErrorKind::Overflow))?;
    let buf = Arc::new(if zeroed {
        Buffer::zeroed(bytes, elem_size)
    } else {
        Buffer::uninit(bytes, elem_size)
    });
    ctx.register(&buf);
    Ok(Array::from_buffer(buf, kind, shape, size))
}

impl Array {
    /// Create an array of zeros.
    ///
    /// Fails with a shape error when the shape is empty, has a zero
    /// extent, or exceeds [`MAX_RANK`](crate::MAX_RANK) axes.
    pub fn zeros(ctx: &Context, shape: &[usize], kind: ScalarKind) -> Result<Array, ArrayError> {
        alloc_array(ctx, shape, kind, true).map_err(|e| e.record("zeros"))
    }

    /// Create an array without initialising its elements.
    ///
    /// # Safety
    ///
    /// Every element must be written (for example via
    /// [`write_bytes`](Self::write_bytes) or an operation that fills the
    /// whole array) before any is read.
    pub unsafe fn uninit(ctx: &Context, shape: &[usize], kind: ScalarKind) -> Result<Array, ArrayError> {
        alloc_array(ctx, shape, kind, false).map_err(|e| e.record("uninit"))
    }

    /// Create an array with every element set to `value`. The element
    /// kind is `T`'s.
    pub fn full<T: Element>(ctx: &Context, shape: &[usize], value: T) -> Result<Array, ArrayError> {
        let mut a = alloc_array(ctx, shape, T::KIND, false).map_err(|e| e.record("full"))?;
        let ptr = a.as_mut_ptr() as *mut T;
        for i in 0..a.len() {
            unsafe { ptr.add(i).write(value) };
        }
        Ok(a)
    }

    /// Create an array from a flat C-order slice. The slice length must
    /// equal the shape's element count.
    pub fn from_slice<T: Element>(ctx: &Context, shape: &[usize], data: &[T]) -> Result<Array, ArrayError> {
        let inner = || -> Result<Array, ArrayError> {
            let size = dimension::size_of_shape_checked(shape)?;
            if data.len() != size {
                return Err(from_kind(ErrorKind::IncompatibleShape));
            }
            let mut a = alloc_array(ctx, shape, T::KIND, false)?;
            unsafe {
                ptr::copy_nonoverlapping(data.as_ptr() as *const u8, a.as_mut_ptr(), a.capacity());
            }
            Ok(a)
        };
        inner().map_err(|e| e.record("from_slice"))
    }

    /// Deep copy into a fresh contiguous owning array.
    pub fn copy(&self, ctx: &Context) -> Result<Array, ArrayError> {
        self.materialize(ctx).map_err(|e| e.record("copy"))
    }

    /// Bulk-copy raw bytes into a contiguous array, in C order.
    ///
    /// Fails with a layout error when the array is not contiguous and
    /// with a shape error when the byte count differs from
    /// [`capacity`](Self::capacity).
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ArrayError> {
        if !self.is_contiguous() {
            return Err(from_kind(ErrorKind::IncompatibleLayout).record("write_bytes"));
        }
        if bytes.len() != self.capacity() {
            return Err(from_kind(ErrorKind::IncompatibleShape).record("write_bytes"));
        }
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.as_mut_ptr(), bytes.len());
        }
        Ok(())
    }
}
