// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shape and layout manipulation, and typed element access.

use std::ptr;

use num_integer::div_ceil;
use rawpointer::PointerExt;

use crate::array::Array;
use crate::context::Context;
use crate::dimension::{self, Axis, MAX_RANK};
use crate::element::Element;
use crate::error::{from_kind, ArrayError, ErrorKind};
use crate::impl_constructors::alloc_array;
use crate::iterators::NdOffsets;

impl Array {
    /// Reinterpret a contiguous array under a new shape of the same
    /// element count, in place. Strides become canonical C order.
    pub fn reshape(&mut self, shape: &[usize]) -> Result<(), ArrayError> {
        self.reshape_impl(shape).map_err(|e| e.record("reshape"))
    }

    /// Copy into a fresh contiguous array of the given shape. The source
    /// may have any layout; only the element count must match.
    pub fn reshape_copy(&self, ctx: &Context, shape: &[usize]) -> Result<Array, ArrayError> {
        let inner = || -> Result<Array, ArrayError> {
            let mut a = self.materialize(ctx)?;
            a.reshape_impl(shape)?;
            Ok(a)
        };
        inner().map_err(|e| e.record("reshape_copy"))
    }

    /// Permute the axes in place. The data is untouched; shape and
    /// strides are rearranged and the contiguity flag recomputed.
    pub fn transpose(&mut self, perm: &[usize]) -> Result<(), ArrayError> {
        self.transpose_impl(perm).map_err(|e| e.record("transpose"))
    }

    /// Permuted deep copy: the result is contiguous in the new axis
    /// order.
    pub fn transpose_copy(&self, ctx: &Context, perm: &[usize]) -> Result<Array, ArrayError> {
        let inner = || -> Result<Array, ArrayError> {
            let mut v = self.view();
            v.transpose_impl(perm)?;
            v.materialize(ctx)
        };
        inner().map_err(|e| e.record("transpose_copy"))
    }

    /// Materialise a fresh contiguous C-order copy.
    pub fn contiguous(&self, ctx: &Context) -> Result<Array, ArrayError> {
        self.materialize(ctx).map_err(|e| e.record("contiguous"))
    }

    /// Take a strided sub-view along one axis.
    ///
    /// The view covers indices `start, start + step, ..` below `stop`
    /// (`stop == 0` means the full extent); its stride along `axis` is
    /// the source stride times `step`. Fails when the axis is out of
    /// range, `start` or `stop` exceed the extent, or `step` is zero.
    pub fn slice(
        &self,
        axis: Axis,
        start: usize,
        stop: usize,
        step: usize,
    ) -> Result<Array, ArrayError> {
        self.slice_impl(axis.index(), start, stop, step)
            .map_err(|e| e.record("slice"))
    }

    /// Checked single-element read.
    pub fn get<T: Element>(&self, index: &[usize]) -> Result<T, ArrayError> {
        let inner = || -> Result<T, ArrayError> {
            if T::KIND != self.kind() {
                return Err(from_kind(ErrorKind::KindMismatch));
            }
            if index.len() != self.rank() {
                return Err(from_kind(ErrorKind::IncompatibleShape));
            }
            let mut offset = 0isize;
            for (ax, &i) in index.iter().enumerate() {
                if i >= self.shape()[ax] {
                    return Err(from_kind(ErrorKind::OutOfBounds));
                }
                offset += i as isize * self.strides()[ax];
            }
            Ok(unsafe { (self.as_ptr().offset(offset) as *const T).read() })
        };
        inner().map_err(|e| e.record("get"))
    }

    /// Gather the elements into a `Vec` in C order, whatever the layout.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        if T::KIND != self.kind() {
            return Err(from_kind(ErrorKind::KindMismatch).record("to_vec"));
        }
        let mut out = Vec::with_capacity(self.len());
        if self.len() == 0 {
            return Ok(out);
        }
        let inner = self.shape()[self.rank() - 1];
        let inner_stride = self.strides()[self.rank() - 1];
        let base = self.as_ptr();
        for [row] in NdOffsets::<1>::skip_axis(self.shape(), [self.strides()], self.rank() - 1) {
            let row_base = unsafe { base.offset(row) };
            for i in 0..inner {
                let p = unsafe { row_base.stride_offset(inner_stride, i) } as *const T;
                out.push(unsafe { p.read() });
            }
        }
        Ok(out)
    }

    fn reshape_impl(&mut self, shape: &[usize]) -> Result<(), ArrayError> {
        if !self.is_contiguous() {
            return Err(from_kind(ErrorKind::IncompatibleLayout));
        }
        let size = dimension::size_of_shape_checked(shape)?;
        if size != self.len() {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        }
        let rank = shape.len();
        self.shape[..rank].copy_from_slice(shape);
        self.shape[rank..].fill(0);
        self.strides = dimension::c_order_strides(shape, self.elem_size());
        self.rank = rank;
        self.contiguous = true;
        Ok(())
    }

    fn transpose_impl(&mut self, perm: &[usize]) -> Result<(), ArrayError> {
        dimension::check_permutation(perm, self.rank())?;
        let mut shape = [0usize; MAX_RANK];
        let mut strides = [0isize; MAX_RANK];
        for (i, &p) in perm.iter().enumerate() {
            shape[i] = self.shape[p];
            strides[i] = self.strides[p];
        }
        self.shape = shape;
        self.strides = strides;
        self.recompute_contiguous();
        Ok(())
    }

    fn slice_impl(&self, ax: usize, start: usize, stop: usize, step: usize) -> Result<Array, ArrayError> {
        if ax >= self.rank() {
            return Err(from_kind(ErrorKind::OutOfBounds));
        }
        let extent = self.shape[ax];
        let stop = if stop == 0 { extent } else { stop };
        if start > extent || stop > extent {
            return Err(from_kind(ErrorKind::OutOfBounds));
        }
        if step == 0 {
            return Err(from_kind(ErrorKind::IncompatibleShape));
        }
        let stop = stop.max(start);
        let mut v = self.view();
        v.offset += start as isize * self.strides[ax];
        v.shape[ax] = div_ceil(stop - start, step);
        v.strides[ax] *= step as isize;
        v.size = v.shape[..v.rank].iter().product();
        v.recompute_contiguous();
        Ok(v)
    }

    /// Fresh contiguous owning copy, any source layout.
    pub(crate) fn materialize(&self, ctx: &Context) -> Result<Array, ArrayError> {
        let mut dst = alloc_array(ctx, self.shape(), self.kind(), false)?;
        let elem_size = self.elem_size();
        if self.is_contiguous() {
            unsafe {
                ptr::copy_nonoverlapping(self.as_ptr(), dst.as_mut_ptr(), self.capacity());
            }
            return Ok(dst);
        }
        let inner = self.shape()[self.rank() - 1];
        let inner_stride = self.strides()[self.rank() - 1];
        let row_bytes = inner * elem_size;
        let src_base = self.as_ptr();
        let dst_base = dst.as_mut_ptr();
        let mut written = 0usize;
        for [row] in NdOffsets::<1>::skip_axis(self.shape(), [self.strides()], self.rank() - 1) {
            unsafe {
                let src_row = src_base.offset(row);
                let dst_row = dst_base.add(written);
                if inner_stride == elem_size as isize {
                    ptr::copy_nonoverlapping(src_row, dst_row, row_bytes);
                } else {
                    for i in 0..inner {
                        ptr::copy_nonoverlapping(
                            src_row.offset(inner_stride * i as isize),
                            dst_row.add(i * elem_size),
                            elem_size,
                        );
                    }
                }
            }
            written += row_bytes;
        }
        Ok(dst)
    }
}
