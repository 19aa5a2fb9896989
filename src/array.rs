// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::sync::Arc;

use crate::context::Buffer;
use crate::dimension::{self, ShapeArray, StrideArray, MAX_RANK};
use crate::dtype::ScalarKind;

/// A dynamically typed *n*-dimensional array.
///
/// An `Array` is a handle onto a shared element buffer plus the layout
/// that interprets it: element kind, shape, and byte strides. Freshly
/// created arrays own their buffer exclusively and are C-order
/// contiguous; `slice` and `transpose` produce views that share the
/// buffer with their ancestor, so a view can never dangle.
///
/// Cloning an `Array` clones the *handle*, not the elements; the clone
/// is a view. Use [`Array::copy`](Self::copy) for a deep copy.
pub struct Array {
    pub(crate) buf: Arc<Buffer>,
    /// Byte offset of the first logical element into the buffer.
    pub(crate) offset: isize,
    pub(crate) kind: ScalarKind,
    pub(crate) rank: usize,
    pub(crate) shape: ShapeArray,
    pub(crate) strides: StrideArray,
    pub(crate) size: usize,
    pub(crate) contiguous: bool,
}

impl Array {
    /// Wrap a freshly allocated buffer in a contiguous C-order array.
    /// `shape` must already be validated.
    pub(crate) fn from_buffer(buf: Arc<Buffer>, kind: ScalarKind, shape: &[usize], size: usize) -> Array {
        let mut shape_arr = [0usize; MAX_RANK];
        shape_arr[..shape.len()].copy_from_slice(shape);
        Array {
            buf,
            offset: 0,
            kind,
            rank: shape.len(),
            shape: shape_arr,
            strides: dimension::c_order_strides(shape, kind.size_in_bytes()),
            size,
            contiguous: true,
        }
    }

    /// The element kind.
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the array holds no elements (possible only for views
    /// produced by an empty slice).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Extent along each axis.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.rank]
    }

    /// Byte stride along each axis.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides[..self.rank]
    }

    /// Width of one element in bytes.
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.kind.size_in_bytes()
    }

    /// Total bytes spanned by the elements: `len() * elem_size()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.size * self.elem_size()
    }

    /// Whether the layout is canonical C order with no gaps.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    /// Pointer to the first logical element.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        unsafe { self.buf.as_ptr().offset(self.offset) }
    }

    /// Mutable pointer to the first logical element.
    ///
    /// Taking `&mut self` signals exclusive use; views of the same
    /// buffer observe the writes.
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        unsafe { self.buf.as_ptr().offset(self.offset) }
    }

    /// A view of the whole array (shares the buffer).
    pub fn view(&self) -> Array {
        self.clone()
    }

    pub(crate) fn recompute_contiguous(&mut self) {
        self.contiguous = dimension::is_contiguous(self.shape(), &self.strides[..self.rank], self.elem_size());
    }
}

impl Clone for Array {
    fn clone(&self) -> Array {
        Array {
            buf: Arc::clone(&self.buf),
            offset: self.offset,
            kind: self.kind,
            rank: self.rank,
            shape: self.shape,
            strides: self.strides,
            size: self.size,
            contiguous: self.contiguous,
        }
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("kind", &format_args!("{}", self.kind))
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("contiguous", &self.contiguous)
            .finish()
    }
}
