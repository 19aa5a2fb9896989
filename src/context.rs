// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

/// A raw element buffer.
///
/// Alignment is the element width. The pointer is never turned into a
/// reference; all element access goes through raw pointers, so arrays and
/// views freely share one buffer. The aliasing discipline is the
/// caller's, see the crate docs on concurrency.
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Allocate `size` bytes of uninitialised storage. `size > 0`.
    pub(crate) fn uninit(size: usize, align: usize) -> Buffer {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, align).expect("invalid buffer layout");
        let ptr = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Buffer { ptr, layout }
    }

    /// Allocate `size` zeroed bytes. `size > 0`.
    pub(crate) fn zeroed(size: usize, align: usize) -> Buffer {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, align).expect("invalid buffer layout");
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Buffer { ptr, layout }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// The creation arena.
///
/// Every construction API takes a context; the context keeps each buffer
/// it allocated alive until the context itself is dropped, so a batch of
/// arrays can be released together. Arrays additionally hold a shared
/// reference to their buffer, which makes a view outliving the context a
/// safe (if unusual) situation rather than a dangling one.
pub struct Context {
    buffers: Mutex<Vec<Arc<Buffer>>>,
}

impl Context {
    pub fn new() -> Context {
        Context {
            buffers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, buf: &Arc<Buffer>) {
        self.buffers.lock().unwrap().push(Arc::clone(buf));
    }

    /// Number of buffers allocated through this context.
    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }

    /// Total bytes allocated through this context.
    pub fn allocated_bytes(&self) -> usize {
        self.buffers.lock().unwrap().iter().map(|b| b.len()).sum()
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}
