// Copyright 2025 ndtensor developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Kernel dispatch: per-operation tables from [`ScalarKind`] to a
//! monomorphised kernel, as plain `match` tables the compiler folds to
//! O(1) indexing. Operations that are undefined for a kind (`neg`/`abs`
//! on unsigned integers) return `None`, which the public layer reports
//! as a type error.

use crate::dtype::ScalarKind;
use crate::kernels::elementwise as ew;
use crate::kernels::reduce as red;

pub(crate) type BinaryKernel =
    unsafe fn(*const u8, *const u8, *mut u8, usize, isize, isize, isize);
pub(crate) type UnaryKernel = unsafe fn(*const u8, *mut u8, usize, isize, isize);
pub(crate) type ScalarKernel = unsafe fn(*const u8, f64, *mut u8, usize, isize, isize);
pub(crate) type ClipKernel = unsafe fn(*const u8, f64, f64, *mut u8, usize, isize, isize);
/// Writes the reduction identity into one cell.
pub(crate) type InitKernel = unsafe fn(*mut u8);
/// Combines the reduction of `n` strided elements into an accumulator
/// cell.
pub(crate) type ReduceKernel = unsafe fn(*const u8, *mut u8, usize, isize);
/// Streams `n_rows` dense rows into a dense output buffer.
pub(crate) type RowReduceKernel = unsafe fn(*const u8, isize, usize, *mut u8, usize);
/// Divides `n` dense cells by a count.
pub(crate) type ScaleKernel = unsafe fn(*mut u8, usize, usize);
/// Folds a strided row into a running (best value, best index) pair.
pub(crate) type ArgReduceKernel = unsafe fn(*const u8, *mut u8, *mut i64, usize, isize, i64);
/// Fused axis arg reduction over dense rows.
pub(crate) type ArgRowReduceKernel = unsafe fn(*const u8, isize, usize, *mut i64, usize);
pub(crate) type DotKernel = unsafe fn(*const u8, *const u8, *mut u8, usize, isize, isize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
    Pow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Abs,
    Exp,
    Log,
    Sqrt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ReduceOp {
    Sum,
    Prod,
    Min,
    Max,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ArgReduceOp {
    Min,
    Max,
}

macro_rules! for_all_kinds {
    ($kind:expr, $T:ident => $e:expr) => {
        match $kind {
            ScalarKind::Int8 => {
                type $T = i8;
                $e
            }
            ScalarKind::Int16 => {
                type $T = i16;
                $e
            }
            ScalarKind::Int32 => {
                type $T = i32;
                $e
            }
            ScalarKind::Int64 => {
                type $T = i64;
                $e
            }
            ScalarKind::UInt8 => {
                type $T = u8;
                $e
            }
            ScalarKind::UInt16 => {
                type $T = u16;
                $e
            }
            ScalarKind::UInt32 => {
                type $T = u32;
                $e
            }
            ScalarKind::UInt64 => {
                type $T = u64;
                $e
            }
            ScalarKind::Float32 => {
                type $T = f32;
                $e
            }
            ScalarKind::Float64 => {
                type $T = f64;
                $e
            }
        }
    };
}

macro_rules! for_int_kinds {
    ($kind:expr, $T:ident => $e:expr) => {
        match $kind {
            ScalarKind::Int8 => {
                type $T = i8;
                $e
            }
            ScalarKind::Int16 => {
                type $T = i16;
                $e
            }
            ScalarKind::Int32 => {
                type $T = i32;
                $e
            }
            ScalarKind::Int64 => {
                type $T = i64;
                $e
            }
            ScalarKind::UInt8 => {
                type $T = u8;
                $e
            }
            ScalarKind::UInt16 => {
                type $T = u16;
                $e
            }
            ScalarKind::UInt32 => {
                type $T = u32;
                $e
            }
            ScalarKind::UInt64 => {
                type $T = u64;
                $e
            }
            _ => unreachable!("integer kind expected"),
        }
    };
}

macro_rules! for_float_kinds {
    ($kind:expr, $T:ident => $e:expr) => {
        match $kind {
            ScalarKind::Float32 => {
                type $T = f32;
                $e
            }
            ScalarKind::Float64 => {
                type $T = f64;
                $e
            }
            _ => unreachable!("float kind expected"),
        }
    };
}

macro_rules! for_signed_kinds {
    ($kind:expr, $T:ident => $e:expr) => {
        match $kind {
            ScalarKind::Int8 => {
                type $T = i8;
                Some($e)
            }
            ScalarKind::Int16 => {
                type $T = i16;
                Some($e)
            }
            ScalarKind::Int32 => {
                type $T = i32;
                Some($e)
            }
            ScalarKind::Int64 => {
                type $T = i64;
                Some($e)
            }
            ScalarKind::Float32 => {
                type $T = f32;
                Some($e)
            }
            ScalarKind::Float64 => {
                type $T = f64;
                Some($e)
            }
            ScalarKind::UInt8
            | ScalarKind::UInt16
            | ScalarKind::UInt32
            | ScalarKind::UInt64 => None,
        }
    };
}

pub(crate) fn binary(op: BinaryOp, kind: ScalarKind) -> BinaryKernel {
    match op {
        BinaryOp::Add => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::AddOp> as BinaryKernel)
        }
        BinaryOp::Sub => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::SubOp> as BinaryKernel)
        }
        BinaryOp::Mul => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::MulOp> as BinaryKernel)
        }
        BinaryOp::Div => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::DivOp> as BinaryKernel)
        }
        BinaryOp::Maximum => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::MaxOp> as BinaryKernel)
        }
        BinaryOp::Minimum => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::MinOp> as BinaryKernel)
        }
        BinaryOp::Pow => {
            for_all_kinds!(kind, T => ew::binary_loop::<T, ew::PowOp> as BinaryKernel)
        }
    }
}

pub(crate) fn unary(op: UnaryOp, kind: ScalarKind) -> Option<UnaryKernel> {
    match op {
        UnaryOp::Neg => {
            for_signed_kinds!(kind, T => ew::unary_loop::<T, ew::NegOp> as UnaryKernel)
        }
        UnaryOp::Abs => {
            for_signed_kinds!(kind, T => ew::unary_loop::<T, ew::AbsOp> as UnaryKernel)
        }
        UnaryOp::Exp => Some(if kind.is_float() {
            for_float_kinds!(kind, T => ew::unary_loop::<T, ew::ExpOp> as UnaryKernel)
        } else {
            for_int_kinds!(kind, T => ew::unary_loop::<T, ew::IntExpOp> as UnaryKernel)
        }),
        UnaryOp::Log => Some(if kind.is_float() {
            for_float_kinds!(kind, T => ew::unary_loop::<T, ew::LogOp> as UnaryKernel)
        } else {
            for_int_kinds!(kind, T => ew::unary_loop::<T, ew::IntLogOp> as UnaryKernel)
        }),
        UnaryOp::Sqrt => Some(if kind.is_float() {
            for_float_kinds!(kind, T => ew::unary_loop::<T, ew::SqrtOp> as UnaryKernel)
        } else {
            for_int_kinds!(kind, T => ew::unary_loop::<T, ew::IntSqrtOp> as UnaryKernel)
        }),
    }
}

pub(crate) fn scalar(op: BinaryOp, kind: ScalarKind) -> ScalarKernel {
    match op {
        BinaryOp::Add => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::AddOp> as ScalarKernel)
        }
        BinaryOp::Sub => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::SubOp> as ScalarKernel)
        }
        BinaryOp::Mul => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::MulOp> as ScalarKernel)
        }
        BinaryOp::Div => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::DivOp> as ScalarKernel)
        }
        BinaryOp::Maximum => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::MaxOp> as ScalarKernel)
        }
        BinaryOp::Minimum => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::MinOp> as ScalarKernel)
        }
        BinaryOp::Pow => {
            for_all_kinds!(kind, T => ew::scalar_loop::<T, ew::PowOp> as ScalarKernel)
        }
    }
}

pub(crate) fn clip(kind: ScalarKind) -> ClipKernel {
    for_all_kinds!(kind, T => ew::clip_loop::<T> as ClipKernel)
}

pub(crate) fn reduce(op: ReduceOp, kind: ScalarKind) -> ReduceKernel {
    if kind.is_float() {
        match op {
            ReduceOp::Sum => {
                for_float_kinds!(kind, T => red::reduce_cell_float_sum::<T> as ReduceKernel)
            }
            ReduceOp::Prod => {
                for_float_kinds!(kind, T => red::reduce_cell_float_fold::<T, red::ProdRed> as ReduceKernel)
            }
            ReduceOp::Min => {
                for_float_kinds!(kind, T => red::reduce_cell_float_fold::<T, red::MinRed> as ReduceKernel)
            }
            ReduceOp::Max => {
                for_float_kinds!(kind, T => red::reduce_cell_float_fold::<T, red::MaxRed> as ReduceKernel)
            }
        }
    } else {
        match op {
            ReduceOp::Sum => {
                for_int_kinds!(kind, T => red::reduce_cell::<T, red::SumRed> as ReduceKernel)
            }
            ReduceOp::Prod => {
                for_int_kinds!(kind, T => red::reduce_cell::<T, red::ProdRed> as ReduceKernel)
            }
            ReduceOp::Min => {
                for_int_kinds!(kind, T => red::reduce_cell::<T, red::MinRed> as ReduceKernel)
            }
            ReduceOp::Max => {
                for_int_kinds!(kind, T => red::reduce_cell::<T, red::MaxRed> as ReduceKernel)
            }
        }
    }
}

pub(crate) fn reduce_init(op: ReduceOp, kind: ScalarKind) -> InitKernel {
    match op {
        ReduceOp::Sum => {
            for_all_kinds!(kind, T => red::write_identity::<T, red::SumRed> as InitKernel)
        }
        ReduceOp::Prod => {
            for_all_kinds!(kind, T => red::write_identity::<T, red::ProdRed> as InitKernel)
        }
        ReduceOp::Min => {
            for_all_kinds!(kind, T => red::write_identity::<T, red::MinRed> as InitKernel)
        }
        ReduceOp::Max => {
            for_all_kinds!(kind, T => red::write_identity::<T, red::MaxRed> as InitKernel)
        }
    }
}

pub(crate) fn row_reduce(op: ReduceOp, kind: ScalarKind) -> RowReduceKernel {
    match op {
        ReduceOp::Sum => {
            for_all_kinds!(kind, T => red::row_reduce::<T, red::SumRed> as RowReduceKernel)
        }
        ReduceOp::Prod => {
            for_all_kinds!(kind, T => red::row_reduce::<T, red::ProdRed> as RowReduceKernel)
        }
        ReduceOp::Min => {
            for_all_kinds!(kind, T => red::row_reduce::<T, red::MinRed> as RowReduceKernel)
        }
        ReduceOp::Max => {
            for_all_kinds!(kind, T => red::row_reduce::<T, red::MaxRed> as RowReduceKernel)
        }
    }
}

pub(crate) fn scale(kind: ScalarKind) -> ScaleKernel {
    if kind.is_float() {
        for_float_kinds!(kind, T => red::scale_float::<T> as ScaleKernel)
    } else {
        for_int_kinds!(kind, T => red::scale_int::<T> as ScaleKernel)
    }
}

pub(crate) fn arg_reduce(op: ArgReduceOp, kind: ScalarKind) -> ArgReduceKernel {
    match op {
        ArgReduceOp::Min => {
            for_all_kinds!(kind, T => red::arg_reduce_cell::<T, red::ArgMinCmp> as ArgReduceKernel)
        }
        ArgReduceOp::Max => {
            for_all_kinds!(kind, T => red::arg_reduce_cell::<T, red::ArgMaxCmp> as ArgReduceKernel)
        }
    }
}

pub(crate) fn arg_row_reduce(op: ArgReduceOp, kind: ScalarKind) -> ArgRowReduceKernel {
    match op {
        ArgReduceOp::Min => {
            for_all_kinds!(kind, T => red::arg_row_reduce::<T, red::ArgMinCmp> as ArgRowReduceKernel)
        }
        ArgReduceOp::Max => {
            for_all_kinds!(kind, T => red::arg_row_reduce::<T, red::ArgMaxCmp> as ArgRowReduceKernel)
        }
    }
}

pub(crate) fn dot(kind: ScalarKind) -> DotKernel {
    if kind.is_float() {
        for_float_kinds!(kind, T => red::dot_float::<T> as DotKernel)
    } else {
        for_int_kinds!(kind, T => red::dot_serial::<T> as DotKernel)
    }
}
