use ndtensor::{
    argmax, argmax_axis, argmin, argmin_axis, dot, max, max_axis, mean, mean_axis, min, min_axis,
    prod, prod_axis, sum, sum_axis, Array, Axis, Context, ErrorClass, ErrorKind, ScalarKind,
};
use quickcheck::quickcheck;

fn scalar_out(ctx: &Context, kind: ScalarKind) -> Array {
    Array::zeros(ctx, &[1], kind).unwrap()
}

#[test]
fn sum_axis_rows() {
    // [[1,2,3],[4,5,6]] summed along axis 0 -> [5,7,9]
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[1i32, 2, 3, 4, 5, 6]).unwrap();
    let mut out = Array::zeros(&ctx, &[3], ScalarKind::Int32).unwrap();
    sum_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![5, 7, 9]);

    // and along axis 1 -> [6, 15]
    let mut out = Array::zeros(&ctx, &[2], ScalarKind::Int32).unwrap();
    sum_axis(&a, Axis(1), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![6, 15]);
}

#[test]
fn sum_axis_keepdim_shapes() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let mut keep = Array::zeros(&ctx, &[1, 3], ScalarKind::Float32).unwrap();
    sum_axis(&a, Axis(0), true, &mut keep).unwrap();
    assert_eq!(keep.to_vec::<f32>().unwrap(), vec![5.0, 7.0, 9.0]);

    // a wrongly shaped output is rejected up front
    let mut wrong = Array::zeros(&ctx, &[3], ScalarKind::Float32).unwrap();
    assert_eq!(
        sum_axis(&a, Axis(0), true, &mut wrong).unwrap_err().kind(),
        ErrorKind::IncompatibleShape
    );
}

#[test]
fn transposed_full_sum() {
    // transpose to (3,2), then a full sum over the strided view
    let ctx = Context::new();
    let mut a = Array::from_slice(&ctx, &[2, 3], &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    a.transpose(&[1, 0]).unwrap();
    assert!(!a.is_contiguous());
    let mut out = scalar_out(&ctx, ScalarKind::Float32);
    sum(&a, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), 21.0);
}

#[test]
fn full_reductions() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[3i64, -1, 7, 0, 9, -4]).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Int64);
    sum(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 14);
    min(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), -4);
    max(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 9);
    prod(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 0);
}

#[test]
fn mean_truncates_integers() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[4], &[1i32, 2, 50, 70]).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Int32);
    mean(&a, &mut out).unwrap();
    // (1 + 2 + 50 + 70) / 4 == 30.75 truncates to 30
    assert_eq!(out.get::<i32>(&[0]).unwrap(), 30);

    let f = Array::from_slice(&ctx, &[4], &[1.0f64, 2.0, 50.0, 70.0]).unwrap();
    let mut fout = scalar_out(&ctx, ScalarKind::Float64);
    mean(&f, &mut fout).unwrap();
    assert_eq!(fout.get::<f64>(&[0]).unwrap(), 30.75);
}

#[test]
fn mean_axis_truncates_per_cell() {
    // [[1,2,3],[4,5,6]] mean along axis 0 -> [2,3,4] in i32
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[1i32, 2, 3, 4, 5, 6]).unwrap();
    let mut out = Array::zeros(&ctx, &[3], ScalarKind::Int32).unwrap();
    mean_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![2, 3, 4]);
}

#[test]
fn min_max_axis_on_dense_input() {
    // axis 0 of a C-order matrix: the fused row path, seeded with the
    // first slice
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[3, 2], &[5i32, -1, 2, 8, 4, 0]).unwrap();
    let mut out = Array::zeros(&ctx, &[2], ScalarKind::Int32).unwrap();
    min_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![2, -1]);
    max_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![5, 8]);
    prod_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![40, 0]);
}

#[test]
fn argmax_axis_picks_first_maximum() {
    // [[1,5,3],[4,2,6]] along axis 1 -> [1, 2]
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[1.0f32, 5.0, 3.0, 4.0, 2.0, 6.0]).unwrap();
    let mut out = Array::zeros(&ctx, &[2], ScalarKind::Int64).unwrap();
    argmax_axis(&a, Axis(1), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i64>().unwrap(), vec![1, 2]);

    argmin_axis(&a, Axis(1), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i64>().unwrap(), vec![0, 1]);

    // along axis 0 with keepdim
    let mut keep = Array::zeros(&ctx, &[1, 3], ScalarKind::Int64).unwrap();
    argmax_axis(&a, Axis(0), true, &mut keep).unwrap();
    assert_eq!(keep.to_vec::<i64>().unwrap(), vec![1, 0, 1]);
}

#[test]
fn arg_reductions_break_ties_low() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[6], &[2i32, 7, 1, 7, 1, 2]).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Int64);
    argmax(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 1);
    argmin(&a, &mut out).unwrap();
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 2);
}

#[test]
fn arg_reductions_demand_int64_output() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[3], &[1.0f32, 2.0, 3.0]).unwrap();
    let mut wrong = scalar_out(&ctx, ScalarKind::Int32);
    let err = argmax(&a, &mut wrong).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KindMismatch);
    assert_eq!(err.class(), ErrorClass::Type);
}

#[test]
fn argmax_on_strided_view() {
    let ctx = Context::new();
    let mut a = Array::from_slice(&ctx, &[2, 3], &[1.0f32, 5.0, 3.0, 4.0, 2.0, 6.0]).unwrap();
    a.transpose(&[1, 0]).unwrap(); // [[1,4],[5,2],[3,6]]
    let mut out = scalar_out(&ctx, ScalarKind::Int64);
    argmax(&a, &mut out).unwrap();
    // in the transposed logical order the 6 sits at flat index 5
    assert_eq!(out.get::<i64>(&[0]).unwrap(), 5);
    let mut axis_out = Array::zeros(&ctx, &[3], ScalarKind::Int64).unwrap();
    argmax_axis(&a, Axis(1), false, &mut axis_out).unwrap();
    assert_eq!(axis_out.to_vec::<i64>().unwrap(), vec![1, 0, 1]);
}

#[test]
fn reductions_over_transposed_axis_take_the_generic_path() {
    let ctx = Context::new();
    let mut a = Array::from_slice(&ctx, &[2, 3], &[1i32, 2, 3, 4, 5, 6]).unwrap();
    a.transpose(&[1, 0]).unwrap(); // logical (3,2): [[1,4],[2,5],[3,6]]
    let mut out = Array::zeros(&ctx, &[2], ScalarKind::Int32).unwrap();
    sum_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![6, 15]);
    max_axis(&a, Axis(0), false, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![3, 6]);
    let mut out1 = Array::zeros(&ctx, &[3], ScalarKind::Int32).unwrap();
    min_axis(&a, Axis(1), false, &mut out1).unwrap();
    assert_eq!(out1.to_vec::<i32>().unwrap(), vec![1, 2, 3]);
}

#[test]
fn reduction_into_strided_output() {
    // the output itself is a transposed view: generic path with strided
    // output cells
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 2, 2], &[1i32, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    let mut out = Array::zeros(&ctx, &[2, 2], ScalarKind::Int32).unwrap();
    let mut out_t = out.view();
    out_t.transpose(&[1, 0]).unwrap();
    sum_axis(&a, Axis(2), false, &mut out_t).unwrap();
    // logical result [[3,7],[11,15]] lands transposed in `out`
    assert_eq!(out.to_vec::<i32>().unwrap(), vec![3, 11, 7, 15]);
}

#[test]
fn empty_reductions_yield_identities() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[4], &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let empty = a.slice(Axis(0), 4, 4, 1).unwrap();
    assert!(empty.is_empty());

    let mut out = scalar_out(&ctx, ScalarKind::Float32);
    sum(&empty, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), 0.0);
    prod(&empty, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), 1.0);
    min(&empty, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), f32::INFINITY);
    max(&empty, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), f32::NEG_INFINITY);

    // mean must not divide by zero and leaves the output untouched
    let mut marker = Array::full(&ctx, &[1], -7.5f32).unwrap();
    mean(&empty, &mut marker).unwrap();
    assert_eq!(marker.get::<f32>(&[0]).unwrap(), -7.5);

    // empty argmin/argmax is a shape error
    let mut iout = scalar_out(&ctx, ScalarKind::Int64);
    assert_eq!(argmin(&empty, &mut iout).unwrap_err().class(), ErrorClass::Shape);

    // integer min/max identities are the type limits
    let ia = Array::from_slice(&ctx, &[2], &[5i16, 6]).unwrap();
    let iempty = ia.slice(Axis(0), 2, 2, 1).unwrap();
    let mut i16out = scalar_out(&ctx, ScalarKind::Int16);
    min(&iempty, &mut i16out).unwrap();
    assert_eq!(i16out.get::<i16>(&[0]).unwrap(), i16::MAX);
}

#[test]
fn keepdim_sum_broadcasts_back() {
    // sum(axis, keepdim) re-broadcast over the input reproduces the
    // element-wise column sums
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[2, 3], &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let mut keep = Array::zeros(&ctx, &[1, 3], ScalarKind::Float64).unwrap();
    sum_axis(&a, Axis(0), true, &mut keep).unwrap();
    assert_eq!(keep.to_vec::<f64>().unwrap(), vec![5.0, 7.0, 9.0]);
    // the keepdim result broadcasts back over the reducing shape
    let mut plus = Array::zeros(&ctx, &[2, 3], ScalarKind::Float64).unwrap();
    ndtensor::add(&a, &keep, &mut plus).unwrap();
    assert_eq!(
        plus.to_vec::<f64>().unwrap(),
        vec![6.0, 9.0, 12.0, 9.0, 12.0, 15.0]
    );
}

#[test]
fn axis_errors() {
    let ctx = Context::new();
    let a = Array::zeros(&ctx, &[2, 3], ScalarKind::Float32).unwrap();
    let mut out = Array::zeros(&ctx, &[3], ScalarKind::Float32).unwrap();
    assert_eq!(
        sum_axis(&a, Axis(2), false, &mut out).unwrap_err().kind(),
        ErrorKind::OutOfBounds
    );
    let mut wrong_kind = Array::zeros(&ctx, &[3], ScalarKind::Float64).unwrap();
    assert_eq!(
        sum_axis(&a, Axis(0), false, &mut wrong_kind).unwrap_err().class(),
        ErrorClass::Type
    );
}

#[test]
fn dot_products() {
    let ctx = Context::new();
    let a = Array::from_slice(&ctx, &[4], &[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let b = Array::from_slice(&ctx, &[4], &[10.0f32, 20.0, 30.0, 40.0]).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Float32);
    dot(&a, &b, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), 300.0);

    let ia = Array::from_slice(&ctx, &[3], &[1i32, -2, 3]).unwrap();
    let ib = Array::from_slice(&ctx, &[3], &[4i32, 5, 6]).unwrap();
    let mut iout = scalar_out(&ctx, ScalarKind::Int32);
    dot(&ia, &ib, &mut iout).unwrap();
    assert_eq!(iout.get::<i32>(&[0]).unwrap(), 12);

    // strided operands go through the serial path
    let evens = Array::from_slice(&ctx, &[6], &[1.0f32, 9.0, 2.0, 9.0, 3.0, 9.0]).unwrap();
    let s = evens.slice(Axis(0), 0, 0, 2).unwrap();
    let c = Array::from_slice(&ctx, &[3], &[1.0f32, 1.0, 1.0]).unwrap();
    dot(&s, &c, &mut out).unwrap();
    assert_eq!(out.get::<f32>(&[0]).unwrap(), 6.0);
}

#[test]
fn dot_validation() {
    let ctx = Context::new();
    let a = Array::zeros(&ctx, &[4], ScalarKind::Float32).unwrap();
    let b = Array::zeros(&ctx, &[3], ScalarKind::Float32).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Float32);
    assert_eq!(dot(&a, &b, &mut out).unwrap_err().kind(), ErrorKind::IncompatibleShape);
    let m = Array::zeros(&ctx, &[2, 2], ScalarKind::Float32).unwrap();
    assert_eq!(dot(&m, &m, &mut out).unwrap_err().kind(), ErrorKind::IncompatibleShape);
}

#[test]
fn large_pairwise_sum_is_accurate() {
    // past the pairwise block size, against an exact integer total
    let ctx = Context::new();
    let n = 100_000usize;
    let xs: Vec<f32> = (0..n).map(|i| (i % 7) as f32).collect();
    let expect: f64 = xs.iter().map(|&x| f64::from(x)).sum();
    let a = Array::from_slice(&ctx, &[n], &xs).unwrap();
    let mut out = scalar_out(&ctx, ScalarKind::Float32);
    sum(&a, &mut out).unwrap();
    // the total (300k) is exactly representable and every pairwise
    // partial stays within the 2^24 integer range
    assert_eq!(f64::from(out.get::<f32>(&[0]).unwrap()), expect);
}

quickcheck! {
    fn qc_sum_close_to_serial(xs: Vec<i32>) -> bool {
        if xs.is_empty() {
            return true;
        }
        let v: Vec<f64> = xs.iter().map(|&x| f64::from(x) / 3.0).collect();
        let ctx = Context::new();
        let a = Array::from_slice(&ctx, &[v.len()], &v).unwrap();
        let mut out = Array::zeros(&ctx, &[1], ScalarKind::Float64).unwrap();
        sum(&a, &mut out).unwrap();
        let got = out.get::<f64>(&[0]).unwrap();
        let serial: f64 = v.iter().sum();
        let magnitude: f64 = v.iter().map(|x| x.abs()).sum();
        let bound = ((v.len() as f64).log2() + 2.0) * f64::EPSILON * magnitude + 1e-12;
        (got - serial).abs() <= bound
    }

    fn qc_integer_valued_f32_sum_is_exact(xs: Vec<i16>) -> bool {
        if xs.is_empty() {
            return true;
        }
        let v: Vec<f32> = xs.iter().map(|&x| f32::from(x)).collect();
        let exact: i64 = xs.iter().map(|&x| i64::from(x)).sum();
        let ctx = Context::new();
        let a = Array::from_slice(&ctx, &[v.len()], &v).unwrap();
        let mut out = Array::zeros(&ctx, &[1], ScalarKind::Float32).unwrap();
        sum(&a, &mut out).unwrap();
        f64::from(out.get::<f32>(&[0]).unwrap()) == exact as f64
    }

    fn qc_max_bounds_every_element(xs: Vec<i32>) -> bool {
        if xs.is_empty() {
            return true;
        }
        let ctx = Context::new();
        let a = Array::from_slice(&ctx, &[xs.len()], &xs).unwrap();
        let mut out = Array::zeros(&ctx, &[1], ScalarKind::Int32).unwrap();
        max(&a, &mut out).unwrap();
        let m = out.get::<i32>(&[0]).unwrap();
        let mut iout = Array::zeros(&ctx, &[1], ScalarKind::Int64).unwrap();
        argmax(&a, &mut iout).unwrap();
        let idx = iout.get::<i64>(&[0]).unwrap() as usize;
        xs.iter().all(|&x| x <= m) && xs[idx] == m && xs[..idx].iter().all(|&x| x < m)
    }

    fn qc_sum_axis_keepdim_matches_full_on_1d(xs: Vec<i64>) -> bool {
        if xs.is_empty() {
            return true;
        }
        let ctx = Context::new();
        let a = Array::from_slice(&ctx, &[xs.len()], &xs).unwrap();
        let mut full = Array::zeros(&ctx, &[1], ScalarKind::Int64).unwrap();
        sum(&a, &mut full).unwrap();
        let mut axis = Array::zeros(&ctx, &[1], ScalarKind::Int64).unwrap();
        sum_axis(&a, Axis(0), true, &mut axis).unwrap();
        full.get::<i64>(&[0]).unwrap() == axis.get::<i64>(&[0]).unwrap()
    }
}
