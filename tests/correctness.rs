use approx::assert_relative_eq;
use proptest::prelude::*;
use segtensor::{
    almost_equals, cast_copy_of, copy_of, copy_to, equals, fill, fill_with, Config, DenseFactory,
    Index, Point, Tensor, TensorError, SEGMENT_MAX,
};

fn ramp(shape: &[usize]) -> Tensor<f64> {
    let index = Index::new(shape).unwrap();
    let strides = index.strides().to_vec();
    Tensor::from_fn(shape, move |c| {
        c.iter().zip(&strides).map(|(i, s)| i * s).sum::<usize>() as f64
    })
    .unwrap()
}

fn parallel() -> Config {
    Config::default()
        .with_sequential_threshold(64)
        .with_surplus_queued_tasks(16)
}

#[test]
fn test_segment_boundary_at_default_limit() {
    let index = Index::new(&[SEGMENT_MAX + 1]).unwrap();
    assert_eq!(index.segment_count(), 2);
    assert_eq!(index.segment_len(1), 1);
    assert_eq!(
        index.point_for(&[SEGMENT_MAX]),
        Point {
            segment: 1,
            offset: 0
        }
    );
    assert_eq!(
        index.point_for(&[SEGMENT_MAX - 1]),
        Point {
            segment: 0,
            offset: SEGMENT_MAX - 1
        }
    );
}

#[test]
fn test_capacity_exceeded() {
    let config = Config::default().with_segment_max(10);
    let err = Tensor::<i8>::with_config(&[101], None, &config).unwrap_err();
    assert_eq!(
        err,
        TensorError::CapacityExceeded {
            count: 101,
            capacity: 100
        }
    );
    assert!(Tensor::<i8>::with_config(&[10, 10], None, &config).is_ok());
}

#[test]
fn test_parallel_fill_matches_sequential_across_segments() {
    let shape = [9, 10, 11];
    let f = |c: &[usize]| ((c[0] * 31 + c[1] * 7 + c[2]) as f64).sqrt();
    let sequential = Config::default()
        .with_segment_max(100)
        .with_sequential_threshold(usize::MAX);
    let mut a = Tensor::with_config(&shape, None, &sequential).unwrap();
    fill_with(&mut a, f, &sequential);
    let mut b = Tensor::with_config(&shape, None, &parallel().with_segment_max(100)).unwrap();
    fill_with(&mut b, f, &parallel());
    assert_eq!(a.segments().len(), 10);
    assert!(equals(&a, &b));
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[test]
fn test_copy_shape_check() {
    let src = ramp(&[3, 4]);
    let mut dst = Tensor::<f64>::with_value(&[4, 3], -1.0).unwrap();
    assert!(matches!(
        copy_to(&src, &mut dst),
        Err(TensorError::ShapeMismatch(_, _))
    ));
    assert!(dst.iter().all(|&x| x == -1.0));
    assert!(equals(&src, &ramp(&[3, 4])));
}

#[test]
fn test_copy_of_large_tensor() {
    let src = ramp(&[50, 60]);
    let copy = copy_of(&src).unwrap();
    assert!(equals(&src, &copy));
    assert_relative_eq!(copy.get(&[49, 59]).unwrap(), 2999.0);
}

#[test]
fn test_cast_copy_truncates() {
    let src = Tensor::from_fn(&[4, 4], |c| c[0] as f64 + c[1] as f64 * 0.25).unwrap();
    let ints: Tensor<i16> = cast_copy_of(&src, &DenseFactory::default()).unwrap();
    assert_eq!(ints.get(&[3, 3]).unwrap(), 3);
    assert_eq!(ints.get(&[2, 1]).unwrap(), 2);
}

#[test]
fn test_equality_example() {
    let mut t1 = Tensor::<i32>::new(&[2, 2]).unwrap();
    fill(&mut t1, |c| [[1, 2], [3, 4]][c[0]][c[1]]);
    let t2 = Tensor::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
    assert!(equals(&t1, &t2));
    t1.set(&[0, 1], 0).unwrap();
    assert!(!equals(&t1, &t2));
}

#[test]
fn test_approx_equality_example() {
    let a = ramp(&[4, 5]);
    let mut b = a.clone();
    fill(&mut b, |c| a.get(c).unwrap() + 1e-7);
    assert!(almost_equals(&a, &b));
    assert!(!equals(&a, &b));
}

#[test]
fn test_expand_collapse_inverse_on_segmented_tensor() {
    let config = Config::default().with_segment_max(7);
    let mut t = Tensor::<i64>::with_config(&[6, 5], None, &config).unwrap();
    fill(&mut t, |c| (c[0] * 5 + c[1]) as i64);
    let view = t.expand(3).collapse(&[2, 3, 4]).unwrap();
    assert!(equals(&t, &view));
    let copy = copy_of(&t.expand(2)).unwrap();
    assert_eq!(copy.shape(), &[6, 5, 1, 1]);
    assert_eq!(copy.get(&[5, 4, 0, 0]).unwrap(), 29);
}

#[test]
fn test_unmodifiable_view_write_fails() {
    let t = ramp(&[2, 2]);
    let mut view = t.unmodifiable();
    assert!(matches!(
        view.set(&[0, 0], 1.0),
        Err(TensorError::Unsupported(_))
    ));
}

proptest! {
    #[test]
    fn prop_copy_of_equals_source(dims in prop::collection::vec(1usize..5, 0..4)) {
        let src = ramp(&dims);
        let copy = copy_of(&src).unwrap();
        prop_assert!(equals(&src, &copy));
        prop_assert_eq!(copy.to_vec(), src.to_vec());
    }

    #[test]
    fn prop_coordinate_round_trip(
        dims in prop::collection::vec(1usize..6, 1..5),
        segment_max in 25usize..60,
    ) {
        let config = Config::default().with_segment_max(segment_max);
        let index = Index::with_config(&dims, &config).unwrap();
        for linear in 0..index.len() {
            let coord = index.coordinate_for(linear);
            prop_assert_eq!(index.linear_position(coord.as_slice()), linear);
            let point = index.point_for(coord.as_slice());
            prop_assert_eq!(point.segment * segment_max + point.offset, linear);
        }
    }
}
