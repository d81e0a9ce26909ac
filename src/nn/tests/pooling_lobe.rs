/*
 * @Author       : 老董
 * @Date         : 2026-09-25
 * @Description  : 最大池化层测试
 */

use crate::assert_err;
use crate::errors::NeuronError;
use crate::nn::conv::{pool, unpool};
use crate::nn::{Initializer, InitializerType, PoolingLobe, PoolingLobeModel, TensorLobe};
use crate::tensor::{Tensor, TensorSize};

fn sample_4x4() -> Tensor {
    #[rustfmt::skip]
    let data = vec![
        1., 5., 2., 0.,
        3., 4., 8., 8.,
        0., 0., -1., -2.,
        0., 7., -3., -4.,
    ];
    Tensor::from_vec(data, TensorSize::new(4, 4, 1)).unwrap()
}

#[test]
fn test_pooling_shapes() {
    let mut lobe = PoolingLobe::new(PoolingLobeModel::new(TensorSize::new(28, 28, 3)));
    let output = lobe
        .feed(&Tensor::zeros(TensorSize::new(28, 28, 3)), true)
        .unwrap();
    assert_eq!(output.shape(), [14, 14, 3]);

    let gradients = lobe.calculate_gradients(&output).unwrap();
    assert_eq!(gradients.shape(), [28, 28, 3]);
}

#[test]
fn test_odd_input_is_floored() {
    let lobe = PoolingLobe::new(PoolingLobeModel::new(TensorSize::new(5, 7, 2)));
    assert_eq!(lobe.output_size(), TensorSize::new(2, 3, 2));
    let (output, _) = pool(&Tensor::zeros(TensorSize::new(5, 7, 2)));
    assert_eq!(output.size(), TensorSize::new(2, 3, 2));
}

#[test]
fn test_pool_and_unpool_route_to_maxima() {
    let (output, indices) = pool(&sample_4x4());
    assert_eq!(output.to_vec(), vec![5., 8., 7., -1.]);
    assert_eq!(indices.maxima(0), &[(0, 1), (1, 2), (3, 1), (2, 2)]);

    let deltas = Tensor::from_vec(vec![0.1, 0.2, 0.3, 0.4], TensorSize::new(2, 2, 1)).unwrap();
    let gradients = unpool(&deltas, &indices);
    #[rustfmt::skip]
    let expected = vec![
        0., 0.1, 0., 0.,
        0., 0., 0.2, 0.,
        0., 0., 0.4, 0.,
        0., 0.3, 0., 0.,
    ];
    assert_eq!(gradients.to_vec(), expected);
}

#[test]
fn test_ties_pick_first_in_window_order() {
    let (_, indices) = pool(&Tensor::filled(TensorSize::new(2, 2, 1), 3.));
    assert_eq!(indices.maxima(0), &[(0, 0)]);

    // (r+1, c)先于(r, c+1)被比较
    let input = Tensor::from_vec(vec![0., 9., 9., 0.], TensorSize::new(2, 2, 1)).unwrap();
    let (_, indices) = pool(&input);
    assert_eq!(indices.maxima(0), &[(1, 0)]);
}

#[test]
fn test_indices_are_consumed_once() {
    let mut lobe = PoolingLobe::new(PoolingLobeModel::new(TensorSize::new(4, 4, 1)));
    let output = lobe.feed(&sample_4x4(), true).unwrap();
    assert!(lobe.has_pending_indices());

    let first = lobe.calculate_gradients(&output).unwrap();
    assert_eq!(first.sum(), 5. + 8. + 7. - 1.);
    assert!(!lobe.has_pending_indices());

    // 没有新的前向时梯度为0
    let second = lobe.calculate_gradients(&output).unwrap();
    assert_eq!(second.shape(), [4, 4, 1]);
    assert!(second.iter().all(|&g| g == 0.));
}

#[test]
fn test_inference_feed_leaves_no_indices() {
    let mut lobe = PoolingLobe::new(PoolingLobeModel::new(TensorSize::new(4, 4, 1)));
    let output = lobe.feed(&sample_4x4(), false).unwrap();
    assert!(!lobe.has_pending_indices());
    let gradients = lobe.calculate_gradients(&output).unwrap();
    assert_eq!(gradients.sum(), 0.);
}

#[test]
fn test_mismatched_indices_yield_zero() {
    let (_, indices) = pool(&Tensor::zeros(TensorSize::new(4, 4, 1)));
    // delta多出的深度没有对应的最大值坐标
    let deltas = Tensor::filled(TensorSize::new(2, 2, 2), 1.);
    let gradients = unpool(&deltas, &indices);
    assert_eq!(gradients.shape(), [4, 4, 1]);
    assert_eq!(gradients.sum(), 4.);
}

#[test]
fn test_pooling_errors_and_clear() {
    let mut lobe = PoolingLobe::new(PoolingLobeModel::new(TensorSize::new(4, 4, 1)));
    assert_err!(
        lobe.feed(&Tensor::zeros(TensorSize::new(2, 2, 1)), true),
        NeuronError::ShapeMismatch([4, 4, 1], [2, 2, 1], "池化层的输入形状不符")
    );
    assert_err!(
        lobe.calculate_gradients(&Tensor::zeros(TensorSize::new(3, 3, 1))),
        NeuronError::ShapeMismatch { .. }
    );

    lobe.feed(&sample_4x4(), true).unwrap();
    lobe.clear(&mut Initializer::seeded(InitializerType::HeNormal, 1));
    assert!(!lobe.has_pending_indices());
}
